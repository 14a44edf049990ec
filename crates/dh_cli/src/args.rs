// crates/dh_cli/src/args.rs
//
// CLI surface: input locator, optional district subset, the two pacts to merge,
// output format and logging switches. Offline only; locators with a URI scheme
// are rejected.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "dh",
    version,
    disable_help_subcommand = true,
    about = "Simulate merging two electoral pacts under D'Hondt, district by district"
)]
pub struct Args {
    /// Directory of result workbooks/JSON files, or a single `.json`/`.xlsx` file.
    #[arg(long, default_value = "Inputs/Senadores")]
    pub inputs: PathBuf,

    /// District ids to process (`--circ 1 2 3`, repeatable). Omit to process every loaded district.
    #[arg(long = "district", visible_alias = "circ", value_name = "ID", num_args = 1..)]
    pub districts: Vec<String>,

    /// First pact code to merge (case-insensitive).
    #[arg(long, value_name = "CODE")]
    pub pact_a: String,

    /// Second pact code to merge (case-insensitive).
    #[arg(long, value_name = "CODE")]
    pub pact_b: String,

    /// Also print districts where the merge changes nothing.
    #[arg(long)]
    pub show_unchanged: bool,

    /// Report format on stdout.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Skip the indifference-loss solver.
    #[arg(long)]
    pub no_indifference: bool,

    /// Log progress at info level (RUST_LOG takes precedence).
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Errors surfaced by argument validation.
#[derive(Debug)]
pub enum CliError {
    EmptyCode(&'static str),
    SameCode(String),
    NonLocalPath(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            EmptyCode(flag) => write!(f, "{flag} must not be empty"),
            SameCode(c) => write!(f, "--pact-a and --pact-b are both {c}"),
            NonLocalPath(p) => write!(f, "path must be local (no scheme): {p}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Reject any explicit URI scheme (e.g., http://, file://).
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if has_scheme(s) => Err(CliError::NonLocalPath(s.to_string())),
        _ => Ok(()),
    }
}

impl Args {
    /// Semantic checks clap cannot express.
    pub fn validate(&self) -> Result<(), CliError> {
        ensure_local_path(&self.inputs)?;
        let a = self.pact_a.trim();
        let b = self.pact_b.trim();
        if a.is_empty() {
            return Err(CliError::EmptyCode("--pact-a"));
        }
        if b.is_empty() {
            return Err(CliError::EmptyCode("--pact-b"));
        }
        if a.eq_ignore_ascii_case(b) {
            return Err(CliError::SameCode(a.to_uppercase()));
        }
        Ok(())
    }

    pub fn pact_codes(&self) -> [String; 2] {
        [self.pact_a.trim().to_string(), self.pact_b.trim().to_string()]
    }
}

/// Entry point used by main.rs. Clap usage errors exit through clap itself (code 2).
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    args.validate()?;
    Ok(args)
}
