// crates/dh_cli/src/main.rs
//
// Wires up: exit codes, logging, CLI parsing, the simulation run and the report on
// stdout. Logs go to stderr.

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    /// Bad flags or a configuration the pipeline rejects.
    pub const USAGE: u8 = 2;
    /// Input source missing, unreadable or malformed; report output failures.
    pub const IO: u8 = 4;
    /// Solver preconditions broken (internal fault).
    pub const INVARIANT: u8 = 5;
}

use std::io::Write;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args, Format};
use dh_pipeline::{run, PipelineError, SimulationConfig};
use dh_report::{build_model, ReportOptions};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    Usage(String),
    Io(String),
    Invariant(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Usage(m) | MainError::Io(m) | MainError::Invariant(m) => f.write_str(m),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("dh: error: {e}");
            return ExitCode::from(exitcodes::USAGE);
        }
    };
    init_logging(&args);

    match run_once(&args) {
        Ok(()) => ExitCode::from(exitcodes::OK),
        Err(e) => {
            eprintln!("dh: error: {e}");
            ExitCode::from(map_error(&e))
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, raised by `--verbose`, lowered by `--quiet`.
fn init_logging(args: &Args) {
    let default = if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn map_error(e: &MainError) -> u8 {
    match e {
        MainError::Usage(_) => exitcodes::USAGE,
        MainError::Io(_) => exitcodes::IO,
        MainError::Invariant(_) => exitcodes::INVARIANT,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Load(_) => MainError::Io(e.to_string()),
        PipelineError::Config(_) | PipelineError::NoDistrictSelected(_) => {
            MainError::Usage(e.to_string())
        }
        PipelineError::Solver { .. } => MainError::Invariant(e.to_string()),
    }
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let mut config = SimulationConfig::new(args.pact_codes());
    config.districts = args.districts.clone();
    config.indifference = !args.no_indifference;

    info!(inputs = %args.inputs.display(), pacts = ?config.pact_codes, "starting simulation");
    let outcome = run(&args.inputs, &config).map_err(map_pipeline_err)?;

    let model = build_model(&outcome, ReportOptions { show_unchanged: args.show_unchanged });
    let rendered = match args.format {
        Format::Text => dh_report::render_text(&model),
        Format::Json => render_json(&model)?,
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end())
        .and_then(|()| stdout.flush())
        .map_err(|e| MainError::Io(format!("write report: {e}")))
}

fn render_json(model: &dh_report::ReportModel) -> Result<String, MainError> {
    #[cfg(feature = "report-json")]
    {
        dh_report::render_json(model).map_err(|e| MainError::Io(e.to_string()))
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = model;
        Err(MainError::Usage(
            "json renderer not enabled (build with feature `report-json`)".into(),
        ))
    }
}
