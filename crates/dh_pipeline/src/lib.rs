//! dh_pipeline: merge-simulation surface (load → baseline → merge → scenario → winners →
//! indifference → national summary).
//!
//! File access is delegated to `dh_io`, allocation math to `dh_algo`. Every district is
//! processed independently; a district whose ballot lacks the requested pacts is
//! skipped with a reason and the batch continues. Running totals across districts
//! are folded into a `NationalSummary` value rather than kept in mutable globals.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use dh_algo::{SolverError, SolverParams};
use dh_core::District;
use dh_io::{InputDigest, LoadError};

pub mod simulate;
pub mod summary;

pub use simulate::{simulate_district, DistrictRun, PactRow, ScenarioOutcome, ScenarioRun};
pub use summary::{NationalSummary, SeatDelta};

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    /// The input source could not be loaded.
    Load(LoadError),
    /// Configuration rejected before any district was processed.
    Config(String),
    /// The district filter matched nothing that was loaded.
    NoDistrictSelected(Vec<String>),
    /// Solver preconditions broke; this is an internal fault, not a data problem.
    Solver { district: String, source: SolverError },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Load(e) => write!(f, "load: {e}"),
            PipelineError::Config(m) => write!(f, "config: {m}"),
            PipelineError::NoDistrictSelected(ids) => {
                write!(f, "no loaded district matches the filter [{}]", ids.join(", "))
            }
            PipelineError::Solver { district, source } => {
                write!(f, "indifference solver failed in district {district}: {source}")
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Load(e) => Some(e),
            PipelineError::Solver { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LoadError> for PipelineError {
    fn from(e: LoadError) -> Self {
        PipelineError::Load(e)
    }
}

/// What to simulate.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Pact codes to merge (case-insensitive); at least one.
    pub pact_codes: Vec<String>,
    /// District ids to process; empty means all.
    pub districts: Vec<String>,
    /// Compute per-district and national indifference losses.
    pub indifference: bool,
    pub solver: SolverParams,
}

impl SimulationConfig {
    pub fn new<S: Into<String>>(pact_codes: impl IntoIterator<Item = S>) -> Self {
        Self {
            pact_codes: pact_codes.into_iter().map(Into::into).collect(),
            districts: Vec::new(),
            indifference: true,
            solver: SolverParams::default(),
        }
    }

    /// Requested codes, trimmed and upper-cased, sorted, without duplicates.
    pub fn normalized_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .pact_codes
            .iter()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.normalized_codes().is_empty() {
            return Err(PipelineError::Config("at least one pact code is required".into()));
        }
        if self.solver.max_iterations == 0 || !(self.solver.tolerance > 0.0) {
            return Err(PipelineError::Config(format!(
                "solver needs max_iterations >= 1 and tolerance > 0 (got {} / {})",
                self.solver.max_iterations, self.solver.tolerance
            )));
        }
        Ok(())
    }
}

/// Top-level output: one entry per selected district plus the national fold.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationRun {
    pub pact_codes: Vec<String>,
    pub districts: Vec<DistrictRun>,
    pub summary: NationalSummary,
    pub inputs: Vec<InputDigest>,
}

/// Load `inputs` and simulate.
pub fn run(inputs: &Path, config: &SimulationConfig) -> Result<SimulationRun, PipelineError> {
    config.validate()?;
    let loaded = dh_io::load_districts(inputs)?;
    let mut out = run_with_districts(&loaded.districts, config)?;
    out.inputs = loaded.digests;
    Ok(out)
}

/// Simulate already-loaded districts.
pub fn run_with_districts(
    districts: &[District],
    config: &SimulationConfig,
) -> Result<SimulationRun, PipelineError> {
    config.validate()?;
    let selected = select_districts(districts, &config.districts)?;

    let mut runs = Vec::with_capacity(selected.len());
    let mut national = Vec::new();
    for district in selected {
        let (run, scenario) = simulate_district(district, config)?;
        national.extend(scenario);
        runs.push(run);
    }

    let summary = NationalSummary::fold(&runs, &national, config)?;
    info!(
        districts = runs.len(),
        simulated = summary.districts_simulated,
        changed = summary.districts_changed,
        "simulation finished"
    );

    Ok(SimulationRun {
        pact_codes: config.normalized_codes(),
        districts: runs,
        summary,
        inputs: Vec::new(),
    })
}

fn select_districts<'d>(
    districts: &'d [District],
    filter: &[String],
) -> Result<Vec<&'d District>, PipelineError> {
    if filter.is_empty() {
        return Ok(districts.iter().collect());
    }
    let wanted: Vec<&str> = filter.iter().map(|s| s.trim()).collect();
    for id in &wanted {
        if !districts.iter().any(|d| d.id.as_str() == *id) {
            warn!(district = %id, "requested district not found in inputs");
        }
    }
    let selected: Vec<&District> = districts
        .iter()
        .filter(|d| wanted.contains(&d.id.as_str()))
        .collect();
    if selected.is_empty() {
        return Err(PipelineError::NoDistrictSelected(filter.to_vec()));
    }
    Ok(selected)
}
