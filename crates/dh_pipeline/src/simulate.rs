//! Per-district stage: baseline allocation, merge scenario, winners, breakdown and
//! indifference loss.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use dh_algo::{
    allocate_pacts, indifference_loss, merge_district, winners_by_pact, NationalScenario,
    ScenarioError, Winners,
};
use dh_core::{Allocation, Candidate, District, DistrictId, Pact, PactCode};

use crate::{PipelineError, SimulationConfig};

/// Pact line for the report table.
#[derive(Clone, Debug, Serialize)]
pub struct PactRow {
    pub code: PactCode,
    pub name: String,
    pub votes: u64,
    pub candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats_won: Option<u32>,
}

impl From<&Pact> for PactRow {
    fn from(p: &Pact) -> Self {
        Self {
            code: p.code.clone(),
            name: p.name.clone(),
            votes: p.votes,
            candidates: p.candidates.len(),
            seats_won: p.seats_won,
        }
    }
}

/// The merge scenario as simulated in one district.
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioRun {
    pub merged_code: PactCode,
    pub merged_codes: Vec<PactCode>,
    pub pacts: Vec<PactRow>,
    pub allocation: Allocation,
    pub winners: Winners,
    /// Elected candidates of the merged pact, grouped by the pact that listed them.
    pub breakdown: BTreeMap<PactCode, Vec<Candidate>>,
    /// Seats the constituents held together in the official allocation.
    pub baseline_seats: u32,
    pub scenario_seats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indifference_loss: Option<f64>,
    /// Merged gain is non-zero or some other pact's seats moved.
    pub changed: bool,
}

impl ScenarioRun {
    pub fn seat_delta(&self) -> i64 {
        i64::from(self.scenario_seats) - i64::from(self.baseline_seats)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Simulated(ScenarioRun),
    Skipped { reason: String },
}

impl ScenarioOutcome {
    pub fn simulated(&self) -> Option<&ScenarioRun> {
        match self {
            ScenarioOutcome::Simulated(s) => Some(s),
            ScenarioOutcome::Skipped { .. } => None,
        }
    }
}

/// Everything computed for one district.
#[derive(Clone, Debug, Serialize)]
pub struct DistrictRun {
    pub id: DistrictId,
    pub label: String,
    pub seats: u32,
    pub pacts: Vec<PactRow>,
    pub official: Allocation,
    pub official_winners: Winners,
    /// Pacts whose reported seats differ from the recomputed allocation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reported_mismatch: Vec<PactCode>,
    pub scenario: ScenarioOutcome,
}

fn reported_mismatch(district: &District, official: &Allocation) -> Vec<PactCode> {
    district
        .pacts
        .iter()
        .filter_map(|p| {
            let reported = p.seats_won?;
            let computed = official.get(&p.code).copied().unwrap_or(0);
            (reported != computed).then(|| p.code.clone())
        })
        .collect()
}

fn others_moved(
    official: &Allocation,
    scenario: &Allocation,
    merged: &[PactCode],
    merged_code: &PactCode,
) -> bool {
    official
        .keys()
        .chain(scenario.keys())
        .filter(|c| *c != merged_code && !merged.contains(c))
        .any(|c| official.get(c) != scenario.get(c))
}

/// Simulate one district. Returns the national-solve snapshot when the scenario applies.
pub fn simulate_district(
    district: &District,
    config: &SimulationConfig,
) -> Result<(DistrictRun, Option<NationalScenario>), PipelineError> {
    let official = allocate_pacts(&district.pacts, district.seats);
    let official_winners = winners_by_pact(&district.pacts, &official);

    let mismatch = reported_mismatch(district, &official);
    if !mismatch.is_empty() {
        let codes: Vec<&str> = mismatch.iter().map(PactCode::as_str).collect();
        warn!(
            district = %district.id,
            pacts = ?codes,
            "reported seats differ from the recomputed D'Hondt allocation"
        );
    }

    let mut run = DistrictRun {
        id: district.id.clone(),
        label: district.label.clone(),
        seats: district.seats,
        pacts: district.pacts.iter().map(PactRow::from).collect(),
        official,
        official_winners,
        reported_mismatch: mismatch,
        scenario: ScenarioOutcome::Skipped { reason: String::new() },
    };

    let scenario = match merge_district(district, &config.pact_codes) {
        Ok(s) => s,
        Err(e @ ScenarioError::NoMatch { .. }) => {
            warn!(district = %district.id, "scenario skipped: {e}");
            run.scenario = ScenarioOutcome::Skipped { reason: e.to_string() };
            return Ok((run, None));
        }
        Err(e) => {
            return Err(PipelineError::Config(format!("district {}: {e}", district.id)));
        }
    };

    let allocation = scenario.allocate();
    let winners = winners_by_pact(&scenario.pacts, &allocation);
    let breakdown = winners
        .get(&scenario.merged_code)
        .map(|w| scenario.breakdown(w))
        .unwrap_or_default();

    let baseline_seats = scenario.baseline_seats(&run.official);
    let scenario_seats = allocation.get(&scenario.merged_code).copied().unwrap_or(0);

    let indifference = if config.indifference {
        let loss = indifference_loss(
            &scenario.pacts,
            &scenario.merged_code,
            scenario.seats,
            baseline_seats,
            scenario_seats,
            &config.solver,
        )
        .map_err(|source| PipelineError::Solver { district: district.id.to_string(), source })?;
        debug!(district = %district.id, loss, "indifference loss");
        Some(loss)
    } else {
        None
    };

    let changed = scenario_seats != baseline_seats
        || others_moved(&run.official, &allocation, &scenario.merged_codes, &scenario.merged_code);

    let national = scenario.to_national();
    run.scenario = ScenarioOutcome::Simulated(ScenarioRun {
        merged_code: scenario.merged_code,
        merged_codes: scenario.merged_codes,
        pacts: scenario.pacts.iter().map(PactRow::from).collect(),
        allocation,
        winners,
        breakdown,
        baseline_seats,
        scenario_seats,
        indifference_loss: indifference,
        changed,
    });
    Ok((run, Some(national)))
}
