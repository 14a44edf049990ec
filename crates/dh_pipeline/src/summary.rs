//! Consolidated national view: official vs scenario seats per code, and the
//! uniform-swing indifference loss solved jointly over every simulated district.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use dh_algo::{national_indifference_loss, NationalScenario};
use dh_core::{Allocation, PactCode};

use crate::simulate::DistrictRun;
use crate::{PipelineError, SimulationConfig};

/// Seat movement of one code across all simulated districts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatDelta {
    pub code: PactCode,
    pub official: u32,
    pub scenario: u32,
    pub delta: i64,
}

/// Fold of every simulated district.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NationalSummary {
    pub districts_simulated: usize,
    pub districts_skipped: usize,
    pub districts_changed: usize,
    pub official: Allocation,
    pub scenario: Allocation,
    /// Every code seen in either allocation, ascending.
    pub deltas: Vec<SeatDelta>,
    pub baseline_merged_seats: u32,
    pub scenario_merged_seats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indifference_loss: Option<f64>,
}

fn add_into(total: &mut Allocation, part: &Allocation) {
    for (code, seats) in part {
        *total.entry(code.clone()).or_insert(0) += seats;
    }
}

impl NationalSummary {
    /// Only districts whose scenario was simulated count towards the seat totals.
    pub fn fold(
        runs: &[DistrictRun],
        national: &[NationalScenario],
        config: &SimulationConfig,
    ) -> Result<Self, PipelineError> {
        let mut out = runs.iter().fold(NationalSummary::default(), |mut acc, run| {
            match run.scenario.simulated() {
                Some(s) => {
                    acc.districts_simulated += 1;
                    acc.districts_changed += usize::from(s.changed);
                    add_into(&mut acc.official, &run.official);
                    add_into(&mut acc.scenario, &s.allocation);
                    acc.baseline_merged_seats += s.baseline_seats;
                    acc.scenario_merged_seats += s.scenario_seats;
                }
                None => acc.districts_skipped += 1,
            }
            acc
        });

        let codes: BTreeSet<&PactCode> = out.official.keys().chain(out.scenario.keys()).collect();
        out.deltas = codes
            .into_iter()
            .map(|code| {
                let official = out.official.get(code).copied().unwrap_or(0);
                let scenario = out.scenario.get(code).copied().unwrap_or(0);
                SeatDelta {
                    code: code.clone(),
                    official,
                    scenario,
                    delta: i64::from(scenario) - i64::from(official),
                }
            })
            .collect();

        if config.indifference && out.districts_simulated > 0 {
            let loss = national_indifference_loss(
                national,
                out.baseline_merged_seats,
                out.scenario_merged_seats,
                &config.solver,
            )
            .map_err(|source| PipelineError::Solver { district: "national".into(), source })?;
            debug!(loss, "national indifference loss");
            out.indifference_loss = Some(loss);
        }
        Ok(out)
    }

    pub fn merged_delta(&self) -> i64 {
        i64::from(self.scenario_merged_seats) - i64::from(self.baseline_merged_seats)
    }
}
