//! dh_report: pure report model + renderers (plain text / JSON).
//!
//! Rules:
//! - No I/O and no recomputation: the model is a reshaping of a `SimulationRun`.
//! - Allocations are listed by seats descending, then code ascending; winner
//!   lists and breakdowns by pact code.
//! - Districts where the scenario changes nothing are folded into one line
//!   unless `show_unchanged` is set. Skipped districts are always listed.

#![deny(unsafe_code)]

use std::fmt;

use dh_core::determinism::allocation_display_order;
use dh_core::{Allocation, Candidate, PactCode};
use dh_pipeline::{DistrictRun, PactRow, ScenarioOutcome, SimulationRun};

pub mod render_text;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use render_text::render_text;
#[cfg(feature = "render_json")]
pub use render_json::render_json;

// ===== Errors =====
#[derive(Debug)]
pub enum ReportError {
    Serialize(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialize(m) => write!(f, "report serialization failed: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReportOptions {
    pub show_unchanged: bool,
}

// ===== Model =====
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct ReportModel {
    pub pact_codes: Vec<String>,
    pub districts: Vec<DistrictSection>,
    /// Labels of simulated districts left out because nothing changed.
    pub unchanged_hidden: Vec<String>,
    pub summary: SummarySection,
    pub inputs: Vec<InputLine>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct InputLine {
    pub path: String,
    pub sha256: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SeatLine {
    pub code: String,
    pub name: String,
    pub seats: u32,
    pub votes: u64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateLine {
    pub number: u32,
    pub name: String,
    pub votes: u64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct WinnerLine {
    pub code: String,
    pub candidates: Vec<CandidateLine>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct PactLine {
    pub code: String,
    pub name: String,
    pub votes: u64,
    pub candidates: usize,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct ScenarioSection {
    pub merged_code: String,
    pub allocation: Vec<SeatLine>,
    pub winners: Vec<WinnerLine>,
    pub breakdown: Vec<WinnerLine>,
    pub baseline_seats: u32,
    pub scenario_seats: u32,
    pub delta: i64,
    pub indifference_loss: Option<f64>,
    pub changed: bool,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct DistrictSection {
    pub id: String,
    pub label: String,
    pub seats: u32,
    pub pacts: Vec<PactLine>,
    pub official: Vec<SeatLine>,
    pub official_winners: Vec<WinnerLine>,
    pub reported_mismatch: Vec<String>,
    pub scenario: Option<ScenarioSection>,
    pub skipped: Option<String>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CodeSeats {
    pub code: String,
    pub seats: u32,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DeltaLine {
    pub code: String,
    pub official: u32,
    pub scenario: u32,
    pub delta: i64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct SummarySection {
    pub districts_simulated: usize,
    pub districts_skipped: usize,
    pub districts_changed: usize,
    pub official: Vec<CodeSeats>,
    pub scenario: Vec<CodeSeats>,
    pub deltas: Vec<DeltaLine>,
    pub baseline_merged_seats: u32,
    pub scenario_merged_seats: u32,
    pub indifference_loss: Option<f64>,
}

// ===== API =====

/// Build the report model from a finished simulation (pure).
pub fn build_model(run: &SimulationRun, opts: ReportOptions) -> ReportModel {
    let mut districts = Vec::new();
    let mut unchanged_hidden = Vec::new();
    for d in &run.districts {
        let unchanged = d.scenario.simulated().is_some_and(|s| !s.changed);
        if unchanged && !opts.show_unchanged {
            unchanged_hidden.push(d.label.clone());
            continue;
        }
        districts.push(district_section(d));
    }

    let s = &run.summary;
    let summary = SummarySection {
        districts_simulated: s.districts_simulated,
        districts_skipped: s.districts_skipped,
        districts_changed: s.districts_changed,
        official: code_seats(&s.official),
        scenario: code_seats(&s.scenario),
        deltas: s
            .deltas
            .iter()
            .map(|d| DeltaLine {
                code: d.code.to_string(),
                official: d.official,
                scenario: d.scenario,
                delta: d.delta,
            })
            .collect(),
        baseline_merged_seats: s.baseline_merged_seats,
        scenario_merged_seats: s.scenario_merged_seats,
        indifference_loss: s.indifference_loss,
    };

    ReportModel {
        pact_codes: run.pact_codes.clone(),
        districts,
        unchanged_hidden,
        summary,
        inputs: run
            .inputs
            .iter()
            .map(|i| InputLine { path: i.path.display().to_string(), sha256: i.sha256.clone() })
            .collect(),
    }
}

fn district_section(d: &DistrictRun) -> DistrictSection {
    let (scenario, skipped) = match &d.scenario {
        ScenarioOutcome::Simulated(s) => (
            Some(ScenarioSection {
                merged_code: s.merged_code.to_string(),
                allocation: seat_lines(&s.allocation, &s.pacts),
                winners: winner_lines(s.winners.iter()),
                breakdown: winner_lines(s.breakdown.iter()),
                baseline_seats: s.baseline_seats,
                scenario_seats: s.scenario_seats,
                delta: s.seat_delta(),
                indifference_loss: s.indifference_loss,
                changed: s.changed,
            }),
            None,
        ),
        ScenarioOutcome::Skipped { reason } => (None, Some(reason.clone())),
    };

    DistrictSection {
        id: d.id.to_string(),
        label: d.label.clone(),
        seats: d.seats,
        pacts: d
            .pacts
            .iter()
            .map(|p| PactLine {
                code: p.code.to_string(),
                name: p.name.clone(),
                votes: p.votes,
                candidates: p.candidates,
            })
            .collect(),
        official: seat_lines(&d.official, &d.pacts),
        official_winners: winner_lines(d.official_winners.iter()),
        reported_mismatch: d.reported_mismatch.iter().map(|c| c.to_string()).collect(),
        scenario,
        skipped,
    }
}

/// Allocation in display order, joined with pact names and votes.
pub fn seat_lines(allocation: &Allocation, pacts: &[PactRow]) -> Vec<SeatLine> {
    allocation_display_order(allocation)
        .into_iter()
        .map(|(code, seats)| {
            let pact = pacts.iter().find(|p| &p.code == code);
            SeatLine {
                code: code.to_string(),
                name: pact.map(|p| p.name.clone()).unwrap_or_else(|| "unknown pact".into()),
                seats,
                votes: pact.map_or(0, |p| p.votes),
            }
        })
        .collect()
}

fn winner_lines<'a>(
    groups: impl Iterator<Item = (&'a PactCode, &'a Vec<Candidate>)>,
) -> Vec<WinnerLine> {
    groups
        .map(|(code, cands)| WinnerLine {
            code: code.to_string(),
            candidates: cands
                .iter()
                .map(|c| CandidateLine { number: c.number, name: c.name.clone(), votes: c.votes })
                .collect(),
        })
        .collect()
}

fn code_seats(allocation: &Allocation) -> Vec<CodeSeats> {
    allocation_display_order(allocation)
        .into_iter()
        .map(|(code, seats)| CodeSeats { code: code.to_string(), seats })
        .collect()
}

// ===== Formatting helpers =====

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fraction as a two-decimal percentage: `0.19047` → `"19.05%"`.
pub fn percent_2dp(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Signed delta: `+2`, `0`, `-1`.
pub fn signed(delta: i64) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use dh_core::{Candidate, District, Pact, PactCode};
    use dh_pipeline::{run_with_districts, SimulationConfig, SimulationRun};

    fn code(s: &str) -> PactCode { s.parse().unwrap() }

    fn pact(c: &str, name: &str, votes: u64, cands: &[(u32, &str, u64)]) -> Pact {
        Pact::new(code(c), name, votes).with_candidates(
            cands.iter().map(|(n, nm, v)| Candidate::new(*n, *nm, *v, code(c))).collect(),
        )
    }

    /// District 1 gains a seat for A + B; district 2 is unchanged; district 3 lacks A and B.
    pub fn run() -> SimulationRun {
        let ds = vec![
            District::new(
                "1".parse().unwrap(),
                "Circunscripción Senatorial 1",
                3,
                vec![
                    pact("A", "Alianza", 1000, &[(1, "Ana", 1000)]),
                    pact("B", "Bloque", 800, &[(2, "Beto", 800)]),
                    pact("C", "Centro", 1000, &[(3, "Carla", 1000)]),
                    pact("D", "Derecha", 850, &[(4, "Dario", 850)]),
                ],
            )
            .unwrap(),
            District::new(
                "2".parse().unwrap(),
                "Circunscripción Senatorial 2",
                2,
                vec![
                    pact("A", "Alianza", 5000, &[(1, "Eva", 5000)]),
                    pact("B", "Bloque", 100, &[(2, "Fito", 100)]),
                    pact("C", "Centro", 4000, &[(3, "Gina", 4000)]),
                ],
            )
            .unwrap(),
            District::new(
                "3".parse().unwrap(),
                "Circunscripción Senatorial 3",
                2,
                vec![pact("C", "Centro", 10, &[]), pact("D", "Derecha", 20, &[])],
            )
            .unwrap(),
        ];
        run_with_districts(&ds, &SimulationConfig::new(["A", "B"])).unwrap()
    }
}
