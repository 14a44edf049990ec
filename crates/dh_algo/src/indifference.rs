//! Indifference-loss solver.
//!
//! Question answered: what fraction `f` of the merged pact's votes could be
//! lost (handed to its rivals) before its scenario seats fall back to the
//! baseline seats of its constituents?
//!
//! Vote-loss model:
//! - merged pact keeps `v·(1−f)`;
//! - the lost `v·f` goes to every other pact in proportion to its share of
//!   the others' combined votes;
//! - when the others hold no votes at all, the lost votes vanish.
//!
//! Search: bisection over `[0, 1]`, at most `max_iterations` steps or until
//! the bracket is `≤ tolerance`. `low` always still beats baseline and `high`
//! never does; `high` is reported. The national variant sums the merged seats
//! of every district at the same trial `f` (uniform swing).

use alloc::vec::Vec;
use core::fmt;

use dh_core::{Pact, PactCode};

use crate::allocation::allocate_dhondt;

/// Bisection bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverParams {
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self { max_iterations: 60, tolerance: 1e-4 }
    }
}

/// Precondition violations; a correct pipeline never produces them.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    /// Loss fraction outside `[0, 1]` (or NaN).
    LossOutOfRange(f64),
    /// The merged pact is not in the scenario it is supposed to belong to.
    MergedPactMissing(PactCode),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::LossOutOfRange(x) => write!(f, "loss fraction {x} is outside [0, 1]"),
            SolverError::MergedPactMissing(c) => {
                write!(f, "merged pact {c} is missing from its scenario")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SolverError {}

/// A pact with a fractional vote total after redistribution.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedPact {
    pub code: PactCode,
    pub votes: f64,
}

/// One district's merge scenario, kept for the joint national solve.
#[derive(Clone, Debug, PartialEq)]
pub struct NationalScenario {
    pub pacts: Vec<Pact>,
    pub merged_code: PactCode,
    pub seats: u32,
}

/// Apply the vote-loss model at fraction `loss`.
pub fn pacts_with_vote_loss(
    pacts: &[Pact],
    merged: &PactCode,
    loss: f64,
) -> Result<Vec<WeightedPact>, SolverError> {
    if !(0.0..=1.0).contains(&loss) {
        return Err(SolverError::LossOutOfRange(loss));
    }
    let merged_votes = pacts
        .iter()
        .find(|p| &p.code == merged)
        .map(|p| p.votes as f64)
        .ok_or_else(|| SolverError::MergedPactMissing(merged.clone()))?;

    let lost = merged_votes * loss;
    let others: f64 = pacts
        .iter()
        .filter(|p| &p.code != merged)
        .map(|p| p.votes as f64)
        .sum();

    Ok(pacts
        .iter()
        .map(|p| {
            let v = p.votes as f64;
            let votes = if &p.code == merged {
                merged_votes - lost
            } else if others > 0.0 {
                v + lost * (v / others)
            } else {
                v
            };
            WeightedPact { code: p.code.clone(), votes }
        })
        .collect())
}

/// Merged-pact seats after losing `loss` of its votes.
pub fn merged_seats_at_loss(
    pacts: &[Pact],
    merged: &PactCode,
    seats: u32,
    loss: f64,
) -> Result<u32, SolverError> {
    let weighted = pacts_with_vote_loss(pacts, merged, loss)?;
    let won = allocate_dhondt(weighted.into_iter().map(|w| (w.code, w.votes)), seats);
    Ok(won.get(merged).copied().unwrap_or(0))
}

/// Per-district indifference loss. `0.0` when the scenario gains nothing.
pub fn indifference_loss(
    pacts: &[Pact],
    merged: &PactCode,
    seats: u32,
    baseline_seats: u32,
    scenario_seats: u32,
    params: &SolverParams,
) -> Result<f64, SolverError> {
    if scenario_seats <= baseline_seats {
        return Ok(0.0);
    }
    bisect(params, |f| Ok(merged_seats_at_loss(pacts, merged, seats, f)? > baseline_seats))
}

/// Uniform-swing loss over several districts solved jointly.
pub fn national_indifference_loss(
    scenarios: &[NationalScenario],
    baseline_total: u32,
    scenario_total: u32,
    params: &SolverParams,
) -> Result<f64, SolverError> {
    if scenario_total <= baseline_total {
        return Ok(0.0);
    }
    bisect(params, |f| {
        let mut total = 0u32;
        for s in scenarios {
            total += merged_seats_at_loss(&s.pacts, &s.merged_code, s.seats, f)?;
        }
        Ok(total > baseline_total)
    })
}

/// `still_ahead(f)` must be monotone: true near 0, false at 1.
fn bisect<F>(params: &SolverParams, mut still_ahead: F) -> Result<f64, SolverError>
where
    F: FnMut(f64) -> Result<bool, SolverError>,
{
    let (mut low, mut high) = (0.0f64, 1.0f64);
    for _ in 0..params.max_iterations {
        if high - low <= params.tolerance {
            break;
        }
        let mid = (low + high) / 2.0;
        if still_ahead(mid)? {
            low = mid;
        } else {
            high = mid;
        }
    }
    Ok(high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code(s: &str) -> PactCode { s.parse().unwrap() }

    fn pacts(rows: &[(&str, u64)]) -> Vec<Pact> {
        rows.iter().map(|(c, v)| Pact::new(code(c), *c, *v)).collect()
    }

    fn worked() -> Vec<Pact> {
        pacts(&[("A + B", 1800), ("C", 1000), ("D", 600)])
    }

    #[test]
    fn worked_example_threshold_is_tight() {
        let ps = worked();
        let m = code("A + B");
        let p = SolverParams::default();
        let loss = indifference_loss(&ps, &m, 3, 1, 2, &p).unwrap();
        assert!(loss > 0.0 && loss < 1.0);
        // Third seat flips when D's 600+675f overtakes M's 900(1−f): f = 300/1575.
        assert!((loss - 300.0 / 1575.0).abs() <= 2e-4, "loss = {loss}");

        assert!(merged_seats_at_loss(&ps, &m, 3, loss).unwrap() <= 1);
        let slightly_less = (loss - 1e-4).max(0.0);
        assert!(merged_seats_at_loss(&ps, &m, 3, slightly_less).unwrap() >= 1);
    }

    #[test]
    fn no_gain_means_zero_loss() {
        let ps = pacts(&[("A + B", 1000), ("C", 1200)]);
        let loss = indifference_loss(&ps, &code("A + B"), 2, 1, 1, &SolverParams::default());
        assert_eq!(loss, Ok(0.0));
    }

    #[test]
    fn lost_votes_follow_rival_shares() {
        let w = pacts_with_vote_loss(&worked(), &code("A + B"), 0.5).unwrap();
        assert_eq!(w[0].votes, 900.0);
        assert_eq!(w[1].votes, 1000.0 + 900.0 * 1000.0 / 1600.0);
        assert_eq!(w[2].votes, 600.0 + 900.0 * 600.0 / 1600.0);
    }

    #[test]
    fn votes_vanish_when_rivals_have_none() {
        let ps = pacts(&[("M", 1000), ("Z", 0)]);
        let w = pacts_with_vote_loss(&ps, &code("M"), 0.25).unwrap();
        assert_eq!(w[0].votes, 750.0);
        assert_eq!(w[1].votes, 0.0);
    }

    #[test]
    fn out_of_range_and_missing_pact_are_errors() {
        let ps = worked();
        let m = code("A + B");
        assert_eq!(pacts_with_vote_loss(&ps, &m, 1.5), Err(SolverError::LossOutOfRange(1.5)));
        assert!(matches!(
            pacts_with_vote_loss(&ps, &m, f64::NAN),
            Err(SolverError::LossOutOfRange(_))
        ));
        assert_eq!(
            pacts_with_vote_loss(&ps, &code("Q"), 0.1),
            Err(SolverError::MergedPactMissing(code("Q")))
        );
        assert!(indifference_loss(&ps, &code("Q"), 3, 1, 2, &SolverParams::default()).is_err());
    }

    #[test]
    fn national_sums_across_districts() {
        let one = NationalScenario { pacts: worked(), merged_code: code("A + B"), seats: 3 };
        let p = SolverParams::default();
        // Two identical districts swing together: same threshold as one alone.
        let both = national_indifference_loss(&[one.clone(), one.clone()], 2, 4, &p).unwrap();
        let single = indifference_loss(&one.pacts, &one.merged_code, 3, 1, 2, &p).unwrap();
        assert!((both - single).abs() <= 2e-4);
        assert_eq!(national_indifference_loss(&[one], 2, 2, &p), Ok(0.0));
    }

    #[test]
    fn fewer_iterations_give_a_looser_bracket() {
        let p = SolverParams { max_iterations: 3, tolerance: 1e-9 };
        let loss = indifference_loss(&worked(), &code("A + B"), 3, 1, 2, &p).unwrap();
        // Three halvings: 1 → 0.5 → 0.25 → 0.25 (0.125 still ahead).
        assert_eq!(loss, 0.25);
    }

    proptest! {
        #[test]
        fn redistribution_conserves_votes(
            merged in 0u64..100_000,
            rivals in prop::collection::vec(1u64..100_000, 1..6),
            loss in 0.0f64..=1.0,
        ) {
            let mut ps = vec![Pact::new(code("M"), "M", merged)];
            for (i, v) in rivals.iter().enumerate() {
                ps.push(Pact::new(code(&alloc::format!("R{i}")), "R", *v));
            }
            let before: f64 = ps.iter().map(|p| p.votes as f64).sum();
            let after: f64 = pacts_with_vote_loss(&ps, &code("M"), loss)
                .unwrap()
                .iter()
                .map(|w| w.votes)
                .sum();
            prop_assert!((before - after).abs() <= 1e-6 * before.max(1.0));
        }
    }
}
