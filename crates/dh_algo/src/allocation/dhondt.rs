//! D’Hondt (highest averages) allocation.
//!
//! Contract:
//! - Every contestant with positive votes contributes `seats` quotients
//!   `v/1, v/2, …, v/seats`; contestants with zero votes are skipped and get no key.
//! - The pooled quotients are ranked descending; ties fall to the higher raw
//!   vote total, then to the lexicographically smaller identifier.
//! - The top `seats` quotients win; a contestant's award is how many of them it owns.
//!
//! Determinism:
//! - No RNG. The identifier order is the final tie-break, so a full tie on
//!   quotient and votes is settled by identifier, never by input order.
//! - Integer votes compare exactly (cross-multiplied in u128); fractional votes
//!   (used by the indifference solver) compare with `f64::total_cmp`.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cmp::Ordering;

use dh_core::{Allocation, Pact};

/// A vote quantity the allocator can rank.
pub trait VoteWeight: Copy {
    /// Only positive totals generate quotients.
    fn is_positive(self) -> bool;

    /// Compare `a / da` against `b / db` (divisors are ≥ 1).
    fn cmp_quotients(a: Self, da: u32, b: Self, db: u32) -> Ordering;

    /// Compare raw totals (the first tie-break).
    fn cmp_raw(a: Self, b: Self) -> Ordering;
}

impl VoteWeight for u64 {
    #[inline]
    fn is_positive(self) -> bool { self > 0 }

    #[inline]
    fn cmp_quotients(a: u64, da: u32, b: u64, db: u32) -> Ordering {
        // a/da ? b/db  ⇔  a*db ? b*da  (u128 cannot overflow here)
        let lhs = (a as u128) * (db as u128);
        let rhs = (b as u128) * (da as u128);
        lhs.cmp(&rhs)
    }

    #[inline]
    fn cmp_raw(a: u64, b: u64) -> Ordering { a.cmp(&b) }
}

impl VoteWeight for f64 {
    #[inline]
    fn is_positive(self) -> bool { self > 0.0 }

    #[inline]
    fn cmp_quotients(a: f64, da: u32, b: f64, db: u32) -> Ordering {
        (a * f64::from(db)).total_cmp(&(b * f64::from(da)))
    }

    #[inline]
    fn cmp_raw(a: f64, b: f64) -> Ordering { a.total_cmp(&b) }
}

/// One pooled quotient: contestant index + divisor.
#[derive(Clone, Copy, Debug)]
struct Quotient {
    contestant: usize,
    divisor: u32,
}

/// Allocate `seats` among `(identifier, votes)` contestants.
///
/// *Notes*:
/// - If `seats == 0`, returns an empty map.
/// - Identifiers are expected to be distinct; a repeated identifier pools its
///   awards under one key.
/// - The awarded total equals `seats` whenever at least one contestant has
///   positive votes (each positive contestant alone supplies `seats` quotients).
pub fn allocate_dhondt<K, W, I>(contestants: I, seats: u32) -> BTreeMap<K, u32>
where
    K: Ord + Clone,
    W: VoteWeight,
    I: IntoIterator<Item = (K, W)>,
{
    let mut out = BTreeMap::new();
    if seats == 0 {
        return out;
    }

    let eligible: Vec<(K, W)> = contestants
        .into_iter()
        .filter(|(_, v)| v.is_positive())
        .collect();
    if eligible.is_empty() {
        return out;
    }

    let mut pool: Vec<Quotient> = Vec::with_capacity(eligible.len() * seats as usize);
    for contestant in 0..eligible.len() {
        for divisor in 1..=seats {
            pool.push(Quotient { contestant, divisor });
        }
    }

    pool.sort_by(|x, y| {
        let (kx, vx) = &eligible[x.contestant];
        let (ky, vy) = &eligible[y.contestant];
        W::cmp_quotients(*vy, y.divisor, *vx, x.divisor)
            .then_with(|| W::cmp_raw(*vy, *vx))
            .then_with(|| kx.cmp(ky))
            // Same contestant: smaller divisor first (its quotient is larger anyway).
            .then_with(|| x.divisor.cmp(&y.divisor))
    });

    for q in pool.iter().take(seats as usize) {
        *out.entry(eligible[q.contestant].0.clone()).or_insert(0) += 1;
    }
    out
}

/// Convenience: allocate a district's pacts by their authoritative vote totals.
pub fn allocate_pacts(pacts: &[Pact], seats: u32) -> Allocation {
    allocate_dhondt(pacts.iter().map(|p| (p.code.clone(), p.votes)), seats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use proptest::prelude::*;

    fn run(votes: &[(&str, u64)], seats: u32) -> Vec<(String, u32)> {
        allocate_dhondt(votes.iter().map(|(k, v)| (String::from(*k), *v)), seats)
            .into_iter()
            .collect()
    }

    fn exp(rows: &[(&str, u32)]) -> Vec<(String, u32)> {
        rows.iter().map(|(k, s)| (String::from(*k), *s)).collect()
    }

    #[test]
    fn worked_example_three_seats() {
        // M: 1800, 900, 600 | C: 1000, 500, 333 | D: 600, 300, 200
        let got = run(&[("M", 1800), ("C", 1000), ("D", 600)], 3);
        assert_eq!(got, exp(&[("C", 1), ("M", 2)]));
    }

    #[test]
    fn zero_seats_is_empty() {
        assert!(run(&[("A", 10)], 0).is_empty());
    }

    #[test]
    fn zero_vote_contestants_get_no_key() {
        let got = run(&[("A", 10), ("B", 0)], 2);
        assert_eq!(got, exp(&[("A", 2)]));
        assert!(run(&[("A", 0), ("B", 0)], 3).is_empty());
    }

    #[test]
    fn quotient_tie_goes_to_higher_raw_votes() {
        // Third seat: A's 200/2 = 100 ties B's 100/1; A has more raw votes.
        let got = run(&[("B", 100), ("A", 200), ("C", 150)], 3);
        assert_eq!(got, exp(&[("A", 2), ("C", 1)]));
    }

    #[test]
    fn full_tie_goes_to_smaller_identifier() {
        let got = run(&[("Z", 500), ("B", 500), ("M", 500)], 2);
        assert_eq!(got, exp(&[("B", 1), ("M", 1)]));
    }

    #[test]
    fn fractional_votes_allocate_like_integers() {
        let ints = allocate_dhondt([("A", 7000u64), ("B", 3000), ("C", 1000)], 5);
        let floats = allocate_dhondt([("A", 7000.0f64), ("B", 3000.0), ("C", 1000.0)], 5);
        assert_eq!(ints, floats);
    }

    #[test]
    fn pacts_use_their_own_vote_total() {
        use dh_core::{Candidate, PactCode};
        let a: PactCode = "A".parse().unwrap();
        let b: PactCode = "B".parse().unwrap();
        // Candidate rows under A sum far above B, but the pact total is what counts.
        let pacts = vec![
            Pact::new(a.clone(), "A", 100)
                .with_candidates(vec![Candidate::new(1, "a1", 10_000, a.clone())]),
            Pact::new(b.clone(), "B", 300),
        ];
        let won = allocate_pacts(&pacts, 1);
        assert_eq!(won.get(&b), Some(&1));
        assert_eq!(won.get(&a), None);
    }

    fn contestants() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0u64..50_000, 1..8)
    }

    fn keyed(votes: &[u64]) -> Vec<(String, u64)> {
        votes.iter().enumerate().map(|(i, v)| (alloc::format!("P{i}"), *v)).collect()
    }

    proptest! {
        #[test]
        fn seat_total_is_fully_awarded(votes in contestants(), seats in 0u32..15) {
            let won = allocate_dhondt(keyed(&votes), seats);
            let total: u32 = won.values().sum();
            let any_positive = votes.iter().any(|&v| v > 0);
            prop_assert_eq!(total, if any_positive { seats } else { 0 });
            prop_assert!(won.values().all(|&s| s > 0));
        }

        #[test]
        fn more_votes_never_cost_seats(
            votes in contestants(),
            seats in 1u32..12,
            pick in 0usize..8,
            bump in 1u64..20_000,
        ) {
            let idx = pick % votes.len();
            let key = alloc::format!("P{idx}");
            let before = allocate_dhondt(keyed(&votes), seats).get(&key).copied().unwrap_or(0);
            let mut raised = votes.clone();
            raised[idx] += bump;
            let after = allocate_dhondt(keyed(&raised), seats).get(&key).copied().unwrap_or(0);
            prop_assert!(after >= before);
        }

        #[test]
        fn identical_inputs_give_identical_outputs(votes in contestants(), seats in 0u32..10) {
            let a = allocate_dhondt(keyed(&votes), seats);
            let mut reversed = keyed(&votes);
            reversed.reverse();
            let b = allocate_dhondt(reversed, seats);
            prop_assert_eq!(a, b);
        }
    }
}
