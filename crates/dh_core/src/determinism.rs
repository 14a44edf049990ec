//! Determinism utilities: stable orders for candidates and allocations.
//!
//! This module is **I/O-free**. Every ordering here is total, so sorting the
//! same records twice always yields the same sequence.

use core::cmp::Ordering;

use alloc::vec::Vec;

use crate::entities::{Allocation, Candidate};
use crate::ids::PactCode;

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for PactCode {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl StableOrd for Candidate {
    /// Rank order: votes desc → ballot number asc → name asc.
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        other
            .votes
            .cmp(&self.votes)
            .then_with(|| self.number.cmp(&other.number))
            .then_with(|| self.name.cmp(&other.name))
    }
}

/* -------------------------------------------------------------------------- */
/*                            Canonical sort helpers                           */
/* -------------------------------------------------------------------------- */

/// Compare two candidates by rank (votes desc, number asc, name asc).
#[inline]
pub fn cmp_candidates_by_rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.stable_cmp(b)
}

/// Sort candidates **in place** into rank order.
#[inline]
pub fn sort_candidates_by_rank(xs: &mut [Candidate]) {
    xs.sort_by(cmp_candidates_by_rank);
}

/// Allocation entries in presentation order: seats desc, then code asc.
pub fn allocation_display_order(alloc: &Allocation) -> Vec<(&PactCode, u32)> {
    let mut rows: Vec<(&PactCode, u32)> = alloc.iter().map(|(k, &v)| (k, v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.stable_cmp(b.0)));
    rows
}

/* ---------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PactCode { s.parse().unwrap() }

    #[test]
    fn candidate_rank_breaks_ties_by_number_then_name() {
        let mut xs = vec![
            Candidate::new(4, "Beta", 100, code("A")),
            Candidate::new(2, "Zeta", 100, code("A")),
            Candidate::new(2, "Alfa", 100, code("A")),
            Candidate::new(9, "Top", 500, code("A")),
        ];
        sort_candidates_by_rank(&mut xs);
        let got: Vec<&str> = xs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(got, vec!["Top", "Alfa", "Zeta", "Beta"]);
    }

    #[test]
    fn display_order_is_seats_desc_then_code() {
        let mut alloc = Allocation::new();
        alloc.insert(code("J"), 1);
        alloc.insert(code("C"), 1);
        alloc.insert(code("B"), 3);
        let got: Vec<(&str, u32)> = allocation_display_order(&alloc)
            .into_iter()
            .map(|(c, s)| (c.as_str(), s))
            .collect();
        assert_eq!(got, vec![("B", 3), ("C", 1), ("J", 1)]);
    }
}
