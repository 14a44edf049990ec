//! Winner selection inside a pact (two-level list PR).
//!
//! The pact total decides how many seats the pact wins; which candidates take
//! them is decided by a second D’Hondt pass over the pact's internal sub-pacts
//! (party groups), then by candidate rank inside each sub-pact.
//!
//! Sub-pact key of a candidate:
//! - `"IND - P"` (independent affiliated with party P) → `P`
//! - bare `"IND"` → `IND`
//! - any other label → the label itself (trimmed)
//! - no label → the candidate's own pact code
//!
//! Shortfall policy: when a sub-pact has fewer candidates than the seats it
//! earned, the missing seats go to the best remaining candidates of the whole
//! pact, identity-keyed by `(ballot number, name)`.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use dh_core::determinism::{cmp_candidates_by_rank, sort_candidates_by_rank};
use dh_core::{Allocation, Candidate, Pact, PactCode};

use crate::allocation::allocate_dhondt;

/// Elected candidates per pact code.
pub type Winners = BTreeMap<PactCode, Vec<Candidate>>;

const INDEPENDENT_PREFIXES: [&str; 2] = ["IND", "INDEPENDIENTE"];

/// Sub-pact grouping key for one candidate.
pub fn subpact_code(candidate: &Candidate) -> String {
    let label = match candidate.party.as_deref().map(str::trim) {
        Some(l) if !l.is_empty() => l,
        _ => return candidate.pact_code.to_string(),
    };

    if let Some((head, tail)) = label.split_once('-') {
        let head = head.trim();
        let tail = tail.trim();
        if !tail.is_empty() && INDEPENDENT_PREFIXES.iter().any(|p| head.eq_ignore_ascii_case(p)) {
            return tail.to_string();
        }
    }
    label.to_string()
}

/// Pick the `seats` elected candidates of `pact`, in rank order.
pub fn select_winners(pact: &Pact, seats: u32) -> Vec<Candidate> {
    let n = seats as usize;
    if n == 0 || pact.candidates.is_empty() {
        return Vec::new();
    }

    let mut ranked = pact.candidates.clone();
    sort_candidates_by_rank(&mut ranked);

    // Groups keep rank order because `ranked` is already sorted.
    let mut groups: BTreeMap<String, Vec<&Candidate>> = BTreeMap::new();
    for c in &ranked {
        groups.entry(subpact_code(c)).or_default().push(c);
    }
    let group_votes = groups
        .iter()
        .map(|(k, members)| (k.clone(), members.iter().map(|c| c.votes).sum::<u64>()));
    let sub_alloc = allocate_dhondt(group_votes, seats);

    if sub_alloc.is_empty() {
        return ranked.iter().take(n).cloned().collect();
    }

    let mut selected: Vec<Candidate> = Vec::with_capacity(n);
    for (group, &group_seats) in &sub_alloc {
        if let Some(members) = groups.get(group) {
            selected.extend(members.iter().take(group_seats as usize).map(|c| (*c).clone()));
        }
    }

    if selected.len() < n {
        let taken: BTreeSet<(u32, &str)> = selected.iter().map(Candidate::identity).collect();
        let missing = n - selected.len();
        let fill: Vec<Candidate> = ranked
            .iter()
            .filter(|c| !taken.contains(&c.identity()))
            .take(missing)
            .cloned()
            .collect();
        selected.extend(fill);
    }

    selected.sort_by(cmp_candidates_by_rank);
    selected.truncate(n);
    selected
}

/// Winners for every pact that holds at least one seat in `allocation`.
/// Codes without a matching pact are skipped.
pub fn winners_by_pact(pacts: &[Pact], allocation: &Allocation) -> Winners {
    let mut out = Winners::new();
    for (code, &seats) in allocation {
        if seats == 0 {
            continue;
        }
        if let Some(pact) = pacts.iter().find(|p| &p.code == code) {
            out.insert(code.clone(), select_winners(pact, seats));
        }
    }
    out
}
