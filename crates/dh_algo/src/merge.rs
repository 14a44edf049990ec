//! Scenario builder: replace several pacts of a district by one synthetic pact.
//!
//! The synthetic pact sums the constituents' votes, concatenates their
//! candidates (rank-sorted), and is named by joining codes and names with
//! `" + "` in ballot order. It is appended after the untouched pacts.
//! Candidates keep their original `pact_code`, which is what the internal
//! breakdown of the merged pact groups on.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use dh_core::determinism::sort_candidates_by_rank;
use dh_core::{Allocation, Candidate, District, IdError, Pact, PactCode};

use crate::allocation::allocate_pacts;
use crate::indifference::NationalScenario;

/// Why a merge scenario could not be built for a district.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScenarioError {
    /// None of the requested codes is on this district's ballot.
    NoMatch { requested: Vec<String> },
    /// The joined code is not a valid `PactCode` (only reachable with empty parts).
    InvalidCode(IdError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::NoMatch { requested } => write!(
                f,
                "none of the requested pacts ({}) is present in the district",
                requested.join(", ")
            ),
            ScenarioError::InvalidCode(e) => write!(f, "invalid merged code: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScenarioError {}

/// A district with some pacts merged into one.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedScenario {
    pub seats: u32,
    /// Untouched pacts in original order, then the merged pact.
    pub pacts: Vec<Pact>,
    /// Code of the synthetic pact, e.g. `"C + J"`.
    pub merged_code: PactCode,
    /// Original codes folded into the synthetic pact, in ballot order.
    pub merged_codes: Vec<PactCode>,
}

impl MergedScenario {
    pub fn merged_pact(&self) -> Option<&Pact> {
        self.pacts.iter().find(|p| p.code == self.merged_code)
    }

    /// D’Hondt over the scenario's pacts.
    pub fn allocate(&self) -> Allocation {
        allocate_pacts(&self.pacts, self.seats)
    }

    /// Seats the constituents held together in a baseline allocation.
    pub fn baseline_seats(&self, baseline: &Allocation) -> u32 {
        self.merged_codes
            .iter()
            .map(|c| baseline.get(c).copied().unwrap_or(0))
            .sum()
    }

    /// Group elected candidates of the merged pact by the pact that listed them.
    pub fn breakdown(&self, winners: &[Candidate]) -> BTreeMap<PactCode, Vec<Candidate>> {
        let mut out: BTreeMap<PactCode, Vec<Candidate>> = BTreeMap::new();
        for c in winners {
            out.entry(c.pact_code.clone()).or_default().push(c.clone());
        }
        out
    }

    /// Snapshot kept for the joint national solve.
    pub fn to_national(&self) -> NationalScenario {
        NationalScenario {
            pacts: self.pacts.clone(),
            merged_code: self.merged_code.clone(),
            seats: self.seats,
        }
    }
}

/// Merge every pact whose code matches one of `codes` (case-insensitive).
///
/// Returns the new pact list together with the synthetic code and the
/// original codes merged. Fails with `NoMatch` when nothing matched.
pub fn merge_pacts<S: AsRef<str>>(
    pacts: &[Pact],
    codes: &[S],
) -> Result<(Vec<Pact>, PactCode, Vec<PactCode>), ScenarioError> {
    let wanted = |p: &Pact| codes.iter().any(|c| p.code.eq_ignore_case(c.as_ref()));

    let mut kept: Vec<Pact> = Vec::with_capacity(pacts.len());
    let mut merged_codes: Vec<PactCode> = Vec::new();
    let mut merged_names: Vec<&str> = Vec::new();
    let mut merged_candidates: Vec<Candidate> = Vec::new();
    let mut merged_votes: u64 = 0;

    for p in pacts {
        if wanted(p) {
            merged_votes += p.votes;
            merged_candidates.extend(p.candidates.iter().cloned());
            merged_names.push(p.name.as_str());
            merged_codes.push(p.code.clone());
        } else {
            kept.push(p.clone());
        }
    }

    if merged_codes.is_empty() {
        let mut requested: Vec<String> = codes
            .iter()
            .map(|c| c.as_ref().trim().to_uppercase())
            .collect();
        requested.sort();
        requested.dedup();
        return Err(ScenarioError::NoMatch { requested });
    }

    let merged_code = PactCode::join(&merged_codes).map_err(ScenarioError::InvalidCode)?;
    sort_candidates_by_rank(&mut merged_candidates);

    let mut merged = Pact::new(merged_code.clone(), merged_names.join(" + "), merged_votes);
    merged.label = String::from(merged_code.as_str());
    merged.candidates = merged_candidates;
    kept.push(merged);

    Ok((kept, merged_code, merged_codes))
}

/// Build the merge scenario of a whole district.
pub fn merge_district<S: AsRef<str>>(
    district: &District,
    codes: &[S],
) -> Result<MergedScenario, ScenarioError> {
    let (pacts, merged_code, merged_codes) = merge_pacts(&district.pacts, codes)?;
    Ok(MergedScenario { seats: district.seats, pacts, merged_code, merged_codes })
}
