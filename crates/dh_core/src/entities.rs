//! crates/dh_core/src/entities.rs
//! Read-only election records as supplied by the loader.
//!
//! A pact's `votes` is the authoritative total for seat allocation; candidate
//! votes only rank candidates inside their pact. The two may disagree when the
//! source's summary rows diverge from the candidate rows.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::{DistrictId, PactCode};

/// Seats won per pact code. Key-ordered so iteration is deterministic;
/// display order (seats desc, code asc) is derived by the reporter.
pub type Allocation = BTreeMap<PactCode, u32>;

/// One candidacy inside a pact.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    /// Ballot number (0 when the source does not print one).
    pub number: u32,
    pub name: String,
    /// Party label; may read `"IND - PPD"` for an independent affiliated with PPD.
    #[cfg_attr(feature = "serde", serde(default))]
    pub party: Option<String>,
    pub votes: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub percentage: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub elected: bool,
    /// Code of the pact that listed this candidate on the ballot.
    pub pact_code: PactCode,
}

impl Candidate {
    pub fn new(number: u32, name: impl Into<String>, votes: u64, pact_code: PactCode) -> Self {
        Self {
            number,
            name: name.into(),
            party: None,
            votes,
            percentage: None,
            elected: false,
            pact_code,
        }
    }

    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        self.party = Some(party.into());
        self
    }

    /// Identity key used when de-duplicating selections: `(ballot number, name)`.
    #[inline]
    pub fn identity(&self) -> (u32, &str) {
        (self.number, self.name.as_str())
    }
}

/// Aggregated result of one pact (alliance/list) inside a district.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pact {
    pub code: PactCode,
    pub name: String,
    /// Raw label as printed in the source (`"C - Unidad Por Chile"`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    pub votes: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub percentage: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub candidate_slots: Option<u32>,
    /// Seats the official count awarded this pact, when the source reports it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seats_won: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub candidates: Vec<Candidate>,
}

impl Pact {
    pub fn new(code: PactCode, name: impl Into<String>, votes: u64) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            code,
            name,
            votes,
            percentage: None,
            candidate_slots: None,
            seats_won: None,
            candidates: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Sum of the candidate rows (may differ from `votes`).
    pub fn candidate_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.votes).sum()
    }
}

/// Results of one district (senate circumscription or deputies district).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct District {
    pub id: DistrictId,
    pub label: String,
    pub seats: u32,
    pub pacts: Vec<Pact>,
}

impl District {
    /// Build a district, enforcing `seats >= 1`, unique pact codes and
    /// candidate → parent-pact references.
    pub fn new(
        id: DistrictId,
        label: impl Into<String>,
        seats: u32,
        pacts: Vec<Pact>,
    ) -> Result<Self, CoreError> {
        let d = Self { id, label: label.into(), seats, pacts };
        d.validate()?;
        Ok(d)
    }

    /// Re-check invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.seats == 0 {
            return Err(CoreError::ZeroSeats(self.id.to_string()));
        }
        let mut seen = BTreeSet::new();
        for p in &self.pacts {
            if !seen.insert(&p.code) {
                return Err(CoreError::DuplicatePactCode(p.code.to_string()));
            }
            if let Some(c) = p.candidates.iter().find(|c| c.pact_code != p.code) {
                return Err(CoreError::ForeignCandidate {
                    pact: p.code.to_string(),
                    candidate: c.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn total_votes(&self) -> u64 {
        self.pacts.iter().map(|p| p.votes).sum()
    }
}
