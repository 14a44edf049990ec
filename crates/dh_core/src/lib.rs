//! dh_core: Core election records, code newtypes, and stable ordering helpers.
//!
//! This crate is **I/O-free**. It defines the value types shared across the
//! workspace (`dh_io`, `dh_algo`, `dh_pipeline`, `dh_report`, `dh_cli`):
//!
//! - Codes: `PactCode`, `DistrictId`
//! - Records: `Candidate`, `Pact`, `District` (read-only once built)
//! - `Allocation`: key-ordered map from pact code to seats
//! - Deterministic ordering helpers (candidate rank, display order)
//!
//! Serialization derives are gated behind the `serde` feature.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod errors {
    use alloc::string::String;
    use core::fmt;

    /// Minimal error set for record validation.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        /// A district must elect at least one seat.
        ZeroSeats(String),
        /// Two pacts in the same district share a code.
        DuplicatePactCode(String),
        /// A candidate names a pact code other than the pact that lists it.
        ForeignCandidate { pact: String, candidate: String },
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::ZeroSeats(d) => write!(f, "district {d} has no seats to elect"),
                CoreError::DuplicatePactCode(c) => write!(f, "duplicate pact code: {c}"),
                CoreError::ForeignCandidate { pact, candidate } => {
                    write!(f, "candidate {candidate} listed under pact {pact} belongs elsewhere")
                }
            }
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for CoreError {}
}

pub mod determinism;
pub mod entities;
pub mod ids;

pub use entities::{Allocation, Candidate, District, Pact};
pub use errors::CoreError;
pub use ids::{DistrictId, IdError, PactCode};
