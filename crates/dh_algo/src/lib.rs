// crates/dh_algo/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    pub mod dhondt;

    pub use dhondt::{allocate_dhondt, allocate_pacts, VoteWeight};
}

// ----------------------------- Scenario building & winners ---------------------------

pub mod merge;
pub mod subpact;

// ----------------------------- Sensitivity -------------------------------------------

pub mod indifference;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use allocation::{allocate_dhondt, allocate_pacts, VoteWeight};
pub use indifference::{
    indifference_loss, merged_seats_at_loss, national_indifference_loss, pacts_with_vote_loss,
    NationalScenario, SolverError, SolverParams, WeightedPact,
};
pub use merge::{merge_district, merge_pacts, MergedScenario, ScenarioError};
pub use subpact::{select_winners, subpact_code, winners_by_pact, Winners};
