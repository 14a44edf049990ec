//! crates/dh_io/src/lib.rs
//! Loading collaborator: turns an input locator into validated `District`s.
//!
//! - `sheet`: pure parser for the fixed-format results grid (no file access).
//! - `xlsx`: reads workbooks into that grid (feature `xlsx`, via calamine).
//! - `json`: the JSON interchange format (`{"districts": [...]}`).
//! - `hasher`: SHA-256 digests of every file that was read.
//! - `loader`: dispatches on the locator and returns a `LoadedSource`.
//!
//! Failure kinds the callers tell apart: source-not-found, no-data-found and
//! seat-count-undeterminable each have their own variant.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

/// Unified error for dh_io.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The locator points at nothing.
    #[error("input source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The locator exists but yields no district.
    #[error("no district results found in {}", .0.display())]
    NoDataFound(PathBuf),

    /// A district's seat count could not be read.
    #[error("cannot determine the number of seats for {0}")]
    SeatCountUndeterminable(String),

    /// The locator is neither a directory, a `.json` file nor a workbook.
    #[error("unsupported input source: {}", .0.display())]
    UnsupportedSource(PathBuf),

    /// Workbook could not be opened or a sheet could not be read.
    #[error("workbook error in {}: {msg}", .path.display())]
    Workbook { path: PathBuf, msg: String },

    /// Malformed JSON document.
    #[error("json error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed records violate a district invariant.
    #[error("invalid district {district}: {msg}")]
    Invalid { district: String, msg: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LoadResult<T> = Result<T, LoadError>;

pub mod hasher;
pub mod json;
pub mod loader;
pub mod sheet;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use hasher::InputDigest;
pub use loader::{load_districts, LoadedSource};
pub use sheet::{parse_sheet, Cell};
