//! Loader: resolve an input locator into districts plus input digests.
//!
//! Locator forms:
//! - a directory: every `*.xlsx` (one district each) and `*.json` file in it,
//!   read in file-name order; Office lock files (`~$…`) are skipped;
//! - a single `.json` or `.xlsx` file.
//!
//! No network I/O. Districts keep source order; duplicates across files are
//! the caller's concern.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dh_core::District;

use crate::hasher::{sha256_file, InputDigest};
use crate::{json, LoadError, LoadResult};

/// Everything read from one locator.
#[derive(Debug)]
pub struct LoadedSource {
    pub districts: Vec<District>,
    pub digests: Vec<InputDigest>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceKind {
    Json,
    Workbook,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with("~$") {
        return None;
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(SourceKind::Json),
        "xlsx" => Some(SourceKind::Workbook),
        _ => None,
    }
}

fn load_file(path: &Path, kind: SourceKind) -> LoadResult<Vec<District>> {
    match kind {
        SourceKind::Json => json::load_json_file(path),
        #[cfg(feature = "xlsx")]
        SourceKind::Workbook => crate::xlsx::load_workbook(path).map(|d| vec![d]),
        #[cfg(not(feature = "xlsx"))]
        SourceKind::Workbook => Err(LoadError::UnsupportedSource(path.to_path_buf())),
    }
}

fn directory_entries(dir: &Path) -> LoadResult<Vec<(PathBuf, SourceKind)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match source_kind(&path) {
            Some(kind) => entries.push((path, kind)),
            None => debug!(file = %path.display(), "skipping non-results file"),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Load every district reachable from `path`.
pub fn load_districts(path: &Path) -> LoadResult<LoadedSource> {
    if !path.exists() {
        return Err(LoadError::SourceNotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        let entries = directory_entries(path)?;
        if entries.is_empty() {
            return Err(LoadError::NoDataFound(path.to_path_buf()));
        }
        entries
    } else {
        let kind =
            source_kind(path).ok_or_else(|| LoadError::UnsupportedSource(path.to_path_buf()))?;
        vec![(path.to_path_buf(), kind)]
    };

    let mut districts = Vec::new();
    let mut digests = Vec::with_capacity(files.len());
    for (file, kind) in &files {
        districts.extend(load_file(file, *kind)?);
        digests.push(sha256_file(file)?);
    }
    if districts.is_empty() {
        return Err(LoadError::NoDataFound(path.to_path_buf()));
    }

    info!(source = %path.display(), files = files.len(), districts = districts.len(), "inputs loaded");
    Ok(LoadedSource { districts, digests })
}
