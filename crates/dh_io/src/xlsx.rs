//! crates/dh_io/src/xlsx.rs
//! Workbook reader (calamine). Only the first sheet is read; each official
//! export holds one district.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use tracing::info;

use dh_core::District;

use crate::sheet::{parse_sheet, Cell};
use crate::{LoadError, LoadResult};

impl From<&Data> for Cell {
    fn from(d: &Data) -> Self {
        match d {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        }
    }
}

/// First sheet of `path` as a dense grid of cells.
pub fn read_first_sheet(path: &Path) -> LoadResult<Vec<Vec<Cell>>> {
    let workbook_err = |msg: String| LoadError::Workbook { path: path.to_path_buf(), msg };

    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| workbook_err("workbook contains no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| workbook_err(format!("sheet {first:?}: {e}")))?;

    Ok(range.rows().map(|row| row.iter().map(Cell::from).collect()).collect())
}

/// Load one district from an official results workbook.
pub fn load_workbook(path: &Path) -> LoadResult<District> {
    let rows = read_first_sheet(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let district = parse_sheet(&rows, &file_name)?;
    info!(
        file = %path.display(),
        district = %district.id,
        seats = district.seats,
        pacts = district.pacts.len(),
        "loaded workbook"
    );
    Ok(district)
}
