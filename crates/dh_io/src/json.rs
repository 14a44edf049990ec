//! crates/dh_io/src/json.rs
//! JSON interchange format for district results.
//!
//! ```json
//! { "districts": [
//!   { "id": "5", "label": "Circunscripción Senatorial 5", "seats": 3,
//!     "pacts": [
//!       { "code": "C", "name": "Unidad Por Chile", "votes": 96926, "seats_won": 1,
//!         "candidates": [ { "number": 12, "name": "Daniella Cicardini", "party": "PS", "votes": 66166 } ] }
//!     ] } ] }
//! ```
//!
//! Candidates inherit their pact's code; `label` defaults to the id (district)
//! or to `"CODE - Name"` (pact).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use dh_core::{Candidate, District, DistrictId, Pact, PactCode};

use crate::{LoadError, LoadResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    districts: Vec<DistrictDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DistrictDoc {
    id: String,
    #[serde(default)]
    label: Option<String>,
    seats: u32,
    #[serde(default)]
    pacts: Vec<PactDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PactDoc {
    code: String,
    name: String,
    #[serde(default)]
    label: Option<String>,
    votes: u64,
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    candidate_slots: Option<u32>,
    #[serde(default)]
    seats_won: Option<u32>,
    #[serde(default)]
    candidates: Vec<CandidateDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CandidateDoc {
    #[serde(default)]
    number: u32,
    name: String,
    #[serde(default)]
    party: Option<String>,
    votes: u64,
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    elected: bool,
}

fn invalid(district: &str, msg: String) -> LoadError {
    LoadError::Invalid { district: district.to_string(), msg }
}

impl PactDoc {
    fn into_pact(self, district: &str) -> LoadResult<Pact> {
        let code: PactCode = self
            .code
            .parse()
            .map_err(|e| invalid(district, format!("pact code {:?}: {e}", self.code)))?;
        let label = self.label.unwrap_or_else(|| format!("{} - {}", self.code, self.name));
        let candidates = self
            .candidates
            .into_iter()
            .map(|c| Candidate {
                number: c.number,
                name: c.name,
                party: c.party,
                votes: c.votes,
                percentage: c.percentage,
                elected: c.elected,
                pact_code: code.clone(),
            })
            .collect();
        Ok(Pact {
            code,
            name: self.name,
            label,
            votes: self.votes,
            percentage: self.percentage,
            candidate_slots: self.candidate_slots,
            seats_won: self.seats_won,
            candidates,
        })
    }
}

impl DistrictDoc {
    fn into_district(self) -> LoadResult<District> {
        if self.seats == 0 {
            return Err(LoadError::SeatCountUndeterminable(self.id));
        }
        let id: DistrictId = self
            .id
            .parse()
            .map_err(|e| invalid(&self.id, format!("district id: {e}")))?;
        let pacts = self
            .pacts
            .into_iter()
            .map(|p| p.into_pact(id.as_str()))
            .collect::<LoadResult<Vec<_>>>()?;
        let label = self.label.unwrap_or_else(|| id.to_string());
        District::new(id.clone(), label, self.seats, pacts)
            .map_err(|e| invalid(id.as_str(), e.to_string()))
    }
}

/// Parse a JSON document. `origin` is used for error messages.
pub fn parse_districts(text: &str, origin: &Path) -> LoadResult<Vec<District>> {
    let doc: Document = serde_json::from_str(text)
        .map_err(|source| LoadError::Json { path: origin.to_path_buf(), source })?;
    if doc.districts.is_empty() {
        return Err(LoadError::NoDataFound(origin.to_path_buf()));
    }
    doc.districts.into_iter().map(DistrictDoc::into_district).collect()
}

/// Read and parse a JSON districts file.
pub fn load_json_file(path: &Path) -> LoadResult<Vec<District>> {
    let text = fs::read_to_string(path)?;
    parse_districts(&text, path)
}
