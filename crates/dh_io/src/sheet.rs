//! crates/dh_io/src/sheet.rs
//! Fixed-format parser for the official results grid.
//!
//! Layout (one district per sheet):
//! - a preamble whose first column states the seat count
//!   (`"3 senadores a elegir"`, `"6 diputados a elegir"`);
//! - a header row starting with `Lista/Pacto`, with named columns
//!   `Partido`, `Votos`, `Porcentaje`, `Candidatos`, `Electos` and an
//!   unnamed candidate column right after `Lista/Pacto`;
//! - pact rows (`"C - Unidad Por Chile"` in `Lista/Pacto`), each followed by its
//!   candidate rows (`"12 Daniella Cicardini"` in the candidate column);
//! - summary rows (`Válidamente emitidos`, `Votos nulos`, ...) end the table.
//!
//! District id and label come from the file name
//! (`CIRCUNSCRIPCIÓN SENATORIAL 5` / `DISTRITO 10`, else the file stem).

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use dh_core::{Candidate, District, DistrictId, Pact, PactCode};

use crate::{LoadError, LoadResult};

const LABEL_HEADER: &str = "Lista/Pacto";

const SUMMARY_PREFIXES: [&str; 5] = [
    "válidamente",
    "votos nulos",
    "votos en blanco",
    "total votación",
    "resultados preliminares",
];

const ELECTED_MARK: char = '✓';

static EMPTY: Cell = Cell::Empty;

/// A worksheet cell reduced to what the importer cares about.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Trimmed, non-empty text content.
    fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.trim()).filter(|t| !t.is_empty()),
            _ => None,
        }
    }

    /// Count-like value. Text keeps digits only (`"12.345"` → 12345).
    fn count(&self) -> Option<u64> {
        match self {
            Cell::Number(n) if n.is_finite() && *n >= 0.0 => Some(*n as u64),
            Cell::Text(s) => {
                let digits: String = s.chars().filter(char::is_ascii_digit).collect();
                digits.parse().ok()
            }
            _ => None,
        }
    }

    /// Share as a fraction. Text uses the local format (`"45,67 %"` → 0.4567).
    fn percentage(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => {
                let clean: String = s
                    .chars()
                    .filter(|c| !matches!(c, '%' | '.' | ' '))
                    .map(|c| if c == ',' { '.' } else { c })
                    .collect();
                clean.trim().parse::<f64>().ok().map(|v| v / 100.0)
            }
            Cell::Empty => None,
        }
    }
}

fn cached(slot: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    slot.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn seats_regex() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    cached(&RX, r"(\d+)\s+(senadores|diputados)\s+a\s+elegir")
}

fn digits_regex() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    cached(&RX, r"(\d+)")
}

fn candidate_regex() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    cached(&RX, r"^(\d+)\s+(.*)$")
}

fn senate_regex() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    cached(&RX, r"CIRCUNSCRIPCIÓN SENATORIAL\s*(\d+)")
}

fn district_regex() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    cached(&RX, r"DISTRITO\s*(\d+)")
}

/// Seat count stated in the first column, if any.
pub fn seats_from_rows(rows: &[Vec<Cell>]) -> Option<u32> {
    for text in rows.iter().filter_map(|r| r.first()).filter_map(Cell::text) {
        let lower = text.to_lowercase();
        if let Some(m) = seats_regex().captures(&lower) {
            return m[1].parse().ok().filter(|&n: &u32| n > 0);
        }
        if lower.contains("senadores") || lower.contains("diputados") {
            if let Some(m) = digits_regex().captures(&lower) {
                return m[1].parse().ok().filter(|&n: &u32| n > 0);
            }
        }
    }
    None
}

/// `(id, label)` derived from a file name.
pub fn district_meta(file_name: &str) -> (String, String) {
    let upper = file_name.to_uppercase();
    if let Some(m) = senate_regex().captures(&upper) {
        return (m[1].to_string(), format!("Circunscripción Senatorial {}", &m[1]));
    }
    if let Some(m) = district_regex().captures(&upper) {
        return (m[1].to_string(), format!("Distrito {}", &m[1]));
    }
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string();
    (stem.clone(), stem)
}

fn is_summary_row(label: &str) -> bool {
    let lower = label.to_lowercase();
    SUMMARY_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Column positions resolved from the header row.
struct Columns {
    label: usize,
    candidate: usize,
    named: HashMap<String, usize>,
}

impl Columns {
    fn from_header(row: &[Cell]) -> Option<Self> {
        let label = row
            .iter()
            .position(|c| c.text().is_some_and(|t| t.eq_ignore_ascii_case(LABEL_HEADER)))?;
        let candidate = (label + 1..row.len())
            .find(|&i| row[i].text().is_none())
            .unwrap_or(label + 1);
        let named = row
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.text().map(|t| (t.to_lowercase(), i)))
            .collect();
        Some(Self { label, candidate, named })
    }

    fn get<'r>(&self, row: &'r [Cell], name: &str) -> &'r Cell {
        self.named
            .get(&name.to_lowercase())
            .and_then(|&i| row.get(i))
            .unwrap_or(&EMPTY)
    }
}

fn invalid(district: &str, msg: impl Into<String>) -> LoadError {
    LoadError::Invalid { district: district.to_string(), msg: msg.into() }
}

fn build_pact(label: &str, row: &[Cell], cols: &Columns, district: &str) -> LoadResult<Pact> {
    let (code, name) = match label.split_once(" - ") {
        Some((c, n)) => (c.trim(), n.trim()),
        None => (label, label),
    };
    let code: PactCode = code
        .parse()
        .map_err(|e| invalid(district, format!("pact code {code:?}: {e}")))?;

    let mut pact = Pact::new(code, name, cols.get(row, "Votos").count().unwrap_or(0));
    pact.label = label.to_string();
    pact.percentage = cols.get(row, "Porcentaje").percentage();
    pact.candidate_slots = cols.get(row, "Candidatos").count().map(|n| n as u32);
    pact.seats_won = cols.get(row, "Electos").count().map(|n| n as u32);
    Ok(pact)
}

fn build_candidate(raw: &str, row: &[Cell], cols: &Columns, pact_code: &PactCode) -> Candidate {
    let (number, name) = match candidate_regex().captures(raw) {
        Some(m) => (m[1].parse().unwrap_or(0), m[2].trim().to_string()),
        None => (0, raw.to_string()),
    };
    let mut c = Candidate::new(
        number,
        name,
        cols.get(row, "Votos").count().unwrap_or(0),
        pact_code.clone(),
    );
    c.party = cols.get(row, "Partido").text().map(str::to_string);
    c.percentage = cols.get(row, "Porcentaje").percentage();
    c.elected = matches!(cols.get(row, "Electos"), Cell::Text(s) if s.contains(ELECTED_MARK));
    c
}

/// Parse one results grid into a validated `District`.
pub fn parse_sheet(rows: &[Vec<Cell>], file_name: &str) -> LoadResult<District> {
    let (id, label) = district_meta(file_name);
    let seats = seats_from_rows(rows)
        .ok_or_else(|| LoadError::SeatCountUndeterminable(file_name.to_string()))?;

    let (header_at, cols) = rows
        .iter()
        .enumerate()
        .find_map(|(i, r)| Columns::from_header(r).map(|c| (i, c)))
        .ok_or_else(|| invalid(&id, format!("no {LABEL_HEADER} header row")))?;

    let mut pacts: Vec<Pact> = Vec::new();
    for row in &rows[header_at + 1..] {
        if let Some(label) = row.get(cols.label).and_then(Cell::text) {
            if is_summary_row(label) {
                break;
            }
            pacts.push(build_pact(label, row, &cols, &id)?);
            continue;
        }
        // Rows before the first pact are padding.
        let Some(pact) = pacts.last_mut() else { continue };
        if let Some(raw) = row.get(cols.candidate).and_then(Cell::text) {
            let candidate = build_candidate(raw, row, &cols, &pact.code);
            pact.candidates.push(candidate);
        }
    }

    debug!(district = %id, seats, pacts = pacts.len(), "parsed results sheet");

    let district_id: DistrictId = id
        .parse()
        .map_err(|e| invalid(&id, format!("district id: {e}")))?;
    District::new(district_id, label, seats, pacts).map_err(|e| invalid(&id, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell { Cell::Text(s.to_string()) }
    fn n(x: f64) -> Cell { Cell::Number(x) }
    const E: Cell = Cell::Empty;

    fn header() -> Vec<Cell> {
        vec![t("Lista/Pacto"), E, t("Partido"), t("Votos"), t("Porcentaje"), t("Candidatos"), t("Electos")]
    }

    fn grid() -> Vec<Vec<Cell>> {
        let mut rows = vec![
            vec![t("Elección Senatorial")],
            vec![t("3 senadores a elegir")],
            vec![],
            header(),
            vec![t("C - Unidad Por Chile"), E, E, n(96_926.0), n(0.41), n(2.0), n(1.0)],
            vec![E, t("12 Daniella Cicardini"), t("PS"), n(66_166.0), t("28,12 %"), E, t("✓")],
            vec![E, t("13 Yasna Provoste"), t("IND - PDC"), t("30.760"), E, E, E],
            vec![t("J - Cambio Por Chile"), E, E, t("80.000"), E, n(1.0), n(0.0)],
            vec![E, t("20 Solo Candidato"), t("REP"), n(80_000.0), E, E, E],
            vec![t("Válidamente emitidos"), E, E, n(176_926.0)],
            vec![t("X - Never Read"), E, E, n(1.0)],
        ];
        rows.insert(0, vec![E]);
        rows
    }

    #[test]
    fn parses_pacts_and_candidates() {
        let d = parse_sheet(&grid(), "Resultados Circunscripción Senatorial 3.xlsx").unwrap();
        assert_eq!(d.id.as_str(), "3");
        assert_eq!(d.label, "Circunscripción Senatorial 3");
        assert_eq!(d.seats, 3);
        assert_eq!(d.pacts.len(), 2);

        let c = &d.pacts[0];
        assert_eq!(c.code.as_str(), "C");
        assert_eq!(c.name, "Unidad Por Chile");
        assert_eq!(c.label, "C - Unidad Por Chile");
        assert_eq!(c.votes, 96_926);
        assert_eq!(c.candidate_slots, Some(2));
        assert_eq!(c.seats_won, Some(1));
        assert_eq!(c.candidates.len(), 2);

        let dc = &c.candidates[0];
        assert_eq!((dc.number, dc.name.as_str()), (12, "Daniella Cicardini"));
        assert_eq!(dc.party.as_deref(), Some("PS"));
        assert!(dc.elected);
        assert!((dc.percentage.unwrap() - 0.2812).abs() < 1e-9);

        let yp = &c.candidates[1];
        assert_eq!(yp.votes, 30_760);
        assert!(!yp.elected);
        assert_eq!(yp.pact_code.as_str(), "C");

        assert_eq!(d.pacts[1].votes, 80_000);
        assert_eq!(d.pacts[1].seats_won, Some(0));
    }

    #[test]
    fn summary_row_ends_the_table() {
        let d = parse_sheet(&grid(), "x.xlsx").unwrap();
        assert!(d.pacts.iter().all(|p| p.code.as_str() != "X"));
    }

    #[test]
    fn seat_count_is_required() {
        let mut rows = grid();
        rows.remove(2);
        let err = parse_sheet(&rows, "sin escaños.xlsx").unwrap_err();
        assert!(matches!(err, LoadError::SeatCountUndeterminable(ref f) if f == "sin escaños.xlsx"));
    }

    #[test]
    fn seat_count_generic_fallback() {
        let rows = vec![vec![t("Diputados: 8")]];
        assert_eq!(seats_from_rows(&rows), Some(8));
        assert_eq!(seats_from_rows(&[vec![t("Total 5")]]), None);
        assert_eq!(seats_from_rows(&[vec![t("6 DIPUTADOS A ELEGIR")]]), Some(6));
    }

    #[test]
    fn metadata_from_file_names() {
        assert_eq!(district_meta("Distrito 10.xlsx"), ("10".into(), "Distrito 10".into()));
        assert_eq!(
            district_meta("circunscripción senatorial 7 - resultados.xlsx"),
            ("7".into(), "Circunscripción Senatorial 7".into())
        );
        assert_eq!(district_meta("Otra región.xlsx"), ("Otra región".into(), "Otra región".into()));
    }

    #[test]
    fn label_without_separator_is_code_and_name() {
        let rows = vec![
            vec![t("2 senadores a elegir")],
            header(),
            vec![t("INDEPENDIENTES"), E, E, n(10.0)],
        ];
        let d = parse_sheet(&rows, "a.xlsx").unwrap();
        assert_eq!(d.pacts[0].code.as_str(), "INDEPENDIENTES");
        assert_eq!(d.pacts[0].name, "INDEPENDIENTES");
        assert_eq!(d.pacts[0].candidate_slots, None);
    }

    #[test]
    fn duplicate_pact_codes_are_rejected() {
        let rows = vec![
            vec![t("2 senadores a elegir")],
            header(),
            vec![t("A - Uno"), E, E, n(10.0)],
            vec![t("A - Otro"), E, E, n(20.0)],
        ];
        assert!(matches!(parse_sheet(&rows, "a.xlsx"), Err(LoadError::Invalid { .. })));
    }

    #[test]
    fn missing_header_row_is_invalid() {
        let mut rows = vec![vec![t("2 senadores a elegir")]];
        rows.extend((0..12).map(|i| vec![t("Relleno"), n(f64::from(i))]));
        let err = parse_sheet(&rows, "Distrito 4.xlsx").unwrap_err();
        assert!(
            matches!(err, LoadError::Invalid { ref district, ref msg } if district == "4" && msg.contains("Lista/Pacto"))
        );
    }

    #[test]
    fn candidate_without_number() {
        let rows = vec![
            vec![t("1 senadores a elegir")],
            header(),
            vec![t("A - Uno"), E, E, n(10.0)],
            vec![E, t("Sin Número"), E, n(10.0)],
        ];
        let d = parse_sheet(&rows, "a.xlsx").unwrap();
        let c = &d.pacts[0].candidates[0];
        assert_eq!((c.number, c.name.as_str()), (0, "Sin Número"));
    }
}
