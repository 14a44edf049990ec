//! Plain-text renderer (stdout report).
//!
//! Section order per district: pact table → official allocation → scenario
//! allocation → official winners → scenario winners → merged breakdown →
//! merged seats and indifference loss. The consolidated summary comes last.

use std::fmt;

use crate::{
    group_thousands, percent_2dp, signed, CodeSeats, DistrictSection, ReportModel,
    ScenarioSection, SeatLine, WinnerLine,
};

/// Render the whole report.
pub fn render_text(model: &ReportModel) -> String {
    TextReport(model).to_string()
}

struct TextReport<'a>(&'a ReportModel);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        for d in &m.districts {
            district(f, d, &m.pact_codes)?;
        }
        summary(f, m)
    }
}

fn district(f: &mut fmt::Formatter<'_>, d: &DistrictSection, codes: &[String]) -> fmt::Result {
    writeln!(f, "\n=== {} ({} seats) ===", d.label, d.seats)?;
    writeln!(f, "Pacts:")?;
    for p in &d.pacts {
        writeln!(
            f,
            " - {}: {} ({} votes, {} candidates)",
            p.code,
            p.name,
            group_thousands(p.votes),
            p.candidates
        )?;
    }
    if !d.reported_mismatch.is_empty() {
        writeln!(
            f,
            "Note: reported seats differ from the recomputed allocation for {}",
            d.reported_mismatch.join(", ")
        )?;
    }

    let Some(s) = &d.scenario else {
        let reason = d.skipped.as_deref().unwrap_or("no scenario");
        return writeln!(f, "\nScenario not applicable: {reason}");
    };

    writeln!(f, "\n> Official allocation:")?;
    allocation(f, &d.official)?;
    writeln!(f, "\n> Scenario merging {}:", codes.join(" + "))?;
    allocation(f, &s.allocation)?;

    winners(f, "Official winners", &d.official_winners)?;
    winners(f, "Scenario winners", &s.winners)?;
    breakdown(f, s)?;

    writeln!(
        f,
        "\nMerged seats: {} -> {} ({})",
        s.baseline_seats,
        s.scenario_seats,
        signed(s.delta)
    )?;
    if let Some(loss) = s.indifference_loss {
        writeln!(f, "Indifference loss: {}", percent_2dp(loss))?;
    }
    Ok(())
}

fn allocation(f: &mut fmt::Formatter<'_>, lines: &[SeatLine]) -> fmt::Result {
    if lines.is_empty() {
        return writeln!(f, "   No seats allocated");
    }
    for l in lines {
        writeln!(
            f,
            "   {}: {} -> {} seats ({} votes)",
            l.code,
            l.name,
            l.seats,
            group_thousands(l.votes)
        )?;
    }
    Ok(())
}

fn candidates(line: &WinnerLine) -> String {
    line.candidates
        .iter()
        .map(|c| format!("{} ({} votes)", c.name, group_thousands(c.votes)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn winners(f: &mut fmt::Formatter<'_>, title: &str, lines: &[WinnerLine]) -> fmt::Result {
    writeln!(f, "\n{title}:")?;
    if lines.is_empty() {
        return writeln!(f, "   (none)");
    }
    for l in lines {
        writeln!(f, "   {}: {}", l.code, candidates(l))?;
    }
    Ok(())
}

fn breakdown(f: &mut fmt::Formatter<'_>, s: &ScenarioSection) -> fmt::Result {
    if s.breakdown.is_empty() {
        return Ok(());
    }
    writeln!(f, "      Breakdown of {}:", s.merged_code)?;
    for l in &s.breakdown {
        writeln!(f, "         - {}: {}", l.code, candidates(l))?;
    }
    Ok(())
}

fn seat_block(f: &mut fmt::Formatter<'_>, title: &str, rows: &[CodeSeats]) -> fmt::Result {
    writeln!(f, "\n{title}:")?;
    if rows.is_empty() {
        return writeln!(f, "   (no data)");
    }
    for r in rows {
        writeln!(f, "   {}: {} seats", r.code, r.seats)?;
    }
    Ok(())
}

fn summary(f: &mut fmt::Formatter<'_>, m: &ReportModel) -> fmt::Result {
    let s = &m.summary;
    if !m.unchanged_hidden.is_empty() {
        writeln!(
            f,
            "\nUnchanged districts (use --show-unchanged to list): {}",
            m.unchanged_hidden.join(", ")
        )?;
    }
    if s.districts_simulated == 0 {
        return writeln!(f, "\nNo district could be simulated.");
    }

    writeln!(f, "\n=== Consolidated summary ===")?;
    writeln!(
        f,
        "Districts: {} simulated, {} skipped, {} changed",
        s.districts_simulated, s.districts_skipped, s.districts_changed
    )?;
    seat_block(f, "Official allocation", &s.official)?;
    seat_block(f, "Unified scenario", &s.scenario)?;

    writeln!(f, "\nSeat changes:")?;
    for d in &s.deltas {
        writeln!(f, "   {}: {} -> {} ({})", d.code, d.official, d.scenario, signed(d.delta))?;
    }
    writeln!(
        f,
        "\nMerged pact seats: {} -> {} ({})",
        s.baseline_merged_seats,
        s.scenario_merged_seats,
        signed(i64::from(s.scenario_merged_seats) - i64::from(s.baseline_merged_seats))
    )?;
    if let Some(loss) = s.indifference_loss {
        writeln!(f, "National indifference loss: {}", percent_2dp(loss))?;
    }

    if !m.inputs.is_empty() {
        writeln!(f, "\nInputs:")?;
        for i in &m.inputs {
            writeln!(f, "   {}  {}", i.sha256, i.path)?;
        }
    }
    Ok(())
}
