//! Report command: residency threshold evaluation per country.
//!
//! With `--traveler` it reports a single traveler; otherwise every
//! recorded traveler gets an independent section. `--json` emits the raw
//! summary structures for downstream tooling.

use std::fmt::Write;

use anyhow::{Context, Result};

use stay_core::{
    CountryCode, CountryResidency, DateRange, ResidencyEngine, ResidencySummary, TravelerId,
    TravelerSummary,
};
use stay_db::Database;

pub fn run(
    db: &Database,
    engine: &ResidencyEngine,
    traveler: Option<&str>,
    starting_country: Option<&str>,
    range: Option<DateRange>,
    json: bool,
) -> Result<()> {
    let starting = starting_country
        .map(CountryCode::new)
        .transpose()
        .context("invalid starting country")?;

    if let Some(traveler) = traveler {
        let traveler = TravelerId::new(traveler).context("invalid traveler")?;
        let legs = db.legs_for_traveler(&traveler)?;
        let summary = engine.compute(&legs, starting.as_ref(), range);
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print!("{}", format_summary(&summary));
        }
        return Ok(());
    }

    let legs = db.all_legs()?;
    let summaries = engine.compute_per_traveler(&legs, &std::collections::BTreeMap::new(), range);
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", format_traveler_summaries(&summaries));
    }
    Ok(())
}

/// Formats one summary as a human-readable table.
pub fn format_summary(summary: &ResidencySummary) -> String {
    let mut output = String::new();

    if summary.results.is_empty() {
        writeln!(output, "No travel legs recorded.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: pipe JSONL legs into 'stay import'.").unwrap();
        return output;
    }

    for result in &summary.results {
        writeln!(output, "{}", format_country_header(result)).unwrap();
        for window in &result.windows {
            let marker = if window.meets_threshold() { "*" } else { " " };
            writeln!(
                output,
                "  {marker} {:<24} {} .. {}  {:>4} days",
                window.label, window.start, window.end, window.counted_days
            )
            .unwrap();
        }
    }
    writeln!(output).unwrap();
    writeln!(output, "* meets residency threshold").unwrap();
    output
}

fn format_country_header(result: &CountryResidency) -> String {
    format!(
        "{}  {}  [{}, threshold {}]",
        result.country,
        result.country_name,
        result.rule.window_type,
        result.rule.day_threshold
    )
}

/// Formats grouped per-traveler summaries.
pub fn format_traveler_summaries(summaries: &[TravelerSummary]) -> String {
    let mut output = String::new();

    if summaries.is_empty() {
        writeln!(output, "No travel legs recorded.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: pipe JSONL legs into 'stay import'.").unwrap();
        return output;
    }

    for (idx, entry) in summaries.iter().enumerate() {
        if idx > 0 {
            writeln!(output).unwrap();
        }
        writeln!(output, "TRAVELER: {}", entry.traveler).unwrap();
        write!(output, "{}", format_summary(&entry.summary)).unwrap();
    }
    output
}
