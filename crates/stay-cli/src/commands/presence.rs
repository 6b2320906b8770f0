//! Presence command: raw per-country day tallies without threshold
//! evaluation, for drilling into where a report's counts came from.

use std::fmt::Write;

use anyhow::{Context, Result, bail};

use stay_core::{DateRange, PresenceMap, ResidencyEngine, TravelerId};
use stay_db::Database;

pub fn run(
    db: &Database,
    engine: &ResidencyEngine,
    traveler: Option<&str>,
    range: Option<DateRange>,
    json: bool,
) -> Result<()> {
    let traveler = resolve_traveler(db, traveler)?;
    let legs = db.legs_for_traveler(&traveler)?;
    let presence = engine.presence_by_country(&legs, None, range);

    if json {
        println!("{}", serde_json::to_string_pretty(&presence)?);
    } else {
        print!("{}", format_presence(&traveler, &presence));
    }
    Ok(())
}

/// Picks the traveler to inspect: the flag if given, else the only
/// recorded traveler, else an error naming the ambiguity.
fn resolve_traveler(db: &Database, traveler: Option<&str>) -> Result<TravelerId> {
    if let Some(traveler) = traveler {
        return TravelerId::new(traveler).context("invalid traveler");
    }
    let mut travelers = db.travelers()?;
    match travelers.len() {
        0 => bail!("no travel legs recorded"),
        1 => {
            let (only, _) = travelers.remove(0);
            TravelerId::new(only).context("invalid traveler in store")
        }
        n => bail!("{n} travelers recorded; pass --traveler to pick one"),
    }
}

fn format_presence(traveler: &TravelerId, presence: &PresenceMap) -> String {
    let mut output = String::new();
    writeln!(output, "PRESENCE DAYS: {traveler}").unwrap();

    if presence.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No presence days in the analysis range.").unwrap();
        return output;
    }

    for (country, days) in presence {
        // Non-empty by construction: a country only appears once credited.
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            continue;
        };
        writeln!(
            output,
            "  {country}  {:>4} days  ({first} .. {last})",
            days.len()
        )
        .unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    use stay_core::CountryCode;
    use stay_db::LegRecord;

    fn seeded_db(travelers: &[&str]) -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let records: Vec<LegRecord> = travelers
            .iter()
            .enumerate()
            .map(|(idx, traveler)| LegRecord {
                id: format!("leg-{idx}"),
                traveler: (*traveler).to_string(),
                departed_at: "2024-03-01T08:30:00Z".to_string(),
                from_country: "GB".to_string(),
                to_country: "DE".to_string(),
            })
            .collect();
        db.insert_legs(&records).unwrap();
        db
    }

    #[test]
    fn resolve_traveler_uses_single_recorded() {
        let db = seeded_db(&["alice"]);
        let traveler = resolve_traveler(&db, None).unwrap();
        assert_eq!(traveler.as_str(), "alice");
    }

    #[test]
    fn resolve_traveler_requires_flag_when_ambiguous() {
        let db = seeded_db(&["alice", "bob"]);
        let err = resolve_traveler(&db, None).unwrap_err();
        assert!(err.to_string().contains("pass --traveler"));

        let traveler = resolve_traveler(&db, Some("bob")).unwrap();
        assert_eq!(traveler.as_str(), "bob");
    }

    #[test]
    fn resolve_traveler_errors_on_empty_store() {
        let db = Database::open_in_memory().unwrap();
        assert!(resolve_traveler(&db, None).is_err());
    }

    #[test]
    fn format_presence_lists_counts_and_span() {
        let mut presence = PresenceMap::new();
        let mut days = BTreeSet::new();
        days.insert(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        days.insert(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        presence.insert(CountryCode::new("DE").unwrap(), days);

        let output = format_presence(&TravelerId::new("alice").unwrap(), &presence);
        assert!(output.contains("PRESENCE DAYS: alice"));
        assert!(output.contains("DE"));
        assert!(output.contains("2 days"));
        assert!(output.contains("(2024-03-01 .. 2024-03-02)"));
    }
}
