//! Import command for ingesting travel legs into the local `SQLite` store.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use stay_core::{CountryCode, TravelerId};
use stay_db::{Database, LegRecord};

pub fn run(db: &mut Database, default_traveler: Option<&str>) -> Result<usize> {
    let stdin = io::stdin();
    let legs = parse_legs(stdin.lock(), default_traveler)?;
    let inserted = db.insert_legs(&legs)?;
    tracing::debug!(parsed = legs.len(), inserted, "imported legs");
    Ok(inserted)
}

fn parse_legs<R: BufRead>(reader: R, default_traveler: Option<&str>) -> Result<Vec<LegRecord>> {
    let mut legs = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportLeg = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let record = parsed
            .into_record(default_traveler)
            .with_context(|| format!("invalid leg on line {}", idx + 1))?;
        legs.push(record);
    }
    Ok(legs)
}

#[derive(Debug, Deserialize)]
struct ImportLeg {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    traveler: Option<String>,
    departed_at: String,
    from: String,
    to: String,
}

impl ImportLeg {
    /// Validates one incoming leg into a storable record.
    ///
    /// Country codes and timestamps are checked here, at the boundary, so
    /// the engine downstream only ever sees well-formed legs.
    fn into_record(self, default_traveler: Option<&str>) -> Result<LegRecord> {
        let traveler = match self.traveler {
            Some(traveler) if !traveler.trim().is_empty() => traveler,
            _ => default_traveler
                .map(str::to_string)
                .filter(|val| !val.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing traveler"))?,
        };
        let traveler = TravelerId::new(traveler).context("invalid traveler")?;

        let departed_at: DateTime<Utc> = self
            .departed_at
            .parse()
            .with_context(|| format!("invalid timestamp: {}", self.departed_at))?;

        let from = CountryCode::new(self.from).context("invalid departure country")?;
        let to = CountryCode::new(self.to).context("invalid arrival country")?;

        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        Ok(LegRecord {
            id,
            traveler: traveler.as_str().to_string(),
            departed_at: departed_at.to_rfc3339(),
            from_country: from.as_str().to_string(),
            to_country: to.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn parse_legs_uses_default_traveler() {
        let input =
            r#"{"departed_at":"2024-03-01T08:30:00Z","from":"gb","to":"DE","id":"leg-1"}"#;
        let legs = parse_legs(Cursor::new(input), Some("alice")).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].traveler, "alice");
        assert_eq!(legs[0].from_country, "GB"); // uppercased at the boundary
        assert_eq!(legs[0].id, "leg-1");
    }

    #[test]
    fn parse_legs_generates_ids_when_missing() {
        let input = r#"{"traveler":"bob","departed_at":"2024-03-01T08:30:00Z","from":"GB","to":"DE"}"#;
        let legs = parse_legs(Cursor::new(input), None).unwrap();
        assert!(!legs[0].id.is_empty());
    }

    #[test]
    fn parse_legs_rejects_missing_traveler() {
        let input = r#"{"departed_at":"2024-03-01T08:30:00Z","from":"GB","to":"DE"}"#;
        let err = parse_legs(Cursor::new(input), None).unwrap_err();
        assert!(err.to_string().contains("invalid leg on line 1"));
    }

    #[test]
    fn parse_legs_rejects_bad_timestamp() {
        let input = r#"{"traveler":"bob","departed_at":"yesterday","from":"GB","to":"DE"}"#;
        let err = parse_legs(Cursor::new(input), None).unwrap_err();
        assert!(format!("{err:#}").contains("invalid timestamp"));
    }

    #[test]
    fn parse_legs_skips_blank_lines() {
        let input = "\n\n{\"traveler\":\"bob\",\"departed_at\":\"2024-03-01T08:30:00Z\",\"from\":\"GB\",\"to\":\"DE\"}\n\n";
        let legs = parse_legs(Cursor::new(input), None).unwrap();
        assert_eq!(legs.len(), 1);
    }
}
