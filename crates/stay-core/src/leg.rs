//! Travel leg records from external record sources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CountryCode, TravelerId};

/// A single flight segment.
///
/// Legs are immutable values handed in by a record store or import layer;
/// the engine does not care whether they came from scanned boarding passes
/// or manual entry. Multiple legs may share a calendar day (connections).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelLeg {
    /// Departure timestamp, in the reference time zone (UTC).
    pub departed_at: DateTime<Utc>,
    /// Departure country.
    pub from: CountryCode,
    /// Arrival country.
    pub to: CountryCode,
    /// Whose history this leg belongs to.
    pub traveler: TravelerId,
}

impl TravelLeg {
    /// The calendar day the leg occurs on, in the reference time zone.
    pub fn day(&self) -> NaiveDate {
        self.departed_at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn leg_day_strips_time_of_day() {
        let leg = TravelLeg {
            departed_at: Utc.with_ymd_and_hms(2024, 3, 1, 23, 45, 0).unwrap(),
            from: CountryCode::new("DE").unwrap(),
            to: CountryCode::new("FR").unwrap(),
            traveler: TravelerId::new("alice").unwrap(),
        };
        assert_eq!(leg.day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn leg_serde_roundtrip() {
        let leg = TravelLeg {
            departed_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
            from: CountryCode::new("de").unwrap(),
            to: CountryCode::new("FR").unwrap(),
            traveler: TravelerId::new("alice").unwrap(),
        };
        let json = serde_json::to_string(&leg).unwrap();
        let parsed: TravelLeg = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, leg);
        assert_eq!(parsed.from.as_str(), "DE");
    }

    #[test]
    fn leg_serde_rejects_empty_country() {
        let json = r#"{
            "departed_at": "2024-03-01T08:30:00Z",
            "from": "",
            "to": "FR",
            "traveler": "alice"
        }"#;
        let result: Result<TravelLeg, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
