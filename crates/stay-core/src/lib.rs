//! Residency day-count computation engine.
//!
//! This crate reconstructs a complete day-by-day presence timeline from a
//! sparse sequence of flight legs, then evaluates each country's presence
//! against its residency threshold rule under three accounting regimes:
//! - Presence building: attributing every calendar day to countries,
//!   honoring per-country travel-day policy
//! - Window evaluation: calendar-year, tax-year, and best rolling
//!   12-month windows with day tallies
//! - Summary assembly: per-country (and per-traveler) result packaging
//!
//! The engine is pure and synchronous: it performs no I/O, holds no state
//! between calls, and uses a single reference time zone (UTC) for day
//! boundaries. Callers supply legs and a rule table; persistence and
//! presentation live elsewhere.

mod leg;
mod presence;
mod rules;
mod summary;
mod types;
mod window;

pub use leg::TravelLeg;
pub use presence::{DateRange, PresenceMap, build_presence};
pub use rules::{
    CountryRule, DEFAULT_RULE_KEY, RuleTable, RuleTableError, UnknownWindowType, WindowType,
};
pub use summary::{CountryResidency, ResidencyEngine, ResidencySummary, TravelerSummary};
pub use types::{CountryCode, TravelerId, ValidationError};
pub use window::{ResidencyWindow, evaluate_windows};
