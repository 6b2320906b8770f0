//! Presence attribution: turning sparse travel legs into per-country day sets.
//!
//! # Algorithm Summary
//!
//! 1. Sort legs by timestamp and group them by calendar day
//! 2. Walk every day of the analysis range, carrying the current country
//! 3. On travel days, apply the travel-day crediting policy per leg, then
//!    credit the day's final arrival country unless already credited

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::leg::TravelLeg;
use crate::rules::{CountryRule, RuleTable};
use crate::types::CountryCode;

/// An inclusive range of calendar days in the reference time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, normalizing an inverted pair.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Whether the day falls inside the range (inclusive on both ends).
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Iterates every day of the range in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Mapping from country code to the set of days the traveler was present.
pub type PresenceMap = BTreeMap<CountryCode, BTreeSet<NaiveDate>>;

/// Travel-day crediting policy.
///
/// A country is credited for a travel day the moment a leg touches it
/// (either side of the flight, independently) when its rule counts
/// arrival/departure days AND counts partial days as full days.
pub(crate) const fn credits_travel_day(rule: &CountryRule) -> bool {
    rule.counts_arrival_departure && rule.counts_partial_days
}

/// Builds the per-country presence day sets for one traveler's legs.
///
/// Legs are sorted defensively by timestamp (stable, so equal timestamps
/// keep their input order). The starting country is the override if given,
/// else the departure country of the first leg. Each day of `range` is
/// attributed:
///
/// - no legs that day: the whole day goes to the current country
/// - one or more legs: each touched country satisfying the travel-day
///   policy is credited; afterwards the day's final arrival country is
///   credited unless the policy already covered it, and it becomes the
///   current country
///
/// A day may be credited to several countries (multi-leg travel days) or,
/// when no current country is resolved, to none. An empty leg list yields
/// an empty map without walking any days.
pub fn build_presence(
    legs: &[TravelLeg],
    rules: &RuleTable,
    starting_country: Option<&CountryCode>,
    range: DateRange,
) -> PresenceMap {
    let mut presence = PresenceMap::new();
    if legs.is_empty() {
        return presence;
    }

    let mut sorted: Vec<&TravelLeg> = legs.iter().collect();
    sorted.sort_by_key(|leg| leg.departed_at);

    let mut legs_by_day: BTreeMap<NaiveDate, Vec<&TravelLeg>> = BTreeMap::new();
    for leg in &sorted {
        legs_by_day.entry(leg.day()).or_default().push(*leg);
    }

    let mut current: Option<CountryCode> = starting_country
        .cloned()
        .or_else(|| sorted.first().map(|leg| leg.from.clone()));

    for day in range.days() {
        match legs_by_day.get(&day) {
            None => {
                if let Some(country) = &current {
                    credit(&mut presence, country, day);
                }
            }
            Some(day_legs) => {
                for leg in day_legs {
                    if credits_travel_day(rules.rule_for(&leg.from)) {
                        credit(&mut presence, &leg.from, day);
                    }
                    if credits_travel_day(rules.rule_for(&leg.to)) {
                        credit(&mut presence, &leg.to, day);
                    }
                }
                // The last arrival of the day is where the traveler sleeps.
                // Credit it once: either via the policy above or here.
                if let Some(last) = day_legs.last() {
                    if !credits_travel_day(rules.rule_for(&last.to)) {
                        credit(&mut presence, &last.to, day);
                    }
                    current = Some(last.to.clone());
                }
            }
        }
    }

    presence
}

fn credit(presence: &mut PresenceMap, country: &CountryCode, day: NaiveDate) {
    presence.entry(country.clone()).or_default().insert(day);
}
