//! Summary assembly: orchestrating presence building and window
//! evaluation across every observed country, per traveler.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, Utc};
use serde::Serialize;

use crate::leg::TravelLeg;
use crate::presence::{DateRange, PresenceMap, build_presence};
use crate::rules::{CountryRule, RuleTable};
use crate::types::{CountryCode, TravelerId};
use crate::window::{ResidencyWindow, evaluate_windows};

/// How far the observed leg span is widened on each side when the caller
/// supplies no explicit analysis range. Generous on purpose: the rolling
/// 12-month evaluator needs context past the observed dates to find true
/// maxima.
const RANGE_PADDING_DAYS: u64 = 400;

/// One country's residency evaluation: its resolved rule and the windows
/// computed under that rule's regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryResidency {
    /// The country the presence days belong to.
    pub country: CountryCode,
    /// Display name from the rule table entry, or the code itself when the
    /// country fell back to the Default rule.
    pub country_name: String,
    /// The rule the windows were evaluated under (Default fallback included).
    pub rule: CountryRule,
    /// Windows in the rule's regime, ascending by start.
    pub windows: Vec<ResidencyWindow>,
}

impl CountryResidency {
    /// Whether any window reaches the rule's threshold.
    pub fn meets_any_threshold(&self) -> bool {
        self.windows.iter().any(ResidencyWindow::meets_threshold)
    }
}

/// The result of one residency computation.
#[derive(Debug, Clone, Serialize)]
pub struct ResidencySummary {
    /// Wall-clock time the summary was produced.
    pub generated_at: DateTime<Utc>,
    /// Per-country results: threshold-meeting countries first, then
    /// ascending by country code within each group.
    pub results: Vec<CountryResidency>,
}

/// A residency summary for one traveler out of a mixed leg list.
#[derive(Debug, Clone, Serialize)]
pub struct TravelerSummary {
    pub traveler: TravelerId,
    pub summary: ResidencySummary,
}

/// The residency computation engine.
///
/// Stateless between calls: every `compute` takes an input snapshot and
/// returns a result snapshot. The rule table is read-only after
/// construction, so one engine may serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ResidencyEngine {
    rules: RuleTable,
}

impl ResidencyEngine {
    /// Creates an engine over a rule table.
    ///
    /// The table's mandatory Default entry has already been enforced by
    /// [`RuleTable::new`]; an engine cannot exist without one.
    pub const fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    /// The rule table backing this engine.
    pub const fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Computes the residency summary for one traveler's legs.
    ///
    /// When `range` is absent, the observed leg span widened by
    /// [`RANGE_PADDING_DAYS`] on each side is used. An empty leg list
    /// yields an empty summary with a fresh timestamp.
    pub fn compute(
        &self,
        legs: &[TravelLeg],
        starting_country: Option<&CountryCode>,
        range: Option<DateRange>,
    ) -> ResidencySummary {
        let generated_at = Utc::now();
        let presence = self.presence_by_country(legs, starting_country, range);

        let mut results: Vec<CountryResidency> = presence
            .iter()
            .map(|(country, days)| {
                let rule = self.rules.rule_for(country);
                let country_name = if self.rules.has_entry(country) {
                    rule.display_name.clone()
                } else {
                    country.as_str().to_string()
                };
                CountryResidency {
                    country: country.clone(),
                    country_name,
                    rule: rule.clone(),
                    windows: evaluate_windows(rule, days),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.meets_any_threshold()
                .cmp(&a.meets_any_threshold())
                .then_with(|| a.country.cmp(&b.country))
        });

        tracing::debug!(
            countries = results.len(),
            legs = legs.len(),
            "computed residency summary"
        );
        ResidencySummary {
            generated_at,
            results,
        }
    }

    /// Computes independent summaries for every traveler in a mixed leg
    /// list, ascending by traveler ID.
    ///
    /// Each traveler gets their own presence map; one traveler's
    /// starting-country override never affects another's.
    pub fn compute_per_traveler(
        &self,
        legs: &[TravelLeg],
        starting_countries: &BTreeMap<TravelerId, CountryCode>,
        range: Option<DateRange>,
    ) -> Vec<TravelerSummary> {
        let mut by_traveler: BTreeMap<TravelerId, Vec<TravelLeg>> = BTreeMap::new();
        for leg in legs {
            by_traveler
                .entry(leg.traveler.clone())
                .or_default()
                .push(leg.clone());
        }

        by_traveler
            .into_iter()
            .map(|(traveler, traveler_legs)| {
                let starting = starting_countries.get(&traveler);
                let summary = self.compute(&traveler_legs, starting, range);
                TravelerSummary { traveler, summary }
            })
            .collect()
    }

    /// Raw per-country presence day sets, for callers needing day tallies
    /// without threshold evaluation (drill-down views).
    pub fn presence_by_country(
        &self,
        legs: &[TravelLeg],
        starting_country: Option<&CountryCode>,
        range: Option<DateRange>,
    ) -> PresenceMap {
        let Some(range) = range.or_else(|| default_range(legs)) else {
            return PresenceMap::new();
        };
        build_presence(legs, &self.rules, starting_country, range)
    }
}

/// Observed leg-day span widened on both sides, or `None` for no legs.
fn default_range(legs: &[TravelLeg]) -> Option<DateRange> {
    let first = legs.iter().map(TravelLeg::day).min()?;
    let last = legs.iter().map(TravelLeg::day).max()?;
    Some(DateRange::new(
        first - Days::new(RANGE_PADDING_DAYS),
        last + Days::new(RANGE_PADDING_DAYS),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use std::collections::HashMap;

    use crate::rules::tests::default_rule;
    use crate::rules::{DEFAULT_RULE_KEY, WindowType};

    fn code(s: &str) -> CountryCode {
        CountryCode::new(s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leg_for(traveler: &str, y: i32, m: u32, d: u32, from: &str, to: &str) -> TravelLeg {
        TravelLeg {
            departed_at: Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
            from: code(from),
            to: code(to),
            traveler: TravelerId::new(traveler).unwrap(),
        }
    }

    fn engine() -> ResidencyEngine {
        let mut rules = HashMap::new();
        rules.insert(DEFAULT_RULE_KEY.to_string(), default_rule());
        rules.insert(
            "GB".to_string(),
            CountryRule {
                display_name: "United Kingdom".to_string(),
                window_type: WindowType::TaxYear,
                tax_year_start_month: 4,
                tax_year_start_day: 6,
                ..default_rule()
            },
        );
        ResidencyEngine::new(RuleTable::new(rules).unwrap())
    }

    fn full_year_2024() -> DateRange {
        DateRange::new(day(2024, 1, 1), day(2024, 12, 31))
    }

    #[test]
    fn empty_legs_yield_empty_summary() {
        let summary = engine().compute(&[], None, None);
        assert!(summary.results.is_empty());
    }

    #[test]
    fn single_leg_year_summary() {
        // One leg AA -> BB on 2024-03-01 over the full calendar year:
        // AA holds Jan 1 - Mar 1 (61 days, 2024 is a leap year), BB holds
        // Mar 1 - Dec 31 (306 days) and crosses the 183-day threshold.
        let legs = vec![leg_for("alice", 2024, 3, 1, "AA", "BB")];
        let summary = engine().compute(&legs, Some(&code("AA")), Some(full_year_2024()));

        assert_eq!(summary.results.len(), 2);

        // BB meets the threshold, so it sorts first despite "AA" < "BB".
        let bb = &summary.results[0];
        assert_eq!(bb.country.as_str(), "BB");
        assert!(bb.meets_any_threshold());
        assert_eq!(bb.windows.len(), 1);
        assert_eq!(bb.windows[0].label, "2024");
        assert_eq!(bb.windows[0].counted_days, 306);

        let aa = &summary.results[1];
        assert_eq!(aa.country.as_str(), "AA");
        assert!(!aa.meets_any_threshold());
        assert_eq!(aa.windows[0].counted_days, 61);
    }

    #[test]
    fn unknown_country_falls_back_to_default_rule() {
        let legs = vec![leg_for("alice", 2024, 3, 1, "AA", "BB")];
        let summary = engine().compute(&legs, None, Some(full_year_2024()));

        let aa = summary
            .results
            .iter()
            .find(|r| r.country.as_str() == "AA")
            .unwrap();
        assert_eq!(aa.rule, default_rule());
        // No specific entry: the name is just the code.
        assert_eq!(aa.country_name, "AA");
    }

    #[test]
    fn known_country_uses_its_entry_and_display_name() {
        let legs = vec![leg_for("alice", 2024, 5, 1, "GB", "GB")];
        let summary = engine().compute(&legs, None, Some(full_year_2024()));

        let gb = &summary.results[0];
        assert_eq!(gb.country_name, "United Kingdom");
        assert_eq!(gb.rule.window_type, WindowType::TaxYear);
        assert!(gb.windows.iter().any(|w| w.label == "2024/2025"));
    }

    #[test]
    fn results_ordered_threshold_first_then_code() {
        // alice sits in CC all year after a quick AA -> BB -> CC hop, so
        // only CC meets the threshold.
        let legs = vec![
            leg_for("alice", 2024, 1, 10, "AA", "BB"),
            leg_for("alice", 2024, 1, 20, "BB", "CC"),
        ];
        let summary = engine().compute(&legs, None, Some(full_year_2024()));

        let order: Vec<_> = summary
            .results
            .iter()
            .map(|r| (r.country.as_str().to_string(), r.meets_any_threshold()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("CC".to_string(), true),
                ("AA".to_string(), false),
                ("BB".to_string(), false),
            ]
        );
    }

    #[test]
    fn compute_is_idempotent_modulo_timestamp() {
        let legs = vec![
            leg_for("alice", 2024, 3, 1, "AA", "BB"),
            leg_for("alice", 2024, 9, 15, "BB", "AA"),
        ];
        let eng = engine();
        let first = eng.compute(&legs, None, Some(full_year_2024()));
        let second = eng.compute(&legs, None, Some(full_year_2024()));
        assert_eq!(first.results, second.results);
    }

    #[test]
    fn adding_presence_never_decreases_a_countrys_count() {
        let eng = engine();
        let base = vec![leg_for("alice", 2024, 3, 1, "AA", "BB")];
        let before = eng.compute(&base, None, Some(full_year_2024()));

        // A return to AA in June only adds AA days; AA's count must not
        // shrink in any window.
        let mut extended = base;
        extended.push(leg_for("alice", 2024, 6, 1, "BB", "AA"));
        let after = eng.compute(&extended, None, Some(full_year_2024()));

        let count = |summary: &ResidencySummary| {
            summary
                .results
                .iter()
                .find(|r| r.country.as_str() == "AA")
                .map_or(0, |r| r.windows.iter().map(|w| w.counted_days).sum::<u32>())
        };
        assert!(count(&after) >= count(&before));
    }

    #[test]
    fn default_range_widens_observed_span() {
        let legs = vec![leg_for("alice", 2024, 3, 1, "AA", "BB")];
        let range = default_range(&legs).unwrap();
        assert_eq!(range.start, day(2024, 3, 1) - Days::new(400));
        assert_eq!(range.end, day(2024, 3, 1) + Days::new(400));
        assert!(default_range(&[]).is_none());
    }

    #[test]
    fn per_traveler_summaries_are_independent_and_sorted() {
        let legs = vec![
            leg_for("bob", 2024, 3, 1, "AA", "BB"),
            leg_for("alice", 2024, 3, 1, "CC", "DD"),
        ];
        let mut overrides = BTreeMap::new();
        overrides.insert(TravelerId::new("alice").unwrap(), code("CC"));

        let summaries =
            engine().compute_per_traveler(&legs, &overrides, Some(full_year_2024()));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].traveler.as_str(), "alice");
        assert_eq!(summaries[1].traveler.as_str(), "bob");

        // alice's override and legs never leak into bob's results.
        let alice_codes: Vec<_> = summaries[0]
            .summary
            .results
            .iter()
            .map(|r| r.country.as_str().to_string())
            .collect();
        assert!(alice_codes.contains(&"CC".to_string()));
        assert!(!alice_codes.contains(&"AA".to_string()));
    }

    #[test]
    fn presence_query_matches_summary_counts() {
        let eng = engine();
        let legs = vec![leg_for("alice", 2024, 3, 1, "AA", "BB")];
        let range = Some(full_year_2024());

        let presence = eng.presence_by_country(&legs, None, range);
        let summary = eng.compute(&legs, None, range);

        for result in &summary.results {
            let total: u32 = result.windows.iter().map(|w| w.counted_days).sum();
            let raw = u32::try_from(presence[&result.country].len()).unwrap();
            assert_eq!(total, raw);
        }
    }
}
