//! Accounting-window evaluation over a country's presence day set.
//!
//! Three regimes, selected by the country rule's window type:
//! calendar-year grouping, jurisdiction-specific tax years, and the best
//! rolling 12-month span found by a two-pointer sweep.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::rules::{CountryRule, WindowType};

/// Width of a rolling 12-month window: 365 calendar days inclusive.
const ROLLING_SPAN_DAYS: u64 = 364;

/// Label used for the single rolling-window result.
const ROLLING_LABEL: &str = "Best rolling 12 months";

/// One accounting window with its day tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidencyWindow {
    /// Human-readable window label ("2024", "2024/2025", or the rolling label).
    pub label: String,
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
    /// Presence days counted inside the window.
    pub counted_days: u32,
    /// The rule's day threshold, copied for self-contained results.
    pub threshold: u32,
}

impl ResidencyWindow {
    /// Whether the counted days reach the threshold (inclusive comparison).
    pub const fn meets_threshold(&self) -> bool {
        self.counted_days >= self.threshold
    }
}

/// Evaluates the windows relevant to `rule` over a presence day set.
///
/// An empty day set yields no windows for every regime.
pub fn evaluate_windows(rule: &CountryRule, days: &BTreeSet<NaiveDate>) -> Vec<ResidencyWindow> {
    match rule.window_type {
        WindowType::CalendarYear => calendar_year_windows(rule, days),
        WindowType::TaxYear => tax_year_windows(rule, days),
        WindowType::Rolling12Months => rolling_window(rule, days),
    }
}

/// One `[Jan 1, Dec 31]` window per observed year, ascending, zero-count
/// years omitted.
fn calendar_year_windows(rule: &CountryRule, days: &BTreeSet<NaiveDate>) -> Vec<ResidencyWindow> {
    let mut by_year: std::collections::BTreeMap<i32, u32> = std::collections::BTreeMap::new();
    for day in days {
        *by_year.entry(day.year()).or_default() += 1;
    }

    by_year
        .into_iter()
        .filter_map(|(year, counted_days)| {
            let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
            Some(ResidencyWindow {
                label: year.to_string(),
                start,
                end,
                counted_days,
                threshold: rule.day_threshold,
            })
        })
        .collect()
}

/// Tax-year windows anchored to the rule's configured start date.
///
/// Candidate windows are built for every year from one before the earliest
/// observed day through one after the latest: a tax year starting
/// mid-calendar-year can contain days belonging to an adjacent calendar
/// year at either boundary, so the narrow observed-year range would miss
/// them. Zero-count candidates are dropped.
fn tax_year_windows(rule: &CountryRule, days: &BTreeSet<NaiveDate>) -> Vec<ResidencyWindow> {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Vec::new();
    };

    let mut windows = Vec::new();
    for year in (first.year() - 1)..=(last.year() + 1) {
        let start = clamped_date(year, rule.tax_year_start_month, rule.tax_year_start_day);
        let end = clamped_date(year + 1, rule.tax_year_start_month, rule.tax_year_start_day)
            - Days::new(1);

        let counted_days = count_in(days, start, end);
        if counted_days == 0 {
            continue;
        }

        let label = if start.year() == end.year() {
            start.year().to_string()
        } else {
            format!("{}/{}", start.year(), end.year())
        };
        windows.push(ResidencyWindow {
            label,
            start,
            end,
            counted_days,
            threshold: rule.day_threshold,
        });
    }
    windows
}

/// The single 365-day window holding the most presence days.
///
/// Two-pointer sweep over the sorted day set: for each candidate start
/// index `i`, the end pointer `j` advances while the span from the `i`-th
/// day stays within 364 days, giving `j - i` days in the window. Only a
/// strictly greater count replaces the best, so the earliest start wins
/// ties. The reported end is the start plus 364 days, clamped to the last
/// observed day when that is earlier.
fn rolling_window(rule: &CountryRule, days: &BTreeSet<NaiveDate>) -> Vec<ResidencyWindow> {
    let sorted: Vec<NaiveDate> = days.iter().copied().collect();
    let Some(last) = sorted.last().copied() else {
        return Vec::new();
    };

    let mut best_start = sorted[0];
    let mut best_count = 0usize;
    let mut j = 0usize;
    for i in 0..sorted.len() {
        while j < sorted.len() && within_span(sorted[i], sorted[j]) {
            j += 1;
        }
        let count = j - i;
        if count > best_count {
            best_count = count;
            best_start = sorted[i];
        }
    }

    let end = (best_start + Days::new(ROLLING_SPAN_DAYS)).min(last);
    vec![ResidencyWindow {
        label: ROLLING_LABEL.to_string(),
        start: best_start,
        end,
        counted_days: to_u32(best_count),
        threshold: rule.day_threshold,
    }]
}

fn within_span(start: NaiveDate, day: NaiveDate) -> bool {
    (day - start).num_days() <= i64::try_from(ROLLING_SPAN_DAYS).unwrap_or(i64::MAX)
}

fn count_in(days: &BTreeSet<NaiveDate>, start: NaiveDate, end: NaiveDate) -> u32 {
    to_u32(days.range(start..=end).count())
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Builds a date from rule-configured month/day, clamping the day downward
/// to the month's last valid day (a Feb 29 start exists only in leap years).
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let month = month.clamp(1, 12);
    let mut day = day.clamp(1, 31);
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return date;
        }
        day -= 1;
    }
}
