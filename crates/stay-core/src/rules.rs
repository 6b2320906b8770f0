//! Per-country residency accounting rules.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CountryCode;

/// Key of the mandatory fallback entry in a [`RuleTable`].
pub const DEFAULT_RULE_KEY: &str = "Default";

/// Rule table construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleTableError {
    /// The table has no `"Default"` entry to fall back to.
    #[error("rule table is missing the mandatory \"{DEFAULT_RULE_KEY}\" entry")]
    MissingDefault,
}

/// Which accounting window a country's residency test uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Jan 1 through Dec 31.
    CalendarYear,
    /// A fixed 12-month period starting on a jurisdiction-specific date.
    TaxYear,
    /// Any contiguous 365-day span; the best one is evaluated.
    #[serde(rename = "rolling_12_months")]
    Rolling12Months,
}

impl WindowType {
    /// String representation used in config files and JSON output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CalendarYear => "calendar_year",
            Self::TaxYear => "tax_year",
            Self::Rolling12Months => "rolling_12_months",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WindowType {
    type Err = UnknownWindowType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calendar_year" => Ok(Self::CalendarYear),
            "tax_year" => Ok(Self::TaxYear),
            "rolling_12_months" => Ok(Self::Rolling12Months),
            _ => Err(UnknownWindowType(s.to_string())),
        }
    }
}

/// Error for an unrecognized window type string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown window type: {0}")]
pub struct UnknownWindowType(pub String);

/// One country's residency accounting policy.
///
/// `counts_weekends_holidays` and `treaty_employment_rule` are carried
/// through to output but not consulted by the day-counting algorithm;
/// they describe policy nuances the engine does not yet model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRule {
    /// Human-readable jurisdiction name, already localized by the caller.
    pub display_name: String,
    /// Days of presence at which the residency test is met (inclusive).
    pub day_threshold: u32,
    /// Which accounting window the threshold applies over.
    pub window_type: WindowType,
    /// Tax year start month (1-12). Only meaningful for [`WindowType::TaxYear`].
    #[serde(default = "default_start_unit")]
    pub tax_year_start_month: u32,
    /// Tax year start day of month (1-31). Only meaningful for [`WindowType::TaxYear`].
    #[serde(default = "default_start_unit")]
    pub tax_year_start_day: u32,
    /// Whether arrival and departure days count toward presence.
    #[serde(default)]
    pub counts_arrival_departure: bool,
    /// Whether any part of a day present counts as a full day.
    #[serde(default)]
    pub counts_partial_days: bool,
    /// Informational only; not used by counting.
    #[serde(default)]
    pub counts_weekends_holidays: bool,
    /// Informational only; not used by counting.
    #[serde(default)]
    pub treaty_employment_rule: bool,
    /// Free-form policy notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const fn default_start_unit() -> u32 {
    1
}

/// Mapping from country code (or [`DEFAULT_RULE_KEY`]) to accounting rule.
///
/// Shared-immutable: the engine never mutates a table after construction,
/// so one table may back concurrent computations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: HashMap<String, CountryRule>,
}

impl RuleTable {
    /// Builds a table, enforcing the mandatory `"Default"` entry.
    pub fn new(rules: HashMap<String, CountryRule>) -> Result<Self, RuleTableError> {
        if !rules.contains_key(DEFAULT_RULE_KEY) {
            return Err(RuleTableError::MissingDefault);
        }
        Ok(Self { rules })
    }

    /// The rule for a country, falling back to the Default entry.
    pub fn rule_for(&self, code: &CountryCode) -> &CountryRule {
        self.rules.get(code.as_str()).unwrap_or_else(|| {
            &self.rules[DEFAULT_RULE_KEY] // present by construction
        })
    }

    /// Whether the table has a specific entry for this code (no fallback).
    pub fn has_entry(&self, code: &CountryCode) -> bool {
        self.rules.contains_key(code.as_str())
    }

    /// The mandatory fallback rule.
    pub fn default_rule(&self) -> &CountryRule {
        &self.rules[DEFAULT_RULE_KEY]
    }
}
