//! Rule table loading.
//!
//! Rule tables live in TOML under a `[countries.*]` table per entry:
//!
//! ```toml
//! [countries.Default]
//! display_name = "Default"
//! day_threshold = 183
//! window_type = "calendar_year"
//! counts_arrival_departure = true
//! counts_partial_days = true
//!
//! [countries.GB]
//! display_name = "United Kingdom"
//! day_threshold = 183
//! window_type = "tax_year"
//! tax_year_start_month = 4
//! tax_year_start_day = 6
//! ```
//!
//! Without a configured file, a built-in table of common jurisdictions
//! applies.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Format, Toml};
use serde::Deserialize;

use stay_core::{CountryRule, DEFAULT_RULE_KEY, RuleTable, WindowType};

#[derive(Debug, Deserialize)]
struct RulesFile {
    countries: HashMap<String, CountryRule>,
}

/// Loads the rule table from a TOML file, or the built-in table when no
/// path is configured.
///
/// A configured table missing its `"Default"` entry is a startup error;
/// the engine refuses to run with a partial table.
pub fn load_rule_table(path: Option<&Path>) -> Result<RuleTable> {
    let Some(path) = path else {
        return Ok(builtin_rule_table());
    };
    let file: RulesFile = Figment::from(Toml::file_exact(path))
        .extract()
        .with_context(|| format!("failed to load rule table from {}", path.display()))?;
    RuleTable::new(file.countries)
        .with_context(|| format!("invalid rule table in {}", path.display()))
}

/// The built-in rule table: a 183-day calendar-year default plus a few
/// well-known jurisdictions illustrating each window regime.
pub fn builtin_rule_table() -> RuleTable {
    let base = CountryRule {
        display_name: "Default".to_string(),
        day_threshold: 183,
        window_type: WindowType::CalendarYear,
        tax_year_start_month: 1,
        tax_year_start_day: 1,
        counts_arrival_departure: true,
        counts_partial_days: true,
        counts_weekends_holidays: true,
        treaty_employment_rule: false,
        notes: None,
    };

    let mut countries = HashMap::new();
    countries.insert(DEFAULT_RULE_KEY.to_string(), base.clone());
    countries.insert(
        "GB".to_string(),
        CountryRule {
            display_name: "United Kingdom".to_string(),
            window_type: WindowType::TaxYear,
            tax_year_start_month: 4,
            tax_year_start_day: 6,
            notes: Some("Tax year runs 6 April to 5 April.".to_string()),
            ..base.clone()
        },
    );
    countries.insert(
        "AU".to_string(),
        CountryRule {
            display_name: "Australia".to_string(),
            window_type: WindowType::TaxYear,
            tax_year_start_month: 7,
            tax_year_start_day: 1,
            notes: Some("Income year runs 1 July to 30 June.".to_string()),
            ..base.clone()
        },
    );
    countries.insert(
        "DE".to_string(),
        CountryRule {
            display_name: "Germany".to_string(),
            window_type: WindowType::Rolling12Months,
            treaty_employment_rule: true,
            notes: Some("Treaty 183-day rule counted over any 12-month period.".to_string()),
            ..base.clone()
        },
    );
    countries.insert(
        "US".to_string(),
        CountryRule {
            display_name: "United States".to_string(),
            notes: Some(
                "Simplified: the substantial presence test's weighted lookback is not modeled."
                    .to_string(),
            ),
            ..base
        },
    );

    RuleTable::new(countries).unwrap_or_else(|_| unreachable!("built-in table has a Default entry"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stay_core::CountryCode;

    #[test]
    fn builtin_table_has_default_and_regimes() {
        let table = builtin_rule_table();
        assert_eq!(table.default_rule().day_threshold, 183);

        let gb = table.rule_for(&CountryCode::new("GB").unwrap());
        assert_eq!(gb.window_type, WindowType::TaxYear);
        assert_eq!(gb.tax_year_start_month, 4);

        let de = table.rule_for(&CountryCode::new("DE").unwrap());
        assert_eq!(de.window_type, WindowType::Rolling12Months);
    }

    #[test]
    fn load_rule_table_none_returns_builtin() {
        let table = load_rule_table(None).unwrap();
        assert!(table.has_entry(&CountryCode::new("GB").unwrap()));
    }

    #[test]
    fn load_rule_table_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            r#"
[countries.Default]
display_name = "Default"
day_threshold = 183
window_type = "calendar_year"
counts_arrival_departure = true
counts_partial_days = true

[countries.FR]
display_name = "France"
day_threshold = 183
window_type = "rolling_12_months"
"#,
        )
        .unwrap();

        let table = load_rule_table(Some(&path)).unwrap();
        let fr = table.rule_for(&CountryCode::new("FR").unwrap());
        assert_eq!(fr.window_type, WindowType::Rolling12Months);
        assert!(!fr.counts_partial_days);
    }

    #[test]
    fn load_rule_table_rejects_missing_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            r#"
[countries.FR]
display_name = "France"
day_threshold = 183
window_type = "calendar_year"
"#,
        )
        .unwrap();

        let err = load_rule_table(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid rule table"));
    }

    #[test]
    fn load_rule_table_rejects_missing_file() {
        let err = load_rule_table(Some(Path::new("/nonexistent/rules.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to load rule table"));
    }
}
