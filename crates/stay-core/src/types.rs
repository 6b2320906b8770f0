//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// An ISO-3166-1 alpha-2 country code.
///
/// Codes are uppercased on construction and must be non-empty. Strict
/// two-letter well-formedness is observable via [`Self::is_well_formed`] but
/// deliberately not enforced: legs arrive from upstream record sources whose
/// validation may have failed, and the engine must tolerate odd codes
/// without crashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Creates a new country code, uppercasing the input.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.is_empty() {
            return Err(ValidationError::Empty {
                field: "country code",
            });
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is a well-formed two-letter alpha-2 code.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 2 && self.0.bytes().all(|b| b.is_ascii_uppercase())
    }
}

impl TryFrom<String> for CountryCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CountryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated traveler identifier.
///
/// Traveler IDs must be non-empty strings. They identify whose flight
/// history a leg belongs to; uniqueness is the record source's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TravelerId(String);

impl TravelerId {
    /// Creates a new ID after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::Empty {
                field: "traveler ID",
            });
        }
        Ok(Self(id))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TravelerId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TravelerId> for String {
    fn from(id: TravelerId) -> Self {
        id.0
    }
}

impl fmt::Display for TravelerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TravelerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_code_rejects_empty() {
        assert!(CountryCode::new("").is_err());
        assert!(CountryCode::new("DE").is_ok());
    }

    #[test]
    fn country_code_uppercases() {
        let code = CountryCode::new("gb").unwrap();
        assert_eq!(code.as_str(), "GB");
    }

    #[test]
    fn country_code_well_formedness() {
        assert!(CountryCode::new("US").unwrap().is_well_formed());
        assert!(!CountryCode::new("USA").unwrap().is_well_formed());
        assert!(!CountryCode::new("1X").unwrap().is_well_formed());
    }

    #[test]
    fn country_code_serde_roundtrip() {
        let code = CountryCode::new("FR").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"FR\"");
        let parsed: CountryCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, code);
    }

    #[test]
    fn country_code_serde_rejects_empty() {
        let result: Result<CountryCode, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn traveler_id_rejects_empty() {
        assert!(TravelerId::new("").is_err());
        assert!(TravelerId::new("alice").is_ok());
    }

    #[test]
    fn traveler_id_as_ref() {
        let id = TravelerId::new("alice").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "alice");
    }
}
