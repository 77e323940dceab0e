//! Italian fiscal code (codice fiscale).

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Layout of a 16-character personal fiscal code.
///
/// Digit positions also accept the omocodia substitution letters
/// (`LMNPQRSTUV`), the month position accepts only the twelve month letters.
static FISCAL_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Z]{6}[0-9LMNPQRSTUV]{2}[ABCDEHLMPRST][0-9LMNPQRSTUV]{2}[A-Z][0-9LMNPQRSTUV]{3}[A-Z]$",
    )
    .expect("valid fiscal code regex")
});

/// Errors that can occur when parsing a [`FiscalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FiscalCodeError {
    /// The input string is empty.
    #[error("fiscal code cannot be empty")]
    Empty,
    /// The input has the wrong number of characters.
    #[error("fiscal code must be 16 characters (got {0})")]
    WrongLength(usize),
    /// The input does not follow the fiscal code layout.
    #[error("fiscal code format is invalid")]
    InvalidFormat,
}

/// A validated, upper-cased Italian fiscal code.
///
/// ```
/// use summer_camp_core::FiscalCode;
///
/// let code = FiscalCode::parse("rssmra80a01h501u").unwrap();
/// assert_eq!(code.as_str(), "RSSMRA80A01H501U");
/// assert!(FiscalCode::parse("RSSMRA80Z01H501U").is_err()); // Z is not a month
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FiscalCode(String);

impl FiscalCode {
    /// Number of characters in a personal fiscal code.
    pub const LENGTH: usize = 16;

    /// Parse a fiscal code, ignoring surrounding whitespace and case.
    ///
    /// # Errors
    ///
    /// Returns a [`FiscalCodeError`] if the input is empty, has the wrong
    /// length, or does not follow the fiscal code layout.
    pub fn parse(s: &str) -> Result<Self, FiscalCodeError> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if normalized.is_empty() {
            return Err(FiscalCodeError::Empty);
        }

        let len = normalized.chars().count();
        if len != Self::LENGTH {
            return Err(FiscalCodeError::WrongLength(len));
        }

        if !FISCAL_CODE_RE.is_match(&normalized) {
            return Err(FiscalCodeError::InvalidFormat);
        }

        Ok(Self(normalized))
    }

    /// Returns the fiscal code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FiscalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for FiscalCode {
    type Err = FiscalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(FiscalCode::parse("RSSMRA80A01H501U").is_ok());
        assert!(FiscalCode::parse("vrdgpp13e45f205x").is_ok());
        // omocodia: digits replaced by letters
        assert!(FiscalCode::parse("RSSMRAURALMHRQMU").is_ok());
    }

    #[test]
    fn test_parse_strips_spaces() {
        let code = FiscalCode::parse(" RSS MRA 80A01 H501U ").map(FiscalCode::into_inner);
        assert_eq!(code, Ok("RSSMRA80A01H501U".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(FiscalCode::parse(""), Err(FiscalCodeError::Empty));
        assert_eq!(
            FiscalCode::parse("RSSMRA80A01"),
            Err(FiscalCodeError::WrongLength(11))
        );
        assert_eq!(
            FiscalCode::parse("1SSMRA80A01H501U"),
            Err(FiscalCodeError::InvalidFormat)
        );
        assert_eq!(
            FiscalCode::parse("RSSMRA80Z01H501U"),
            Err(FiscalCodeError::InvalidFormat)
        );
    }
}
