use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ValidationError;

const CODE_LEN: usize = 3;

/// Canonical three-letter driver code, uppercased on parse ("VER", "HAM").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DriverCode(String);

impl DriverCode {
    /// Parse and normalize a driver code to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyDriverCode);
        }

        let normalized = trimmed.to_ascii_uppercase();
        if normalized.chars().count() != CODE_LEN {
            return Err(ValidationError::DriverCodeLength { value: normalized });
        }

        for ch in normalized.chars() {
            if !ch.is_ascii_alphabetic() {
                return Err(ValidationError::DriverCodeInvalidChar { ch });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DriverCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for DriverCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for DriverCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DriverCode> for String {
    fn from(value: DriverCode) -> Self {
        value.0
    }
}

/// A championship season, identified by calendar year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Season(u16);

impl Season {
    pub const fn new(year: u16) -> Self {
        Self(year)
    }

    /// The season currently underway, by UTC calendar year.
    pub fn current() -> Self {
        let year = OffsetDateTime::now_utc().year();
        Self(year.clamp(0, i32::from(u16::MAX)) as u16)
    }

    pub const fn year(self) -> u16 {
        self.0
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Season {
    type Err = ValidationError;

    /// Accepts `"current"` or a four-digit year.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("current") {
            return Ok(Self::current());
        }

        if trimmed.len() == 4 {
            if let Ok(year) = trimmed.parse::<u16>() {
                return Ok(Self(year));
            }
        }

        Err(ValidationError::InvalidSeason {
            value: trimmed.to_owned(),
        })
    }
}
