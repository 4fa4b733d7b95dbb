use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical upstream provider identifiers.
///
/// A provider family may be served from several interchangeable mirrors; the
/// identifier names the family, not the hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Ergast,
    Openf1,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::Ergast, Self::Openf1];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ergast => "ergast",
            Self::Openf1 => "openf1",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ergast" => Ok(Self::Ergast),
            "openf1" => Ok(Self::Openf1),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}
