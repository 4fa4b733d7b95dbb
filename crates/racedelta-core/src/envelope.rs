//! Response tagging.
//!
//! Every public operation returns its payload wrapped in [`Sourced`], so a
//! consumer can always tell an authoritative result from a degraded one.

use serde::{Deserialize, Serialize};

use crate::domain::UtcDateTime;

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Computed from upstream data fetched during this request.
    Live,
    /// Served from a cache tier, possibly past its freshness window.
    Cache,
    /// Substituted from the embedded last-known-good snapshot.
    Fallback,
}

/// A payload plus its provenance tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub data: T,
    pub source: DataOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<UtcDateTime>,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataOrigin::Live,
            last_updated: Some(UtcDateTime::now()),
        }
    }

    pub fn cached(data: T) -> Self {
        Self {
            data,
            source: DataOrigin::Cache,
            last_updated: None,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            source: DataOrigin::Fallback,
            last_updated: None,
        }
    }

    pub const fn is_degraded(&self) -> bool {
        !matches!(self.source, DataOrigin::Live)
    }

    /// Map the payload, keeping the provenance tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            source: self.source,
            last_updated: self.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_tags_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&DataOrigin::Fallback).expect("serializes"),
            r#""fallback""#
        );
        assert_eq!(
            serde_json::to_string(&DataOrigin::Live).expect("serializes"),
            r#""live""#
        );
    }

    #[test]
    fn live_payloads_carry_a_timestamp() {
        let sourced = Sourced::live(42);
        assert!(sourced.last_updated.is_some());
        assert!(!sourced.is_degraded());

        let degraded = Sourced::fallback(42);
        assert!(degraded.is_degraded());
    }
}
