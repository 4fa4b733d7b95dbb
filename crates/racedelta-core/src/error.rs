use thiserror::Error;

/// Validation and contract errors exposed by `racedelta-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("driver code cannot be empty")]
    EmptyDriverCode,
    #[error("driver code must be exactly 3 letters: '{value}'")]
    DriverCodeLength { value: String },
    #[error("driver code contains non-letter character '{ch}'")]
    DriverCodeInvalidChar { ch: char },

    #[error("season must be 'current' or a 4-digit year: '{value}'")]
    InvalidSeason { value: String },
    #[error("invalid provider '{value}', expected one of ergast, openf1")]
    InvalidProvider { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("round number must be greater than zero")]
    ZeroRound,
    #[error("comparison drivers must be distinct")]
    IdenticalDrivers,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] racedelta_store::StoreError),
}
