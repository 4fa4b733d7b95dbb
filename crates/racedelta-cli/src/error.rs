use thiserror::Error;

use racedelta_core::{StoreError, ValidationError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("output serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache directory error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            _ => 1,
        }
    }
}
