//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use zone_collector_czds::CzdsError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// TLD has no data in storage
    #[error("TLD not found: {0}")]
    TldNotFound(String),

    /// Sync run id is unknown
    #[error("Sync run not found: {0}")]
    RunNotFound(String),

    /// A sync run is already active
    #[error("Sync already in progress")]
    SyncInProgress,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Zone file could not be read or parsed
    #[error("Zone file parse error: {0}")]
    ParseError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// CZDS error (converting from library)
    #[error("{0}")]
    Czds(#[from] CzdsError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::TldNotFound(_)
            | Self::RunNotFound(_)
            | Self::SyncInProgress
            | Self::ValidationError(_) => true,
            Self::Czds(e) => e.is_expected(),
            _ => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
