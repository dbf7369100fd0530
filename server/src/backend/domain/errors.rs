//! Typed errors raised by the domain layer.
//!
//! Services return `anyhow::Result`; these types travel inside the `anyhow`
//! error so the REST layer can downcast and pick a status code.

use shared::Collection;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
}

/// Stages an import passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Idle,
    ReadingFile,
    ParsingJson,
    ValidatingStructure,
    Applying,
    Applied,
    Rejected,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Idle => "idle",
            ImportStage::ReadingFile => "reading file",
            ImportStage::ParsingJson => "parsing JSON",
            ImportStage::ValidatingStructure => "validating structure",
            ImportStage::Applying => "applying",
            ImportStage::Applied => "applied",
            ImportStage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Reasons an export or import is refused
#[derive(Debug, Error)]
pub enum DataExchangeError {
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("No valid data to import")]
    NoValidData,

    #[error("Invalid {collection} record at index {index}: {reason}")]
    InvalidRecord {
        collection: Collection,
        index: usize,
        reason: String,
    },

    #[error("No data to export in {0}")]
    EmptyCollection(Collection),

    #[error("Failed to write imported data: {0:#}")]
    Storage(anyhow::Error),
}

impl DataExchangeError {
    /// Stage at which an import fails with this error
    pub fn stage(&self) -> ImportStage {
        match self {
            DataExchangeError::Unreadable { .. } => ImportStage::ReadingFile,
            DataExchangeError::MalformedJson(_) => ImportStage::ParsingJson,
            DataExchangeError::NoValidData | DataExchangeError::InvalidRecord { .. } => {
                ImportStage::ValidatingStructure
            }
            DataExchangeError::Storage(_) => ImportStage::Applying,
            DataExchangeError::EmptyCollection(_) => ImportStage::Idle,
        }
    }

    /// True when the caller's document (not the server) is at fault
    pub fn is_rejection(&self) -> bool {
        !matches!(self, DataExchangeError::Storage(_))
    }
}
