//! Error types
//!
//! `StoreError` covers everything the remote document store can report and is
//! captured per file during a synchronization round. `ApiError` is the
//! crate-level error returned by session, configuration and CLI operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a remote store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    /// File is absent (valid for first-time creation)
    NotFound,
    /// Supplied sha is stale: the file changed since it was read
    Conflict,
    /// Network, authentication or unexpected status failure
    Transport,
    /// Malformed local data, rejected before any remote call
    Validation,
    /// Remote content could not be decoded into the expected document
    Malformed,
}

impl StoreErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Transport => "transport_error",
            Self::Validation => "validation_error",
            Self::Malformed => "malformed_document",
        }
    }
}

impl std::fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed document {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::NotFound { .. } => StoreErrorKind::NotFound,
            StoreError::Conflict { .. } => StoreErrorKind::Conflict,
            StoreError::Transport(_) => StoreErrorKind::Transport,
            StoreError::Validation(_) => StoreErrorKind::Validation,
            StoreError::Malformed { .. } => StoreErrorKind::Malformed,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn stale_sha(path: &str) -> Self {
        StoreError::Conflict {
            path: path.to_string(),
            message: "file changed since last read, reload and retry".to_string(),
        }
    }
}

/// Local session state errors
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("State database error: {0}")]
    Database(String),

    #[error("Corrupt state entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("State error: {0}")]
    StateError(#[from] StateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Sync incomplete: {0}")]
    SyncIncomplete(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for StateError {
    fn from(err: sled::Error) -> Self {
        StateError::Database(err.to_string())
    }
}
