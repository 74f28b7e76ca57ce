//! Error types for batchgen
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Structural errors surfaced synchronously to the caller of a controller operation.
///
/// Failures of individual generation calls never show up here; they are absorbed
/// into the item's `Failed` state (see [`GenerateError`]).
#[derive(Debug, Error)]
pub enum BatchError {
    /// No item with this id in the batch
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// An item with this id already exists in the batch
    #[error("Duplicate item id: {0}")]
    DuplicateItem(String),

    /// Item rejected on admission
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Controller configuration rejected
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for batchgen operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Failure reported by a generation callback.
///
/// The display text is what ends up in `BatchItem::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GenerateError(String);

impl GenerateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for GenerateError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for GenerateError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<std::io::Error> for GenerateError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}
