//! Error types for collection_import
//!
//! `ImportError` aborts an import. The row- and item-level errors below it
//! never do: they are collected into the run's report and counted.

use mtg_common::Finish;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a whole import or service call
#[derive(Debug, Error)]
pub enum ImportError {
    /// The upload as a whole is unusable (unreadable header, no usable columns)
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// Batch size outside what the catalog accepts per request
    #[error("Batch size {size} outside catalog limit of 1..={max}")]
    BatchSizeExceeded { size: usize, max: usize },
    /// Invalid settings (zero concurrency, zero timeout, bad HTTP client setup)
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// The persistence collaborator failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Result alias for collection_import operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// A data row that could not be turned into a line item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct MalformedRow {
    pub line: u64,
    pub reason: String,
}

/// Non-success answer from the catalog for one call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Failed(String),
}

/// A row that could not be matched to a catalog card, even after fallback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{subject}: not found and no fallback identifier")]
    NoFallback { subject: String },
    #[error("{subject}: not found, fallback {fallback} not found either")]
    FallbackNotFound { subject: String, fallback: String },
    #[error("{subject}: fallback {fallback} failed: {error}")]
    FallbackFailed {
        subject: String,
        fallback: String,
        error: UpstreamError,
    },
    #[error("{subject}: batch lookup failed: {error}")]
    BatchFailed {
        subject: String,
        error: UpstreamError,
    },
    #[error("{subject}: missing from catalog response")]
    MissingFromResponse { subject: String },
}

/// The card exists but not in a finish compatible with the requested one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{card}: no {requested} printing (available: {})",
    .available.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
)]
pub struct FinishMismatchError {
    pub card: String,
    pub requested: Finish,
    pub available: Vec<Finish>,
}

/// Errors from the collection store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Collection already exists: {0}")]
    CollectionExists(String),
    #[error("Invalid stored value: {0}")]
    InvalidData(String),
}

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
