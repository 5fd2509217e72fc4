//! Error type for catalog (Scryfall) calls

use thiserror::Error;

/// Failure of a single call to the card catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection refused, TLS, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Non-success status, with whatever body the catalog sent back
    #[error("HTTP error {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Structured error object returned by Scryfall
    #[error("{code}: {details}")]
    ApiResponse { code: String, details: String },
}

impl CatalogError {
    /// True when the underlying transport gave up waiting
    pub fn is_timeout(&self) -> bool {
        matches!(self, CatalogError::Network(e) if e.is_timeout())
    }
}

/// Result alias for catalog calls
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
