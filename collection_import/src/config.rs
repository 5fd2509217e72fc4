//! Import settings

use crate::error::{ImportError, Result};
use mtg_common::MAX_COLLECTION_IDENTIFIERS;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://api.scryfall.com";
pub const DEFAULT_USER_AGENT: &str = "D2D-Automations-CollectionImport/1.0";

/// Settings for one reconciliation run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Base URL of the catalog API, without trailing slash
    pub catalog_url: String,
    /// Line items per collection request
    pub batch_size: usize,
    /// Batches resolved at the same time (1 = one after another)
    pub batch_concurrency: usize,
    /// Fallback lookups in flight per batch
    pub fallback_concurrency: usize,
    /// Upper bound for every catalog call
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            batch_size: MAX_COLLECTION_IDENTIFIERS,
            batch_concurrency: 2,
            fallback_concurrency: 4,
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ImportConfig {
    /// One batch and one fallback at a time, in discovery order
    pub fn sequential() -> Self {
        Self {
            batch_concurrency: 1,
            fallback_concurrency: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_COLLECTION_IDENTIFIERS {
            return Err(ImportError::BatchSizeExceeded {
                size: self.batch_size,
                max: MAX_COLLECTION_IDENTIFIERS,
            });
        }
        if self.batch_concurrency == 0 || self.fallback_concurrency == 0 {
            return Err(ImportError::Config(
                "concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ImportError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.catalog_url.trim().is_empty() {
            return Err(ImportError::Config("catalog URL is empty".to_string()));
        }
        Ok(())
    }
}
