//! Card catalog access
//!
//! The resolver only sees `CatalogClient`; `ScryfallCatalog` is the HTTP
//! implementation used in production.

mod scryfall;

pub use scryfall::ScryfallCatalog;

use async_trait::async_trait;
use mtg_common::{CardIdentifier, CatalogError, CollectionResponse, FallbackId, ScryfallCard};
use std::future::Future;
use std::time::Duration;

/// Result of one catalog call
#[derive(Debug)]
pub enum LookupOutcome<T> {
    Found(T),
    /// The catalog answered that it has no such card
    NotFound(String),
    Failed(CatalogError),
    TimedOut,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Primary lookup for up to 75 set/collector-number pairs
    async fn fetch_collection(
        &self,
        identifiers: &[CardIdentifier],
    ) -> LookupOutcome<CollectionResponse>;

    /// Single-card lookup by Scryfall id or TCGplayer product id
    async fn fetch_card(&self, id: &FallbackId) -> LookupOutcome<ScryfallCard>;
}

/// Bound a catalog call; an expired call counts as `TimedOut`
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> LookupOutcome<T>
where
    F: Future<Output = LookupOutcome<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => LookupOutcome::TimedOut,
    }
}
