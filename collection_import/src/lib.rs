//! Collection Import - MTG collection reconciliation
//!
//! Turns a CSV collection export into priced, finish-accurate cards:
//! rows are parsed, batched into Scryfall collection lookups, retried one by
//! one through a fallback identifier when the batch misses them, priced by
//! finish and merged back with their quantities. Whatever cannot be matched
//! is reported, never dropped.

pub mod batcher;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod merger;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod pricing;
pub mod resolver;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use catalog::{CatalogClient, LookupOutcome, ScryfallCatalog};
pub use config::{ImportConfig, DEFAULT_CATALOG_URL, DEFAULT_USER_AGENT};
pub use error::{
    FinishMismatchError, ImportError, MalformedRow, ResolutionError, Result, StoreError,
    UpstreamError,
};
pub use crate::log::ImportLog;
pub use merger::{Reconciliation, UnmatchedReport, UnmatchedRow};
pub use models::{Collection, CollectionTotals, LineItem, ResolvedCard};
pub use pipeline::Reconciler;
pub use service::{CollectionService, CollectionView, ImportSummary};
pub use store::{CollectionStore, SqliteStore};
