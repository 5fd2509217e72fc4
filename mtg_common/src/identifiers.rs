//! Card identifiers and join keys

use serde::{Deserialize, Serialize};
use std::fmt;

/// Uppercased `{set}-{collector_number}`, the key used to join an export row
/// to the catalog card that came back for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn new(set_code: &str, collector_number: &str) -> Self {
        LookupKey(format!("{}-{}", set_code.trim(), collector_number.trim()).to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `{collector_number, set}` pair of a Scryfall collection request.
///
/// The same shape comes back in the `not_found` list of the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardIdentifier {
    pub collector_number: String,
    pub set: String,
}

impl CardIdentifier {
    pub fn new(set: &str, collector_number: &str) -> Self {
        Self {
            collector_number: collector_number.trim().to_string(),
            set: set.trim().to_string(),
        }
    }

    pub fn lookup_key(&self) -> LookupKey {
        LookupKey::new(&self.set, &self.collector_number)
    }
}

/// Secondary identifier used when the set/collector-number lookup misses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackId {
    /// Scryfall card id (UUID)
    CatalogId(String),
    /// TCGplayer product id
    ExternalId(u64),
}

impl fmt::Display for FallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackId::CatalogId(id) => write!(f, "scryfall:{}", id),
            FallbackId::ExternalId(id) => write!(f, "tcgplayer:{}", id),
        }
    }
}
