//! Scryfall wire format
//!
//! Only the fields the importer reads are modelled; everything else in the
//! payload is ignored by serde.

use crate::finish::Finish;
use crate::identifiers::{CardIdentifier, LookupKey};
use serde::{Deserialize, Serialize};

/// Hard limit on identifiers per `/cards/collection` request
pub const MAX_COLLECTION_IDENTIFIERS: usize = 75;

/// Scryfall card response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScryfallCard {
    pub id: String,
    pub name: String,
    pub set: String,
    pub set_name: String,
    pub collector_number: String,
    /// TCGplayer product id, missing for many promos and digital cards
    #[serde(default)]
    pub tcgplayer_id: Option<u64>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub finishes: Vec<Finish>,
    #[serde(default)]
    pub prices: ScryfallPrices,
}

/// Price fields are decimal strings; `null` when Scryfall has no price
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ScryfallPrices {
    pub usd: Option<String>,
    pub usd_foil: Option<String>,
    pub usd_etched: Option<String>,
}

impl ScryfallPrices {
    /// Raw USD price string for a finish
    pub fn usd_for(&self, finish: &Finish) -> Option<&str> {
        match finish {
            Finish::Nonfoil => self.usd.as_deref(),
            Finish::Foil => self.usd_foil.as_deref(),
            Finish::Etched => self.usd_etched.as_deref(),
            Finish::Unknown | Finish::Other(_) => None,
        }
    }
}

impl ScryfallCard {
    /// Key built from the card's own set and collector number
    pub fn lookup_key(&self) -> LookupKey {
        LookupKey::new(&self.set, &self.collector_number)
    }
}

/// Body of `POST /cards/collection`
#[derive(Debug, Serialize)]
pub struct CollectionRequest<'a> {
    pub identifiers: &'a [CardIdentifier],
}

/// Response of `POST /cards/collection`
#[derive(Debug, Deserialize)]
pub struct CollectionResponse {
    #[serde(default)]
    pub data: Vec<ScryfallCard>,
    #[serde(default)]
    pub not_found: Vec<CardIdentifier>,
}

/// Scryfall API error response
#[derive(Debug, Deserialize)]
pub struct ScryfallError {
    pub status: u16,
    pub code: String,
    pub details: String,
}
