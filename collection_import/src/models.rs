//! Domain records flowing through an import

use crate::log::ImportLog;
use bigdecimal::{BigDecimal, Zero};
use mtg_common::{CardIdentifier, FallbackId, Finish, LookupKey, ScryfallCard};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// One parsed export row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Line number in the uploaded file (header is line 1)
    pub line: u64,
    pub name: Option<String>,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub requested_finish: Finish,
    pub quantity: u32,
    pub fallback: Option<FallbackId>,
}

impl LineItem {
    /// Join key, if the row carries both set code and collector number
    pub fn lookup_key(&self) -> Option<LookupKey> {
        self.identifier().map(|id| id.lookup_key())
    }

    pub fn identifier(&self) -> Option<CardIdentifier> {
        match (&self.set_code, &self.collector_number) {
            (Some(set), Some(cn)) => Some(CardIdentifier::new(set, cn)),
            _ => None,
        }
    }

    /// Human-readable reference used in logs and reports
    pub fn label(&self) -> String {
        let what = match (self.lookup_key(), &self.fallback) {
            (Some(key), _) => key.to_string(),
            (None, Some(fallback)) => fallback.to_string(),
            (None, None) => "?".to_string(),
        };
        match &self.name {
            Some(name) => format!("{} ({}, line {})", name, what, self.line),
            None => format!("{} (line {})", what, self.line),
        }
    }
}

/// Catalog record for one printing
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetail {
    pub name: String,
    /// Scryfall id
    pub catalog_id: String,
    /// TCGplayer product id, 0 when the catalog has none
    pub external_id: u64,
    pub set_name: String,
    pub set_code: String,
    pub collector_number: String,
    pub print_uri: String,
    pub available_finishes: Vec<Finish>,
    pub prices: HashMap<Finish, BigDecimal>,
}

impl CardDetail {
    /// Convert the wire record; unparsable prices are dropped with a warning
    pub fn from_scryfall(card: ScryfallCard, log: &ImportLog) -> Self {
        let mut prices = HashMap::new();
        for finish in [Finish::Nonfoil, Finish::Foil, Finish::Etched] {
            let Some(raw) = card.prices.usd_for(&finish) else {
                continue;
            };
            match BigDecimal::from_str(raw.trim()) {
                Ok(price) => {
                    prices.insert(finish, price);
                }
                Err(e) => log.warn(format_args!(
                    "Ignoring unparsable {} price '{}' for {} ({}): {}",
                    finish, raw, card.name, card.id, e
                )),
            }
        }

        Self {
            name: card.name,
            catalog_id: card.id,
            external_id: card.tcgplayer_id.unwrap_or(0),
            set_name: card.set_name,
            set_code: card.set,
            collector_number: card.collector_number,
            print_uri: card.uri.unwrap_or_default(),
            available_finishes: card.finishes,
            prices,
        }
    }

    pub fn lookup_key(&self) -> LookupKey {
        LookupKey::new(&self.set_code, &self.collector_number)
    }

    pub fn price(&self, finish: &Finish) -> Option<&BigDecimal> {
        self.prices.get(finish)
    }
}

/// Final priced entry, ready to be stored in a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCard {
    pub card_name: String,
    pub external_id: u64,
    pub catalog_id: String,
    pub set_name: String,
    pub set_code: String,
    pub collector_number: String,
    pub finish: Finish,
    pub print_uri: String,
    pub price: BigDecimal,
    pub quantity: u32,
    /// Id of the owning collection once assigned
    pub collection_ref: Option<i64>,
}

impl ResolvedCard {
    /// price x quantity
    pub fn line_value(&self) -> BigDecimal {
        self.price.clone() * BigDecimal::from(self.quantity)
    }
}

/// Named container of cards for one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub created_at: String,
}

/// Display aggregates over a list of cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionTotals {
    pub card_count: u64,
    pub total_value: BigDecimal,
}

impl CollectionTotals {
    pub fn from_cards(cards: &[ResolvedCard]) -> Self {
        let mut card_count = 0u64;
        let mut total_value = BigDecimal::zero();
        for card in cards {
            card_count += u64::from(card.quantity);
            total_value += card.line_value();
        }
        Self {
            card_count,
            total_value,
        }
    }
}
