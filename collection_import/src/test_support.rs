//! Fixtures shared by the unit tests

use crate::catalog::{CatalogClient, LookupOutcome};
use crate::models::{LineItem, ResolvedCard};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use log::{Level, Log, Metadata, Record};
use mtg_common::{
    CardIdentifier, CatalogError, CollectionResponse, FallbackId, Finish, LookupKey, ScryfallCard,
    ScryfallPrices,
};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Logger that keeps every record in memory
pub(crate) struct CapturedLog {
    max_level: Level,
    records: Mutex<Vec<(Level, String)>>,
}

impl Default for CapturedLog {
    fn default() -> Self {
        Self::with_max_level(Level::Trace)
    }
}

impl CapturedLog {
    pub(crate) fn with_max_level(max_level: Level) -> Self {
        Self {
            max_level,
            records: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn lines(&self) -> Vec<(Level, String)> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, level: Level) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

impl Log for CapturedLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

pub(crate) fn line_item(set: &str, cn: &str, finish: Finish, quantity: u32) -> LineItem {
    LineItem {
        line: 0,
        name: None,
        set_code: Some(set.to_string()),
        collector_number: Some(cn.to_string()),
        requested_finish: finish,
        quantity,
        fallback: None,
    }
}

/// Card as Scryfall would return it; prices are `[usd, usd_foil, usd_etched]`
pub(crate) fn scryfall_card(
    set: &str,
    cn: &str,
    name: &str,
    finishes: &[&str],
    prices: [Option<&str>; 3],
) -> ScryfallCard {
    let [usd, usd_foil, usd_etched] = prices;
    ScryfallCard {
        id: format!("id-{}-{}", set.to_lowercase(), cn),
        name: name.to_string(),
        set: set.to_lowercase(),
        set_name: format!("Set {}", set.to_uppercase()),
        collector_number: cn.to_string(),
        tcgplayer_id: Some(1000),
        uri: Some(format!("https://api.scryfall.com/cards/{}/{}", set, cn)),
        finishes: finishes.iter().map(|f| Finish::parse(f)).collect(),
        prices: ScryfallPrices {
            usd: usd.map(str::to_string),
            usd_foil: usd_foil.map(str::to_string),
            usd_etched: usd_etched.map(str::to_string),
        },
    }
}

pub(crate) fn resolved(name: &str, finish: Finish, price: &str, quantity: u32) -> ResolvedCard {
    ResolvedCard {
        card_name: name.to_string(),
        external_id: 1000,
        catalog_id: format!("id-{}", name),
        set_name: "Test Set".to_string(),
        set_code: "tst".to_string(),
        collector_number: "1".to_string(),
        finish,
        print_uri: String::new(),
        price: BigDecimal::from_str(price).unwrap(),
        quantity,
        collection_ref: None,
    }
}

/// In-memory catalog with call counters
#[derive(Default)]
pub(crate) struct MockCatalog {
    cards: HashMap<LookupKey, ScryfallCard>,
    fallbacks: HashMap<FallbackId, ScryfallCard>,
    omitted: HashSet<LookupKey>,
    fail_collection: bool,
    collection_delay: Option<Duration>,
    card_delay: Option<Duration>,
    pub(crate) collection_calls: AtomicUsize,
    pub(crate) card_calls: AtomicUsize,
    pub(crate) batch_sizes: Mutex<Vec<usize>>,
}

impl MockCatalog {
    pub(crate) fn with_card(mut self, card: ScryfallCard) -> Self {
        self.cards.insert(card.lookup_key(), card);
        self
    }

    pub(crate) fn with_fallback(mut self, id: FallbackId, card: ScryfallCard) -> Self {
        self.fallbacks.insert(id, card);
        self
    }

    /// Leave a key out of both `data` and `not_found`
    pub(crate) fn omitting(mut self, key: LookupKey) -> Self {
        self.omitted.insert(key);
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail_collection = true;
        self
    }

    pub(crate) fn slow(mut self, delay: Duration) -> Self {
        self.collection_delay = Some(delay);
        self
    }

    pub(crate) fn slow_fallback(mut self, delay: Duration) -> Self {
        self.card_delay = Some(delay);
        self
    }

    pub(crate) fn collection_calls(&self) -> usize {
        self.collection_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn card_calls(&self) -> usize {
        self.card_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn fetch_collection(
        &self,
        identifiers: &[CardIdentifier],
    ) -> LookupOutcome<CollectionResponse> {
        self.collection_calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(identifiers.len());

        if let Some(delay) = self.collection_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_collection {
            return LookupOutcome::Failed(CatalogError::HttpStatus {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: r#"{"details":"boom"}"#.to_string(),
            });
        }

        let mut response = CollectionResponse {
            data: Vec::new(),
            not_found: Vec::new(),
        };
        for identifier in identifiers {
            let key = identifier.lookup_key();
            if self.omitted.contains(&key) {
                continue;
            }
            match self.cards.get(&key) {
                Some(card) => response.data.push(card.clone()),
                None => response.not_found.push(identifier.clone()),
            }
        }
        LookupOutcome::Found(response)
    }

    async fn fetch_card(&self, id: &FallbackId) -> LookupOutcome<ScryfallCard> {
        self.card_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.card_delay {
            tokio::time::sleep(delay).await;
        }
        match self.fallbacks.get(id) {
            Some(card) => LookupOutcome::Found(card.clone()),
            None => LookupOutcome::NotFound(format!("not_found: {}", id)),
        }
    }
}
