//! Finish and price resolution for matched cards

use crate::error::FinishMismatchError;
use crate::ledger::{EntryId, FinishLedger, LedgerEntry};
use crate::log::ImportLog;
use crate::models::{CardDetail, ResolvedCard};
use crate::resolver::{BatchOutcome, MatchedCard, UnresolvedEntry};
use bigdecimal::{BigDecimal, Zero};
use mtg_common::Finish;

/// Card with its final finish, price and quantity
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCard {
    pub entry: EntryId,
    pub card: CardDetail,
    pub finish: Finish,
    pub price: BigDecimal,
    pub quantity: u32,
}

impl From<PricedCard> for ResolvedCard {
    fn from(priced: PricedCard) -> Self {
        let card = priced.card;
        ResolvedCard {
            card_name: card.name,
            external_id: card.external_id,
            catalog_id: card.catalog_id,
            set_name: card.set_name,
            set_code: card.set_code,
            collector_number: card.collector_number,
            finish: priced.finish,
            print_uri: card.print_uri,
            price: priced.price,
            quantity: priced.quantity,
            collection_ref: None,
        }
    }
}

/// A matched row whose requested finish the card does not come in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedRow {
    pub entry: EntryId,
    pub line: u64,
    pub quantity: u32,
    pub error: FinishMismatchError,
}

/// A batch outcome after finish and price resolution
#[derive(Debug, Default)]
pub struct PricedBatch {
    pub batch: usize,
    pub priced: Vec<PricedCard>,
    pub mismatched: Vec<MismatchedRow>,
    pub unresolved: Vec<UnresolvedEntry>,
}

/// Pick the printing that satisfies `requested`.
///
/// Exact match first; a foil request may be filled by an etched printing,
/// since etched cards have no separate foil entry in the catalog. Nothing else
/// is substituted, so a row without a finish only matches a card listing
/// `unknown`.
pub fn resolve_finish(
    requested: &Finish,
    card: &CardDetail,
) -> Result<Finish, FinishMismatchError> {
    let available = &card.available_finishes;

    let found = match requested {
        _ if available.contains(requested) => Some(requested.clone()),
        Finish::Foil if available.contains(&Finish::Etched) => Some(Finish::Etched),
        _ => None,
    };

    found.ok_or_else(|| FinishMismatchError {
        card: format!("{} - {} - {}", card.name, card.set_name, card.collector_number),
        requested: requested.clone(),
        available: available.clone(),
    })
}

/// USD price for a finish; no price data means zero
pub fn price_for(card: &CardDetail, finish: &Finish) -> BigDecimal {
    card.price(finish).cloned().unwrap_or_else(BigDecimal::zero)
}

pub fn price_match(
    matched: MatchedCard,
    entry: &LedgerEntry,
    log: &ImportLog,
) -> Result<PricedCard, MismatchedRow> {
    let finish = resolve_finish(&entry.item.requested_finish, &matched.card).map_err(|error| {
        log.error(format_args!("Finish not found: {}", error));
        MismatchedRow {
            entry: entry.id,
            line: entry.item.line,
            quantity: entry.item.quantity,
            error,
        }
    })?;

    let price = price_for(&matched.card, &finish);
    if matched.card.price(&finish).is_none() {
        log.debug(format_args!(
            "No {} price for {}, using 0",
            finish, matched.card.name
        ));
    }

    Ok(PricedCard {
        entry: entry.id,
        card: matched.card,
        finish,
        price,
        quantity: entry.item.quantity,
    })
}

/// Price every matched card of a batch, keeping batch order
pub fn price_batch(outcome: BatchOutcome, ledger: &FinishLedger, log: &ImportLog) -> PricedBatch {
    let mut priced = PricedBatch {
        batch: outcome.batch,
        unresolved: outcome.unresolved,
        ..PricedBatch::default()
    };

    for matched in outcome.matched {
        let Some(entry) = ledger.entry(matched.entry) else {
            log.error(format_args!(
                "Matched card {} refers to unknown row {}",
                matched.card.name, matched.entry
            ));
            continue;
        };
        match price_match(matched, entry, log) {
            Ok(card) => priced.priced.push(card),
            Err(row) => priced.mismatched.push(row),
        }
    }
    priced
}

#[cfg(test)]
#[path = "pricing_tests.rs"]
mod tests;
