//! Assembles the final card list and the unmatched report

use crate::error::{MalformedRow, ResolutionError};
use crate::ledger::{EntryId, FinishLedger};
use crate::log::ImportLog;
use crate::models::{CollectionTotals, ResolvedCard};
use crate::pricing::{MismatchedRow, PricedBatch};
use std::collections::HashSet;

/// A row that never matched a catalog card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedRow {
    pub entry: EntryId,
    pub line: u64,
    pub quantity: u32,
    pub error: ResolutionError,
}

/// What did not make it into the collection, and the quantity bookkeeping
#[derive(Debug, Clone, Default)]
pub struct UnmatchedReport {
    /// Rows rejected by the parser; they carry no quantity
    pub malformed: Vec<MalformedRow>,
    pub unresolved: Vec<UnmatchedRow>,
    pub finish_mismatches: Vec<MismatchedRow>,
    /// Sum over all parsed line items
    pub input_quantity: u64,
    pub matched_quantity: u64,
    /// Rows answered by a fallback lookup
    pub rekeyed: usize,
}

impl UnmatchedReport {
    /// Unresolved plus finish-mismatch rows
    pub fn error_count(&self) -> usize {
        self.unresolved.len() + self.finish_mismatches.len()
    }

    pub fn unmatched_quantity(&self) -> u64 {
        self.unresolved.iter().map(|row| u64::from(row.quantity)).sum()
    }

    pub fn mismatch_quantity(&self) -> u64 {
        self.finish_mismatches
            .iter()
            .map(|row| u64::from(row.quantity))
            .sum()
    }

    /// Every parsed card is either matched or reported
    pub fn is_balanced(&self) -> bool {
        self.matched_quantity + self.unmatched_quantity() + self.mismatch_quantity()
            == self.input_quantity
    }
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub cards: Vec<ResolvedCard>,
    pub report: UnmatchedReport,
}

impl Reconciliation {
    pub fn totals(&self) -> CollectionTotals {
        CollectionTotals::from_cards(&self.cards)
    }

    pub fn error_count(&self) -> usize {
        self.report.error_count()
    }

    pub fn into_parts(self) -> (Vec<ResolvedCard>, UnmatchedReport) {
        (self.cards, self.report)
    }
}

/// Merge priced batches (already in batch order) into the final result.
///
/// Each ledger entry is counted exactly once: a second result for the same
/// entry is dropped, and an entry with no result at all is reported as
/// unresolved.
pub fn merge(
    batches: Vec<PricedBatch>,
    ledger: &FinishLedger,
    malformed: Vec<MalformedRow>,
    log: &ImportLog,
) -> Reconciliation {
    let mut result = Reconciliation::default();
    let mut accounted: HashSet<EntryId> = HashSet::new();
    let mut duplicates = 0usize;

    for batch in batches {
        for priced in batch.priced {
            if !accounted.insert(priced.entry) {
                duplicates += 1;
                continue;
            }
            result.report.matched_quantity += u64::from(priced.quantity);
            result.cards.push(ResolvedCard::from(priced));
        }
        for row in batch.mismatched {
            if !accounted.insert(row.entry) {
                duplicates += 1;
                continue;
            }
            result.report.finish_mismatches.push(row);
        }
        for unresolved in batch.unresolved {
            if !accounted.insert(unresolved.entry) {
                duplicates += 1;
                continue;
            }
            let (line, quantity) = ledger
                .entry(unresolved.entry)
                .map(|entry| (entry.item.line, entry.item.quantity))
                .unwrap_or_default();
            result.report.unresolved.push(UnmatchedRow {
                entry: unresolved.entry,
                line,
                quantity,
                error: unresolved.error,
            });
        }
    }

    if duplicates > 0 {
        log.error(format_args!(
            "{} results referred to rows that were already counted",
            duplicates
        ));
    }

    for entry in ledger.entries() {
        if accounted.contains(&entry.id) {
            continue;
        }
        let subject = entry.label();
        log.error(format_args!("{} produced no result", subject));
        result.report.unresolved.push(UnmatchedRow {
            entry: entry.id,
            line: entry.item.line,
            quantity: entry.item.quantity,
            error: ResolutionError::MissingFromResponse { subject },
        });
    }

    result.report.malformed = malformed;
    result.report.input_quantity = ledger.total_quantity();
    result.report.rekeyed = ledger.rekeys().len();

    if !result.report.is_balanced() {
        log.error(format_args!(
            "Quantity mismatch: {} in, {} matched, {} unmatched, {} wrong finish",
            result.report.input_quantity,
            result.report.matched_quantity,
            result.report.unmatched_quantity(),
            result.report.mismatch_quantity()
        ));
    }

    let totals = result.totals();
    log.info(format_args!(
        "{} cards resolved ({} copies, value {}), {} rows malformed",
        result.cards.len(),
        totals.card_count,
        totals.total_value,
        result.report.malformed.len()
    ));
    log.info(format_args!("Error count: {}", result.report.error_count()));
    result
}
