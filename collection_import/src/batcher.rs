//! Groups ledger entries into collection requests

use crate::error::{ImportError, Result};
use crate::ledger::{EntryId, FinishLedger, LedgerEntry};
use mtg_common::{CardIdentifier, MAX_COLLECTION_IDENTIFIERS};
use std::collections::HashSet;

/// Rows sent together in one `/cards/collection` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    /// Ledger entries covered, in insertion order
    pub entries: Vec<EntryId>,
    /// Distinct identifiers for those entries, in first-seen order
    pub identifiers: Vec<CardIdentifier>,
}

impl Batch {
    fn from_entries(index: usize, entries: &[&LedgerEntry]) -> Result<Self> {
        check_batch_size(entries.len())?;

        let mut seen = HashSet::new();
        let mut identifiers = Vec::new();
        for entry in entries {
            if let Some(identifier) = entry.item.identifier() {
                if seen.insert(identifier.lookup_key()) {
                    identifiers.push(identifier);
                }
            }
        }

        Ok(Self {
            index,
            entries: entries.iter().map(|entry| entry.id).collect(),
            identifiers,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fails for sizes the catalog would refuse
pub fn check_batch_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_COLLECTION_IDENTIFIERS {
        return Err(ImportError::BatchSizeExceeded {
            size,
            max: MAX_COLLECTION_IDENTIFIERS,
        });
    }
    Ok(())
}

/// Split every keyed entry into batches of at most `max_size` rows.
///
/// Identifier-only entries are left out; they are resolved one by one.
pub fn make_batches(ledger: &FinishLedger, max_size: usize) -> Result<Vec<Batch>> {
    check_batch_size(max_size)?;

    let keyed: Vec<&LedgerEntry> = ledger
        .entries()
        .iter()
        .filter(|entry| entry.key.is_some())
        .collect();

    keyed
        .chunks(max_size)
        .enumerate()
        .map(|(index, chunk)| Batch::from_entries(index, chunk))
        .collect()
}
