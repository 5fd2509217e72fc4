//! Finish ledger: what each row asked for, indexed by lookup key
//!
//! Built once per run before any catalog call. Entries are never modified;
//! when a fallback lookup answers with a different set/collector number, a
//! `Rekey` record is appended and the new key is added to the index.

use crate::models::LineItem;
use mtg_common::LookupKey;
use std::collections::HashMap;

/// Position of a line item in the run
pub type EntryId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub item: LineItem,
    /// Key as requested by the export; `None` for identifier-only rows
    pub key: Option<LookupKey>,
}

impl LedgerEntry {
    pub fn label(&self) -> String {
        self.item.label()
    }
}

/// A row answered by a fallback lookup under another key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rekey {
    pub entry: EntryId,
    pub original_key: Option<LookupKey>,
    pub resolved_key: LookupKey,
}

#[derive(Debug, Default)]
pub struct FinishLedger {
    entries: Vec<LedgerEntry>,
    index: HashMap<LookupKey, Vec<EntryId>>,
    rekeys: Vec<Rekey>,
}

impl FinishLedger {
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut ledger = Self::default();
        for (id, item) in items.into_iter().enumerate() {
            let key = item.lookup_key();
            if let Some(ref key) = key {
                ledger.index.entry(key.clone()).or_default().push(id);
            }
            ledger.entries.push(LedgerEntry { id, item, key });
        }
        ledger
    }

    pub fn entry(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries filed under a key, original or re-keyed, in insertion order
    pub fn entries_for(&self, key: &LookupKey) -> &[EntryId] {
        self.index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows that can only be resolved through their fallback identifier
    pub fn direct_entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|entry| entry.key.is_none())
    }

    pub fn record_rekeys(&mut self, rekeys: impl IntoIterator<Item = Rekey>) {
        for rekey in rekeys {
            let filed = self.index.entry(rekey.resolved_key.clone()).or_default();
            if !filed.contains(&rekey.entry) {
                filed.push(rekey.entry);
            }
            self.rekeys.push(rekey);
        }
    }

    pub fn rekeys(&self) -> &[Rekey] {
        &self.rekeys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.item.quantity))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::line_item;
    use mtg_common::Finish;

    #[test]
    fn rows_sharing_a_key_keep_separate_entries() {
        let ledger = FinishLedger::from_items(vec![
            line_item("XYZ", "001", Finish::Nonfoil, 2),
            line_item("xyz", "001", Finish::Foil, 1),
        ]);

        let key = LookupKey::new("XYZ", "001");
        assert_eq!(ledger.entries_for(&key), &[0, 1]);
        assert_eq!(ledger.entry(1).unwrap().item.requested_finish, Finish::Foil);
        assert_eq!(ledger.total_quantity(), 3);
    }

    #[test]
    fn rekey_indexes_entry_under_resolved_key() {
        let mut ledger = FinishLedger::from_items(vec![line_item("XYZ", "001", Finish::Foil, 4)]);
        let resolved_key = LookupKey::new("XYZ", "1");

        ledger.record_rekeys(vec![Rekey {
            entry: 0,
            original_key: Some(LookupKey::new("XYZ", "001")),
            resolved_key: resolved_key.clone(),
        }]);

        assert_eq!(ledger.entries_for(&resolved_key), &[0]);
        assert_eq!(ledger.entries_for(&LookupKey::new("XYZ", "001")), &[0]);
        assert_eq!(ledger.rekeys().len(), 1);
        // the entry itself keeps the requested finish and quantity
        let entry = ledger.entry(0).unwrap();
        assert_eq!(entry.item.requested_finish, Finish::Foil);
        assert_eq!(entry.item.quantity, 4);
    }

    #[test]
    fn identifier_only_rows_are_direct() {
        let mut direct = line_item("XYZ", "9", Finish::Nonfoil, 1);
        direct.set_code = None;
        let ledger =
            FinishLedger::from_items(vec![line_item("XYZ", "1", Finish::Nonfoil, 1), direct]);

        let ids: Vec<EntryId> = ledger.direct_entries().map(|e| e.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
