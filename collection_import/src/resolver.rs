//! Catalog resolution: primary batch lookups plus per-row fallbacks
//!
//! Each batch produces its own `BatchOutcome` and touches no shared state, so
//! batches can run concurrently and be reduced afterwards in batch order.

use crate::batcher::Batch;
use crate::catalog::{with_timeout, CatalogClient, LookupOutcome};
use crate::config::ImportConfig;
use crate::error::{ResolutionError, UpstreamError};
use crate::ledger::{EntryId, FinishLedger, LedgerEntry, Rekey};
use crate::log::ImportLog;
use crate::models::CardDetail;
use futures::stream::{self, StreamExt};
use mtg_common::LookupKey;
use std::collections::HashSet;

/// A ledger entry paired with the catalog card it resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedCard {
    pub entry: EntryId,
    pub card: CardDetail,
    pub via_fallback: bool,
}

/// A ledger entry the catalog could not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntry {
    pub entry: EntryId,
    pub error: ResolutionError,
}

/// Everything one batch (or the direct-lookup group) produced
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub batch: usize,
    pub matched: Vec<MatchedCard>,
    pub unresolved: Vec<UnresolvedEntry>,
    pub rekeys: Vec<Rekey>,
}

impl BatchOutcome {
    fn new(batch: usize) -> Self {
        Self {
            batch,
            ..Self::default()
        }
    }
}

type FallbackResult = Result<(MatchedCard, Rekey), UnresolvedEntry>;

pub struct CatalogResolver<'a, C: ?Sized> {
    catalog: &'a C,
    config: &'a ImportConfig,
    log: &'a ImportLog,
}

impl<'a, C: CatalogClient + ?Sized> CatalogResolver<'a, C> {
    pub fn new(catalog: &'a C, config: &'a ImportConfig, log: &'a ImportLog) -> Self {
        Self {
            catalog,
            config,
            log,
        }
    }

    /// Resolve every batch, then the identifier-only rows.
    ///
    /// Outcomes come back ordered by batch index whatever order they finished
    /// in; the direct-lookup group, if any, is last.
    pub async fn resolve_all(
        &self,
        batches: &[Batch],
        ledger: &FinishLedger,
    ) -> Vec<BatchOutcome> {
        let mut outcomes: Vec<BatchOutcome> = stream::iter(batches)
            .map(|batch| self.resolve_batch(batch, ledger))
            .buffer_unordered(self.config.batch_concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|outcome| outcome.batch);

        if ledger.direct_entries().next().is_some() {
            outcomes.push(self.resolve_direct(ledger, batches.len()).await);
        }
        outcomes
    }

    pub async fn resolve_batch(&self, batch: &Batch, ledger: &FinishLedger) -> BatchOutcome {
        let log = self.log.child(format!("batch-{}", batch.index));
        log.info(format_args!(
            "Looking up {} identifiers for {} rows",
            batch.identifiers.len(),
            batch.len()
        ));

        let limit = self.config.request_timeout;
        let lookup = self.catalog.fetch_collection(&batch.identifiers);
        let response = match with_timeout(limit, lookup).await {
            LookupOutcome::Found(response) => response,
            LookupOutcome::NotFound(details) => {
                let error =
                    UpstreamError::Failed(format!("collection lookup not found: {}", details));
                return self.fail_batch(batch, ledger, &log, error);
            }
            LookupOutcome::Failed(e) => {
                let error = UpstreamError::Failed(e.to_string());
                return self.fail_batch(batch, ledger, &log, error);
            }
            LookupOutcome::TimedOut => {
                return self.fail_batch(batch, ledger, &log, UpstreamError::Timeout(limit));
            }
        };

        let mut outcome = BatchOutcome::new(batch.index);
        // rows of this batch still waiting for a card, found through the ledger index
        let mut pending: HashSet<EntryId> = batch.entries.iter().copied().collect();
        let mut claim = |key: &LookupKey| -> Vec<EntryId> {
            ledger
                .entries_for(key)
                .iter()
                .copied()
                .filter(|id| pending.remove(id))
                .collect()
        };

        for card in response.data {
            let key = card.lookup_key();
            let ids = claim(&key);
            if ids.is_empty() {
                log.warn(format_args!(
                    "Ignoring {} ({}): already matched or not requested",
                    card.name, key
                ));
                continue;
            }
            let detail = CardDetail::from_scryfall(card, &log);
            for entry in ids {
                outcome.matched.push(MatchedCard {
                    entry,
                    card: detail.clone(),
                    via_fallback: false,
                });
            }
        }

        let mut fallback_jobs: Vec<&LedgerEntry> = Vec::new();
        for missing in &response.not_found {
            let key = missing.lookup_key();
            let ids = claim(&key);
            if ids.is_empty() {
                log.warn(format_args!("not_found entry {} matches no pending row", key));
            }
            fallback_jobs.extend(ids.into_iter().filter_map(|id| ledger.entry(id)));
        }

        // neither returned nor reported missing
        for &id in batch.entries.iter().filter(|id| pending.contains(*id)) {
            let subject = ledger.entry(id).map(LedgerEntry::label).unwrap_or_default();
            log.error(format_args!("{} missing from catalog response", subject));
            outcome.unresolved.push(UnresolvedEntry {
                entry: id,
                error: ResolutionError::MissingFromResponse { subject },
            });
        }

        if !fallback_jobs.is_empty() {
            log.info(format_args!(
                "{} rows not found, trying fallback lookups",
                fallback_jobs.len()
            ));
        }
        self.run_fallbacks(fallback_jobs, &mut outcome, &log).await;

        log.info(format_args!(
            "{} rows matched, {} unresolved",
            outcome.matched.len(),
            outcome.unresolved.len()
        ));
        outcome
    }

    /// Rows without set/collector number go straight to the single-card lookup
    pub async fn resolve_direct(&self, ledger: &FinishLedger, index: usize) -> BatchOutcome {
        let log = self.log.child("direct");
        let jobs: Vec<&LedgerEntry> = ledger.direct_entries().collect();
        log.info(format_args!("Resolving {} rows by card id", jobs.len()));

        let mut outcome = BatchOutcome::new(index);
        self.run_fallbacks(jobs, &mut outcome, &log).await;
        outcome
    }

    async fn run_fallbacks(
        &self,
        jobs: Vec<&LedgerEntry>,
        outcome: &mut BatchOutcome,
        log: &ImportLog,
    ) {
        let results: Vec<FallbackResult> = stream::iter(jobs)
            .map(|entry| self.fallback(entry, log))
            .buffered(self.config.fallback_concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                Ok((matched, rekey)) => {
                    outcome.matched.push(matched);
                    outcome.rekeys.push(rekey);
                }
                Err(unresolved) => outcome.unresolved.push(unresolved),
            }
        }
    }

    async fn fallback(&self, entry: &LedgerEntry, log: &ImportLog) -> FallbackResult {
        let subject = entry.label();
        let Some(fallback) = entry.item.fallback.as_ref() else {
            log.error(format_args!("{} not found and has no fallback identifier", subject));
            return Err(UnresolvedEntry {
                entry: entry.id,
                error: ResolutionError::NoFallback { subject },
            });
        };

        let limit = self.config.request_timeout;
        let error = match with_timeout(limit, self.catalog.fetch_card(fallback)).await {
            LookupOutcome::Found(card) => {
                let card = CardDetail::from_scryfall(card, log);
                let rekey = Rekey {
                    entry: entry.id,
                    original_key: entry.key.clone(),
                    resolved_key: card.lookup_key(),
                };
                log.info(format_args!(
                    "Fallback {} resolved {} as {}",
                    fallback, subject, rekey.resolved_key
                ));
                let matched = MatchedCard {
                    entry: entry.id,
                    card,
                    via_fallback: true,
                };
                return Ok((matched, rekey));
            }
            LookupOutcome::NotFound(details) => {
                log.error(format_args!(
                    "Error fetching card details for {} via {}: {}",
                    subject, fallback, details
                ));
                ResolutionError::FallbackNotFound {
                    subject,
                    fallback: fallback.to_string(),
                }
            }
            LookupOutcome::Failed(e) => {
                log.error(format_args!(
                    "Error fetching card details for {} via {}: {}",
                    subject, fallback, e
                ));
                ResolutionError::FallbackFailed {
                    subject,
                    fallback: fallback.to_string(),
                    error: UpstreamError::Failed(e.to_string()),
                }
            }
            LookupOutcome::TimedOut => {
                log.error(format_args!(
                    "Fallback {} for {} timed out after {:?}",
                    fallback, subject, limit
                ));
                ResolutionError::FallbackFailed {
                    subject,
                    fallback: fallback.to_string(),
                    error: UpstreamError::Timeout(limit),
                }
            }
        };

        Err(UnresolvedEntry {
            entry: entry.id,
            error,
        })
    }

    fn fail_batch(
        &self,
        batch: &Batch,
        ledger: &FinishLedger,
        log: &ImportLog,
        error: UpstreamError,
    ) -> BatchOutcome {
        log.error(format_args!(
            "Error fetching card details: {}; {} rows unresolved",
            error,
            batch.len()
        ));

        let mut outcome = BatchOutcome::new(batch.index);
        outcome.unresolved = batch
            .entries
            .iter()
            .map(|&id| UnresolvedEntry {
                entry: id,
                error: ResolutionError::BatchFailed {
                    subject: ledger.entry(id).map(LedgerEntry::label).unwrap_or_default(),
                    error: error.clone(),
                },
            })
            .collect();
        outcome
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
