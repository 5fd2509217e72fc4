//! Tests for catalog resolution

use super::*;
use crate::batcher::make_batches;
use crate::models::LineItem;
use crate::test_support::{line_item, scryfall_card, MockCatalog};
use mtg_common::{FallbackId, Finish};
use std::time::Duration;

fn config() -> ImportConfig {
    ImportConfig {
        request_timeout: Duration::from_millis(200),
        ..ImportConfig::sequential()
    }
}

fn log() -> ImportLog {
    ImportLog::process("resolver-test")
}

fn with_fallback(mut item: LineItem, fallback: FallbackId) -> LineItem {
    item.fallback = Some(fallback);
    item
}

async fn resolve(
    catalog: &MockCatalog,
    config: &ImportConfig,
    items: Vec<LineItem>,
) -> (FinishLedger, Vec<BatchOutcome>) {
    let ledger = FinishLedger::from_items(items);
    let batches = make_batches(&ledger, config.batch_size).unwrap();
    let log = log();
    let resolver = CatalogResolver::new(catalog, config, &log);
    let outcomes = resolver.resolve_all(&batches, &ledger).await;
    (ledger, outcomes)
}

#[tokio::test]
async fn all_found_batch_matches_every_row() {
    let catalog = MockCatalog::default()
        .with_card(scryfall_card(
            "XYZ",
            "001",
            "Alpha",
            &["nonfoil", "foil"],
            [Some("1.00"), Some("2.00"), None],
        ))
        .with_card(scryfall_card(
            "XYZ",
            "002",
            "Beta",
            &["nonfoil", "foil"],
            [Some("0.50"), Some("3.00"), None],
        ));

    let (_, outcomes) = resolve(
        &catalog,
        &config(),
        vec![
            line_item("XYZ", "001", Finish::Nonfoil, 2),
            line_item("XYZ", "002", Finish::Foil, 1),
        ],
    )
    .await;

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.matched.len(), 2);
    assert!(outcome.unresolved.is_empty());
    assert_eq!(outcome.matched[0].card.name, "Alpha");
    assert_eq!(outcome.matched[1].entry, 1);
    assert!(!outcome.matched[0].via_fallback);
    assert_eq!(catalog.collection_calls(), 1);
    assert_eq!(catalog.card_calls(), 0);
}

#[tokio::test]
async fn not_found_row_is_resolved_by_fallback_and_rekeyed() {
    let fallback = FallbackId::CatalogId("uuid-42".to_string());
    // catalog knows the card as collector number "1", export says "001"
    let catalog = MockCatalog::default().with_fallback(
        fallback.clone(),
        scryfall_card("XYZ", "1", "Gamma", &["nonfoil", "foil"], [Some("1.00"), None, None]),
    );

    let (ledger, outcomes) = resolve(
        &catalog,
        &config(),
        vec![with_fallback(line_item("XYZ", "001", Finish::Foil, 3), fallback)],
    )
    .await;

    let outcome = &outcomes[0];
    assert_eq!(outcome.matched.len(), 1);
    assert!(outcome.matched[0].via_fallback);
    assert_eq!(outcome.matched[0].card.collector_number, "1");
    assert_eq!(
        outcome.rekeys,
        vec![Rekey {
            entry: 0,
            original_key: Some(LookupKey::new("XYZ", "001")),
            resolved_key: LookupKey::new("XYZ", "1"),
        }]
    );
    // requested finish and quantity stay with the entry
    let entry = ledger.entry(outcome.matched[0].entry).unwrap();
    assert_eq!(entry.item.requested_finish, Finish::Foil);
    assert_eq!(entry.item.quantity, 3);
    assert_eq!(catalog.card_calls(), 1);
}

#[tokio::test]
async fn failed_fallback_leaves_row_unresolved() {
    let catalog = MockCatalog::default();

    let (_, outcomes) = resolve(
        &catalog,
        &config(),
        vec![with_fallback(
            line_item("XYZ", "404", Finish::Nonfoil, 2),
            FallbackId::ExternalId(77),
        )],
    )
    .await;

    let outcome = &outcomes[0];
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.unresolved.len(), 1);
    assert!(matches!(
        &outcome.unresolved[0].error,
        ResolutionError::FallbackNotFound { fallback, .. } if fallback == "tcgplayer:77"
    ));
}

#[tokio::test]
async fn row_without_fallback_is_unresolved_without_extra_call() {
    let catalog = MockCatalog::default();

    let items = vec![line_item("XYZ", "404", Finish::Nonfoil, 1)];
    let (_, outcomes) = resolve(&catalog, &config(), items).await;

    assert!(matches!(
        outcomes[0].unresolved[0].error,
        ResolutionError::NoFallback { .. }
    ));
    assert_eq!(catalog.card_calls(), 0);
}

#[tokio::test]
async fn failed_batch_marks_every_row_unresolved() {
    let catalog = MockCatalog::default()
        .with_card(scryfall_card("XYZ", "001", "Alpha", &["nonfoil"], [None, None, None]))
        .failing();

    let (_, outcomes) = resolve(
        &catalog,
        &config(),
        vec![
            line_item("XYZ", "001", Finish::Nonfoil, 1),
            with_fallback(line_item("XYZ", "002", Finish::Nonfoil, 1), FallbackId::ExternalId(5)),
        ],
    )
    .await;

    let outcome = &outcomes[0];
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.unresolved.len(), 2);
    for unresolved in &outcome.unresolved {
        assert!(matches!(
            &unresolved.error,
            ResolutionError::BatchFailed {
                error: UpstreamError::Failed(msg),
                ..
            } if msg.contains("500")
        ));
    }
    // no fallbacks for a failed batch
    assert_eq!(catalog.card_calls(), 0);
}

#[tokio::test]
async fn slow_batch_times_out_and_run_continues() {
    let catalog = MockCatalog::default().slow(Duration::from_secs(5));
    let config = ImportConfig {
        request_timeout: Duration::from_millis(50),
        ..ImportConfig::sequential()
    };

    let items = vec![line_item("XYZ", "001", Finish::Nonfoil, 1)];
    let (_, outcomes) = resolve(&catalog, &config, items).await;

    assert!(matches!(
        outcomes[0].unresolved[0].error,
        ResolutionError::BatchFailed {
            error: UpstreamError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn row_missing_from_response_is_unresolved() {
    let catalog = MockCatalog::default()
        .with_card(scryfall_card("XYZ", "001", "Alpha", &["nonfoil"], [None, None, None]))
        .omitting(LookupKey::new("XYZ", "002"));

    let (_, outcomes) = resolve(
        &catalog,
        &config(),
        vec![
            line_item("XYZ", "001", Finish::Nonfoil, 1),
            line_item("XYZ", "002", Finish::Nonfoil, 1),
        ],
    )
    .await;

    assert_eq!(outcomes[0].matched.len(), 1);
    assert_eq!(outcomes[0].unresolved[0].entry, 1);
    assert!(matches!(
        outcomes[0].unresolved[0].error,
        ResolutionError::MissingFromResponse { .. }
    ));
}

#[tokio::test]
async fn rows_sharing_a_key_each_get_the_card() {
    let catalog = MockCatalog::default().with_card(scryfall_card(
        "XYZ",
        "001",
        "Alpha",
        &["nonfoil", "foil"],
        [None, None, None],
    ));

    let (_, outcomes) = resolve(
        &catalog,
        &config(),
        vec![
            line_item("XYZ", "001", Finish::Nonfoil, 1),
            line_item("XYZ", "001", Finish::Foil, 2),
        ],
    )
    .await;

    let entries: Vec<EntryId> = outcomes[0].matched.iter().map(|m| m.entry).collect();
    assert_eq!(entries, vec![0, 1]);
    assert_eq!(catalog.batch_sizes.lock().unwrap().as_slice(), &[1]);
}

#[tokio::test]
async fn concurrent_batches_come_back_in_batch_order() {
    let mut catalog = MockCatalog::default();
    let mut items = Vec::new();
    for i in 0..200 {
        let cn = i.to_string();
        let card = scryfall_card("XYZ", &cn, "Bulk", &["nonfoil"], [Some("0.10"), None, None]);
        catalog = catalog.with_card(card);
        items.push(line_item("XYZ", &cn, Finish::Nonfoil, 1));
    }
    let config = ImportConfig {
        batch_concurrency: 3,
        fallback_concurrency: 3,
        ..config()
    };

    let (_, outcomes) = resolve(&catalog, &config, items).await;

    let order: Vec<usize> = outcomes.iter().map(|o| o.batch).collect();
    assert_eq!(order, vec![0, 1, 2]);
    let matched: usize = outcomes.iter().map(|o| o.matched.len()).sum();
    assert_eq!(matched, 200);
    assert_eq!(outcomes[2].matched[0].entry, 150);
    assert_eq!(catalog.collection_calls(), 3);
}

#[tokio::test]
async fn identifier_only_rows_resolve_after_batches() {
    let fallback = FallbackId::ExternalId(9);
    let catalog = MockCatalog::default()
        .with_card(scryfall_card("XYZ", "001", "Alpha", &["nonfoil"], [None, None, None]))
        .with_fallback(
            fallback.clone(),
            scryfall_card("ABC", "7", "Delta", &["nonfoil"], [None, None, None]),
        );

    let mut direct = line_item("ABC", "7", Finish::Nonfoil, 1);
    direct.set_code = None;
    direct.collector_number = None;
    direct.fallback = Some(fallback);

    let (_, outcomes) = resolve(
        &catalog,
        &config(),
        vec![direct, line_item("XYZ", "001", Finish::Nonfoil, 1)],
    )
    .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].matched[0].entry, 1);
    assert_eq!(outcomes[1].batch, 1);
    assert_eq!(outcomes[1].matched[0].entry, 0);
    assert_eq!(outcomes[1].rekeys[0].original_key, None);
}

#[tokio::test]
async fn slow_fallback_times_out_and_row_is_unresolved() {
    let fallback = FallbackId::ExternalId(31);
    let catalog = MockCatalog::default()
        .with_fallback(
            fallback.clone(),
            scryfall_card("XYZ", "1", "Gamma", &["nonfoil"], [None, None, None]),
        )
        .slow_fallback(Duration::from_secs(5));
    let config = ImportConfig {
        request_timeout: Duration::from_millis(50),
        ..ImportConfig::sequential()
    };

    let items = vec![with_fallback(line_item("XYZ", "001", Finish::Nonfoil, 2), fallback)];
    let (_, outcomes) = resolve(&catalog, &config, items).await;

    assert!(outcomes[0].matched.is_empty());
    assert!(outcomes[0].rekeys.is_empty());
    assert!(matches!(
        &outcomes[0].unresolved[0].error,
        ResolutionError::FallbackFailed {
            fallback,
            error: UpstreamError::Timeout(_),
            ..
        } if fallback == "tcgplayer:31"
    ));
    assert_eq!(catalog.card_calls(), 1);
}

#[tokio::test]
async fn shared_key_split_across_batches_matches_only_own_rows() {
    let catalog = MockCatalog::default().with_card(scryfall_card(
        "XYZ",
        "001",
        "Alpha",
        &["nonfoil", "foil"],
        [None, None, None],
    ));
    let config = ImportConfig {
        batch_size: 1,
        ..config()
    };

    let (ledger, outcomes) = resolve(
        &catalog,
        &config,
        vec![
            line_item("XYZ", "001", Finish::Nonfoil, 1),
            line_item("XYZ", "001", Finish::Foil, 2),
        ],
    )
    .await;

    assert_eq!(ledger.entries_for(&LookupKey::new("XYZ", "001")), &[0, 1]);
    assert_eq!(outcomes.len(), 2);
    for (index, outcome) in outcomes.iter().enumerate() {
        let entries: Vec<EntryId> = outcome.matched.iter().map(|m| m.entry).collect();
        assert_eq!(entries, vec![index]);
        assert!(outcome.unresolved.is_empty());
    }
}
