//! Collection service: the operations the CLI exposes

use crate::catalog::CatalogClient;
use crate::error::{ImportError, Result, StoreError};
use crate::merger::UnmatchedReport;
use crate::models::{Collection, CollectionTotals, ResolvedCard};
use crate::pipeline::Reconciler;
use crate::store::CollectionStore;
use serde::Serialize;

/// Outcome of importing one export into a collection
#[derive(Debug)]
pub struct ImportSummary {
    pub collection: Collection,
    pub stored_cards: usize,
    /// Totals of the cards added by this import
    pub totals: CollectionTotals,
    pub report: UnmatchedReport,
}

impl ImportSummary {
    pub fn error_count(&self) -> usize {
        self.report.error_count()
    }
}

/// A collection with its cards and totals
#[derive(Debug, Serialize)]
pub struct CollectionView {
    pub collection: Collection,
    pub cards: Vec<ResolvedCard>,
    pub totals: CollectionTotals,
}

/// Collections of one owner, backed by a store and a catalog
pub struct CollectionService<C, S> {
    reconciler: Reconciler<C>,
    store: S,
    owner: String,
}

impl<C: CatalogClient, S: CollectionStore> CollectionService<C, S> {
    pub fn new(reconciler: Reconciler<C>, store: S, owner: impl Into<String>) -> Self {
        Self {
            reconciler,
            store,
            owner: owner.into(),
        }
    }

    pub fn create_collection(&mut self, name: &str) -> Result<Collection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ImportError::MalformedInput(
                "collection name is empty".to_string(),
            ));
        }
        Ok(self.store.create_collection(&self.owner, name)?)
    }

    fn require(&self, name: &str) -> Result<Collection> {
        self.store
            .get_collection_by_name(&self.owner, name.trim())?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()).into())
    }

    /// Reconcile an export and add the resolved cards to an existing collection.
    ///
    /// Nothing is stored when the input as a whole is rejected.
    pub async fn import_csv(&mut self, name: &str, input: &str) -> Result<ImportSummary> {
        let collection = self.require(name)?;
        let log = self.reconciler.log().child(format!("import-{}", collection.name));
        log.info(format_args!("Importing into collection '{}'", collection.name));

        let reconciliation = self.reconciler.reconcile(input).await?;
        let totals = reconciliation.totals();
        let (cards, report) = reconciliation.into_parts();
        let stored_cards = self.store.create_cards(&cards, &collection)?;

        if report.error_count() > 0 || !report.malformed.is_empty() {
            log.warn(format_args!(
                "{} rows not imported, {} rows malformed",
                report.error_count(),
                report.malformed.len()
            ));
        }
        log.info(format_args!(
            "Stored {} cards worth {} in '{}'",
            totals.card_count, totals.total_value, collection.name
        ));

        Ok(ImportSummary {
            collection,
            stored_cards,
            totals,
            report,
        })
    }

    pub fn get_collection(&self, name: &str) -> Result<CollectionView> {
        let collection = self.require(name)?;
        self.view(collection)
    }

    /// Every collection of the owner with its cards and totals, by name
    pub fn get_all_collections(&self) -> Result<Vec<CollectionView>> {
        self.store
            .list_collections(&self.owner)?
            .into_iter()
            .map(|collection| self.view(collection))
            .collect()
    }

    fn view(&self, collection: Collection) -> Result<CollectionView> {
        let cards = self.store.cards_in_collection(&collection)?;
        let totals = CollectionTotals::from_cards(&cards);
        Ok(CollectionView {
            collection,
            cards,
            totals,
        })
    }

    /// Remove every card; returns how many rows were removed
    pub fn clear_collection(&mut self, name: &str) -> Result<usize> {
        let collection = self.require(name)?;
        Ok(self.store.clear_collection(&collection)?)
    }

    pub fn delete_collection(&mut self, name: &str) -> Result<()> {
        let collection = self.require(name)?;
        Ok(self.store.delete_collection(&collection)?)
    }
}
