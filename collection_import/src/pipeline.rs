//! One reconciliation run: parse, batch, resolve, price, merge

use crate::batcher::make_batches;
use crate::catalog::CatalogClient;
use crate::config::ImportConfig;
use crate::error::Result;
use crate::ledger::FinishLedger;
use crate::log::ImportLog;
use crate::merger::{merge, Reconciliation};
use crate::parser::parse_rows;
use crate::pricing::{price_batch, PricedBatch};
use crate::resolver::CatalogResolver;

/// Runs the reconciliation pipeline against one catalog
pub struct Reconciler<C> {
    catalog: C,
    config: ImportConfig,
    log: ImportLog,
}

impl<C: CatalogClient> Reconciler<C> {
    pub fn new(catalog: C, config: ImportConfig, log: ImportLog) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            log,
        })
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn log(&self) -> &ImportLog {
        &self.log
    }

    /// Reconcile a CSV export into priced cards plus an unmatched report.
    ///
    /// Only an unusable header (or an invalid batch size) is an error; every
    /// row-level problem ends up in the report.
    pub async fn reconcile(&self, input: &str) -> Result<Reconciliation> {
        let log = &self.log;
        let parsed = parse_rows(input, log)?;
        let mut ledger = FinishLedger::from_items(parsed.items);
        let batches = make_batches(&ledger, self.config.batch_size)?;
        log.info(format_args!(
            "{} line items in {} batches",
            ledger.len(),
            batches.len()
        ));

        let resolver = CatalogResolver::new(&self.catalog, &self.config, log);
        let outcomes = resolver.resolve_all(&batches, &ledger).await;

        let mut priced: Vec<PricedBatch> = Vec::with_capacity(outcomes.len());
        for mut outcome in outcomes {
            ledger.record_rekeys(std::mem::take(&mut outcome.rekeys));
            priced.push(price_batch(outcome, &ledger, log));
        }

        Ok(merge(priced, &ledger, parsed.malformed, log))
    }
}
