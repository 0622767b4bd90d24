//! Read side of the import ledger.
//!
//! Fetches raw records from the store and hands grouping and ordering to the
//! pure functions in `eximhub_ledger::query`, so the in-memory and Postgres
//! backends answer queries through the same code path. Results reflect
//! committed records at fetch time and may trail in-flight reserves by a
//! moment.

use tracing::instrument;

use eximhub_core::{ActorId, DomainError, ProductId};
use eximhub_ledger::{ImporterProductSummary, ProductImporterEntry, product_importers, summarize_importer};

use crate::reservation::EngineError;
use crate::store::StockLedgerStore;

/// Ledger queries over any [`StockLedgerStore`].
#[derive(Debug, Clone)]
pub struct LedgerQueries<S> {
    store: S,
}

impl<S> LedgerQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> LedgerQueries<S>
where
    S: StockLedgerStore,
{
    /// Active imports by `importer`, grouped per product, most recent first.
    #[instrument(skip(self), fields(importer = %importer), err)]
    pub async fn imports_by_importer(
        &self,
        importer: ActorId,
    ) -> Result<Vec<ImporterProductSummary>, EngineError> {
        let records = self.store.imports_by_importer(importer).await?;
        Ok(summarize_importer(&records))
    }

    /// Active imports of `product_id`, one entry per import, most recent
    /// first. Errors with `NotFound` when the product does not exist, as
    /// opposed to an empty answer for a product nobody has imported.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn importers_of_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImporterEntry>, EngineError> {
        if self.store.fetch_product(product_id).await?.is_none() {
            return Err(DomainError::not_found(format!("product {product_id}")).into());
        }
        let records = self.store.imports_for_product(product_id).await?;
        Ok(product_importers(&records))
    }
}
