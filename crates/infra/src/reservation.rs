//! Reserve/release choreography over the stock ledger.
//!
//! A reservation is two writes with no transaction spanning them: a
//! conditional decrement of the stock counter, then an append to the import
//! ledger. The engine owns the ordering and the compensation that keeps the
//! pair honest. At every quiescent point,
//!
//! ```text
//! initial_stock = available_quantity + sum(active import quantities)
//! ```
//!
//! holds for each product. The engine keeps no state of its own beyond the
//! compensation budget, so any number of processes can run engines against
//! the same database.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, instrument, warn};

use eximhub_core::{ActorId, DomainError, ImportId, ProductId, Quantity};
use eximhub_ledger::{ImportRecord, authorize_import};

use crate::store::{RoleDirectory, StockDecrement, StockLedgerStore, StoreError};

/// Failure from an engine operation: either the domain said no, or the
/// storage layer did.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a successful reservation hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveReceipt {
    pub import: ImportRecord,
    /// Counter value produced by the decrement itself, not a later read.
    pub remaining_stock: i64,
}

const DEFAULT_RETRY_BUDGET: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Coordinates reserve and release against a [`StockLedgerStore`] and a
/// [`RoleDirectory`].
#[derive(Debug, Clone)]
pub struct ReservationEngine<S, D> {
    store: S,
    directory: D,
    retry_budget: u32,
    retry_backoff: Duration,
}

impl<S, D> ReservationEngine<S, D> {
    pub fn new(store: S, directory: D) -> Self {
        Self {
            store,
            directory,
            retry_budget: DEFAULT_RETRY_BUDGET,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Number of credit attempts made when a compensation is needed.
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

impl<S, D> ReservationEngine<S, D>
where
    S: StockLedgerStore,
    D: RoleDirectory,
{
    /// Reserve `quantity` units of `product_id` for `actor`.
    ///
    /// Order of checks: quantity validation, product existence, import
    /// policy, then the conditional decrement. The ledger append happens only
    /// after the decrement lands; if the append then fails, the decrement is
    /// compensated and the append failure is what the caller sees.
    #[instrument(skip(self), fields(product_id = %product_id, quantity, actor = %actor), err)]
    pub async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i64,
        actor: ActorId,
    ) -> Result<ReserveReceipt, EngineError> {
        let quantity = Quantity::new(quantity)?;

        let product = self
            .store
            .fetch_product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

        let role = self.directory.role_of(actor).await?;
        authorize_import(&product, actor, role)?;

        let remaining = match self
            .store
            .try_decrement_stock(product_id, quantity.get())
            .await?
        {
            StockDecrement::Applied { remaining } => remaining,
            StockDecrement::Insufficient { available } => {
                return Err(DomainError::insufficient_stock(quantity.get(), available).into());
            }
            // Deleted between the fetch above and the decrement.
            StockDecrement::Missing => {
                return Err(DomainError::not_found(format!("product {product_id}")).into());
            }
        };

        let record = ImportRecord::new(product_id, actor, quantity, Utc::now());
        if let Err(append_err) = self.store.append_import(&record).await {
            return Err(self
                .compensate_failed_append(product_id, quantity.get(), append_err)
                .await);
        }

        Ok(ReserveReceipt {
            import: record,
            remaining_stock: remaining,
        })
    }

    /// Release a previously reserved import, restoring its quantity to the
    /// product's stock.
    ///
    /// Only the importing actor may release, and only once: the reversal flag
    /// flip is the linearization point, so of any number of concurrent
    /// releases exactly one proceeds to the credit.
    #[instrument(skip(self), fields(import_id = %import_id, actor = %actor), err)]
    pub async fn release(&self, import_id: ImportId, actor: ActorId) -> Result<(), EngineError> {
        let record = self
            .store
            .fetch_import(import_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("import {import_id}")))?;

        if record.importer_id != actor {
            return Err(
                DomainError::forbidden("only the importing actor may release an import").into(),
            );
        }
        if record.reversed {
            return Err(DomainError::AlreadyReversed.into());
        }

        if !self.store.mark_reversed_if_active(import_id).await? {
            // Lost the race to another release of the same import.
            return Err(DomainError::AlreadyReversed.into());
        }

        self.restore_released_stock(&record).await
    }

    /// The decrement landed but the ledger append did not: put the stock
    /// back, then surface the append failure. `InconsistentState` only when
    /// the credit budget runs out with the units still missing.
    async fn compensate_failed_append(
        &self,
        product_id: ProductId,
        amount: i64,
        append_err: StoreError,
    ) -> EngineError {
        for attempt in 1..=self.retry_budget {
            match self.store.credit_stock(product_id, amount).await {
                Ok(true) => {
                    warn!(
                        product_id = %product_id,
                        amount,
                        error = %append_err,
                        "ledger append failed; stock restored"
                    );
                    return append_err.into();
                }
                Ok(false) => {
                    // Product removed mid-flight; no counter left to restore.
                    warn!(
                        product_id = %product_id,
                        amount,
                        error = %append_err,
                        "ledger append failed and product row is gone"
                    );
                    return append_err.into();
                }
                Err(credit_err) => {
                    warn!(
                        product_id = %product_id,
                        amount,
                        attempt,
                        error = %credit_err,
                        "stock compensation attempt failed"
                    );
                    if attempt < self.retry_budget {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                }
            }
        }

        error!(
            product_id = %product_id,
            amount,
            "compensation budget exhausted; counter and ledger have diverged"
        );
        DomainError::inconsistent(format!(
            "failed to restore {amount} units to product {product_id} after ledger append failure"
        ))
        .into()
    }

    /// Credit a released import's quantity back to the product.
    ///
    /// The reversal flag stays set whatever happens here: un-flipping it
    /// would hand a concurrent release a shot at a double credit.
    async fn restore_released_stock(&self, record: &ImportRecord) -> Result<(), EngineError> {
        for attempt in 1..=self.retry_budget {
            match self
                .store
                .credit_stock(record.product_id, record.quantity)
                .await
            {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    error!(
                        import_id = %record.id,
                        product_id = %record.product_id,
                        quantity = record.quantity,
                        "released import references a product that no longer exists"
                    );
                    return Err(DomainError::inconsistent(format!(
                        "import {} reversed but product {} is gone, {} units unrestored",
                        record.id, record.product_id, record.quantity
                    ))
                    .into());
                }
                Err(credit_err) => {
                    warn!(
                        import_id = %record.id,
                        product_id = %record.product_id,
                        attempt,
                        error = %credit_err,
                        "stock restoration attempt failed"
                    );
                    if attempt < self.retry_budget {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                }
            }
        }

        error!(
            import_id = %record.id,
            product_id = %record.product_id,
            quantity = record.quantity,
            "restoration budget exhausted; import reversed but stock not credited"
        );
        Err(DomainError::inconsistent(format!(
            "import {} reversed but {} units were not restored to product {}",
            record.id, record.quantity, record.product_id
        ))
        .into())
    }
}
