use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use eximhub_auth::Role;
use eximhub_catalog::Product;
use eximhub_core::{ActorId, ImportId, ProductId};
use eximhub_ledger::ImportRecord;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Anything else the backend reports (connection, pool, row decoding).
    #[error("{0}")]
    Backend(String),
}

/// Outcome of the conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// The subtraction landed; `remaining` is the counter value it produced.
    Applied { remaining: i64 },
    /// The counter would have gone negative; `available` is its value at the
    /// time the precondition was evaluated.
    Insufficient { available: i64 },
    /// No product row with that id.
    Missing,
}

/// A registered actor as the directory stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub actor_id: ActorId,
    pub email: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

/// Storage for products, their stock counters, and the import ledger.
///
/// `try_decrement_stock` and `mark_reversed_if_active` are the two
/// concurrency-sensitive operations: implementations must evaluate the
/// precondition and apply the mutation as one atomic step, never as a read
/// followed by a write.
#[async_trait]
pub trait StockLedgerStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// All products, optionally restricted to one owner, newest first.
    async fn list_products(&self, owner: Option<ActorId>) -> Result<Vec<Product>, StoreError>;

    async fn latest_products(&self, limit: i64) -> Result<Vec<Product>, StoreError>;

    /// Subtract `amount` from the stock counter only if it stays
    /// non-negative.
    async fn try_decrement_stock(
        &self,
        id: ProductId,
        amount: i64,
    ) -> Result<StockDecrement, StoreError>;

    /// Add `amount` back to the stock counter. Returns `false` when the
    /// product row no longer exists.
    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<bool, StoreError>;

    async fn append_import(&self, record: &ImportRecord) -> Result<(), StoreError>;

    async fn fetch_import(&self, id: ImportId) -> Result<Option<ImportRecord>, StoreError>;

    /// Flip `reversed` to true only where it is still false. Returns `false`
    /// when the record was already reversed or does not exist.
    async fn mark_reversed_if_active(&self, id: ImportId) -> Result<bool, StoreError>;

    async fn imports_by_importer(
        &self,
        importer: ActorId,
    ) -> Result<Vec<ImportRecord>, StoreError>;

    async fn imports_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ImportRecord>, StoreError>;
}

#[async_trait]
impl<S> StockLedgerStore for Arc<S>
where
    S: StockLedgerStore + ?Sized,
{
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        (**self).insert_product(product).await
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).fetch_product(id).await
    }

    async fn list_products(&self, owner: Option<ActorId>) -> Result<Vec<Product>, StoreError> {
        (**self).list_products(owner).await
    }

    async fn latest_products(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        (**self).latest_products(limit).await
    }

    async fn try_decrement_stock(
        &self,
        id: ProductId,
        amount: i64,
    ) -> Result<StockDecrement, StoreError> {
        (**self).try_decrement_stock(id, amount).await
    }

    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<bool, StoreError> {
        (**self).credit_stock(id, amount).await
    }

    async fn append_import(&self, record: &ImportRecord) -> Result<(), StoreError> {
        (**self).append_import(record).await
    }

    async fn fetch_import(&self, id: ImportId) -> Result<Option<ImportRecord>, StoreError> {
        (**self).fetch_import(id).await
    }

    async fn mark_reversed_if_active(&self, id: ImportId) -> Result<bool, StoreError> {
        (**self).mark_reversed_if_active(id).await
    }

    async fn imports_by_importer(
        &self,
        importer: ActorId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        (**self).imports_by_importer(importer).await
    }

    async fn imports_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        (**self).imports_for_product(product).await
    }
}

/// Lookup and registration for actors and their capabilities.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Insert or overwrite, keyed by actor id. Re-registration replaces the
    /// email and role in place.
    async fn upsert_actor(&self, record: &ActorRecord) -> Result<(), StoreError>;

    async fn fetch_actor(&self, actor: ActorId) -> Result<Option<ActorRecord>, StoreError>;

    /// `None` when the directory has no entry for the actor.
    async fn role_of(&self, actor: ActorId) -> Result<Option<Role>, StoreError>;
}

#[async_trait]
impl<D> RoleDirectory for Arc<D>
where
    D: RoleDirectory + ?Sized,
{
    async fn upsert_actor(&self, record: &ActorRecord) -> Result<(), StoreError> {
        (**self).upsert_actor(record).await
    }

    async fn fetch_actor(&self, actor: ActorId) -> Result<Option<ActorRecord>, StoreError> {
        (**self).fetch_actor(actor).await
    }

    async fn role_of(&self, actor: ActorId) -> Result<Option<Role>, StoreError> {
        (**self).role_of(actor).await
    }
}
