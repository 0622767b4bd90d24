use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use eximhub_auth::Role;
use eximhub_catalog::Product;
use eximhub_core::{ActorId, ImportId, ProductId};
use eximhub_ledger::ImportRecord;

use super::r#trait::{ActorRecord, RoleDirectory, StockDecrement, StockLedgerStore, StoreError};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    imports: HashMap<ImportId, ImportRecord>,
    actors: HashMap<ActorId, ActorRecord>,
}

/// In-memory stock ledger and actor directory.
///
/// Used for tests and for running without `DATABASE_URL`. A single
/// process-wide lock stands in for the database's row-level atomicity, so the
/// conditional decrement and the reversal flip keep their check-then-mutate
/// guarantees here too.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    state: RwLock<State>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("state lock poisoned".to_string())
}

#[async_trait]
impl StockLedgerStore for InMemoryStockLedger {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.products.get(&id).cloned())
    }

    async fn list_products(&self, owner: Option<ActorId>) -> Result<Vec<Product>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| owner.is_none_or(|o| p.owner_id == o))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn latest_products(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        let mut products = self.list_products(None).await?;
        products.truncate(limit.max(0) as usize);
        Ok(products)
    }

    async fn try_decrement_stock(
        &self,
        id: ProductId,
        amount: i64,
    ) -> Result<StockDecrement, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        match state.products.get_mut(&id) {
            Some(product) if product.available_quantity >= amount => {
                product.available_quantity -= amount;
                Ok(StockDecrement::Applied {
                    remaining: product.available_quantity,
                })
            }
            Some(product) => Ok(StockDecrement::Insufficient {
                available: product.available_quantity,
            }),
            None => Ok(StockDecrement::Missing),
        }
    }

    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        match state.products.get_mut(&id) {
            Some(product) => {
                product.available_quantity += amount;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn append_import(&self, record: &ImportRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.imports.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!(
                "import {} already exists",
                record.id
            )));
        }
        state.imports.insert(record.id, record.clone());
        Ok(())
    }

    async fn fetch_import(&self, id: ImportId) -> Result<Option<ImportRecord>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.imports.get(&id).cloned())
    }

    async fn mark_reversed_if_active(&self, id: ImportId) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        match state.imports.get_mut(&id) {
            Some(record) if !record.reversed => {
                record.reversed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn imports_by_importer(
        &self,
        importer: ActorId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .imports
            .values()
            .filter(|r| r.importer_id == importer)
            .cloned()
            .collect())
    }

    async fn imports_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .imports
            .values()
            .filter(|r| r.product_id == product)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RoleDirectory for InMemoryStockLedger {
    async fn upsert_actor(&self, record: &ActorRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let duplicate_email = state
            .actors
            .values()
            .any(|a| a.email == record.email && a.actor_id != record.actor_id);
        if duplicate_email {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                record.email
            )));
        }
        state.actors.insert(record.actor_id, record.clone());
        Ok(())
    }

    async fn fetch_actor(&self, actor: ActorId) -> Result<Option<ActorRecord>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.actors.get(&actor).cloned())
    }

    async fn role_of(&self, actor: ActorId) -> Result<Option<Role>, StoreError> {
        Ok(self.fetch_actor(actor).await?.map(|a| a.role))
    }
}
