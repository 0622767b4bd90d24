//! Catalog provisioning and actor registration.
//!
//! Deliberately thin: listing a product seeds its stock counter, and from
//! then on every counter mutation goes through the reservation engine.

use chrono::Utc;
use tracing::instrument;

use eximhub_auth::Role;
use eximhub_catalog::{ListingDraft, Product};
use eximhub_core::{ActorId, DomainError, ProductId};

use crate::reservation::EngineError;
use crate::store::{ActorRecord, RoleDirectory, StockLedgerStore};

/// Storefront strip length for `latest_products`.
const LATEST_LIMIT: i64 = 6;

#[derive(Debug, Clone)]
pub struct CatalogService<S, D> {
    store: S,
    directory: D,
}

impl<S, D> CatalogService<S, D> {
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }
}

impl<S, D> CatalogService<S, D>
where
    S: StockLedgerStore,
    D: RoleDirectory,
{
    /// List a new product under `owner`. Only exporters may list.
    #[instrument(skip(self, draft), fields(owner = %owner), err)]
    pub async fn list_product(
        &self,
        owner: ActorId,
        draft: ListingDraft,
    ) -> Result<Product, EngineError> {
        match self.directory.role_of(owner).await? {
            Some(Role::Exporter) => {}
            Some(Role::Importer) => {
                return Err(DomainError::forbidden("exporter capability required").into());
            }
            None => {
                return Err(DomainError::forbidden("actor is not registered").into());
            }
        }

        let product = Product::from_draft(owner, draft, Utc::now())?;
        self.store.insert_product(&product).await?;
        Ok(product)
    }

    /// All products, or only those listed by `owner`.
    pub async fn products(&self, owner: Option<ActorId>) -> Result<Vec<Product>, EngineError> {
        Ok(self.store.list_products(owner).await?)
    }

    /// The six most recently listed products.
    pub async fn latest_products(&self) -> Result<Vec<Product>, EngineError> {
        Ok(self.store.latest_products(LATEST_LIMIT).await?)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, EngineError> {
        match self.store.fetch_product(id).await? {
            Some(product) => Ok(product),
            None => Err(DomainError::not_found(format!("product {id}")).into()),
        }
    }

    /// Register `actor` in the directory, or overwrite its email and role if
    /// it is already there.
    #[instrument(skip(self, email), fields(actor = %actor, role = %role), err)]
    pub async fn register_actor(
        &self,
        actor: ActorId,
        email: String,
        role: Role,
    ) -> Result<ActorRecord, EngineError> {
        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(DomainError::validation("email must not be blank").into());
        }

        let record = ActorRecord {
            actor_id: actor,
            email,
            role,
            registered_at: Utc::now(),
        };
        self.directory.upsert_actor(&record).await?;
        Ok(record)
    }

    pub async fn actor_profile(
        &self,
        actor: ActorId,
    ) -> Result<Option<ActorRecord>, EngineError> {
        Ok(self.directory.fetch_actor(actor).await?)
    }
}
