use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use eximhub_infra::{
    CatalogService, InMemoryStockLedger, LedgerQueries, PgStockLedger, ReservationEngine,
    RoleDirectory, StockLedgerStore,
};

pub type DynStore = Arc<dyn StockLedgerStore>;
pub type DynDirectory = Arc<dyn RoleDirectory>;

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub engine: ReservationEngine<DynStore, DynDirectory>,
    pub queries: LedgerQueries<DynStore>,
    pub catalog: CatalogService<DynStore, DynDirectory>,
}

impl AppServices {
    /// Wire all services over one backend that plays both store roles.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: StockLedgerStore + RoleDirectory + 'static,
    {
        let store: DynStore = backend.clone();
        let directory: DynDirectory = backend;
        Self {
            engine: ReservationEngine::new(store.clone(), directory.clone()),
            queries: LedgerQueries::new(store.clone()),
            catalog: CatalogService::new(store, directory),
        }
    }
}

/// Pick the storage backend from the environment: Postgres when
/// `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_services() -> anyhow::Result<AppServices> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPoolOptions::new().max_connections(16).connect(&url).await?;
            let ledger = PgStockLedger::new(pool);
            ledger.migrate().await?;
            tracing::info!("using postgres stock ledger");
            Ok(AppServices::from_backend(Arc::new(ledger)))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; using in-memory stock ledger");
            Ok(AppServices::from_backend(Arc::new(InMemoryStockLedger::new())))
        }
    }
}
