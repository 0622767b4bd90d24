//! Infrastructure layer: storage backends plus the reservation choreography
//! that runs on top of them.

pub mod catalog_service;
pub mod query;
pub mod reservation;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use catalog_service::CatalogService;
pub use query::LedgerQueries;
pub use reservation::{EngineError, ReservationEngine, ReserveReceipt};
pub use store::{
    ActorRecord, InMemoryStockLedger, PgStockLedger, RoleDirectory, StockDecrement,
    StockLedgerStore, StoreError,
};
