//! Stock ledger storage boundary.
//!
//! One trait covers both the stock counters and the append-only import
//! ledger, so a single backend owns both sides of the conservation
//! invariant. A second, smaller trait exposes the actor directory that the
//! import policy consults.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStockLedger;
pub use postgres::PgStockLedger;
pub use r#trait::{ActorRecord, RoleDirectory, StockDecrement, StockLedgerStore, StoreError};
