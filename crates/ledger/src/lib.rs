//! `eximhub-ledger` — the import ledger and its read side.
//!
//! Append-only [`ImportRecord`] entries, the access policy gate consulted
//! before any reservation, and the pure grouping/ordering behind the ledger
//! queries. No IO here.

pub mod policy;
pub mod query;
pub mod record;

pub use policy::authorize_import;
pub use query::{
    ImporterProductSummary, ProductImporterEntry, product_importers, summarize_importer,
};
pub use record::ImportRecord;
