//! `eximhub-catalog` — product records listed by exporters.
//!
//! Descriptive fields (name, origin, price, rating) belong to the catalog
//! side; `available_quantity` is the live stock counter and is only ever
//! mutated through the reservation engine.

pub mod product;

pub use product::{ListingDraft, Product};
