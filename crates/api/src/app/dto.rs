use serde::Deserialize;

use eximhub_catalog::{ListingDraft, Product};
use eximhub_infra::ActorRecord;
use eximhub_ledger::{ImporterProductSummary, ProductImporterEntry};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ReserveImportRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterActorRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ListProductRequest {
    pub name: String,
    pub origin: String,
    pub price_cents: i64,
    pub rating: Option<u8>,
    pub initial_quantity: i64,
}

impl ListProductRequest {
    pub fn into_draft(self) -> ListingDraft {
        ListingDraft {
            name: self.name,
            origin: self.origin,
            price_cents: self.price_cents,
            rating: self.rating,
            initial_quantity: self.initial_quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub owner: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id.to_string(),
        "owner_id": product.owner_id.to_string(),
        "name": product.name,
        "origin": product.origin,
        "price_cents": product.price_cents,
        "rating": product.rating,
        "available_quantity": product.available_quantity,
        "created_at": product.created_at.to_rfc3339(),
    })
}

pub fn summary_to_json(summary: &ImporterProductSummary) -> serde_json::Value {
    serde_json::json!({
        "product_id": summary.product_id.to_string(),
        "total_quantity": summary.total_quantity,
        "last_imported_at": summary.last_imported_at.to_rfc3339(),
    })
}

pub fn importer_entry_to_json(entry: &ProductImporterEntry) -> serde_json::Value {
    serde_json::json!({
        "importer_id": entry.importer_id.to_string(),
        "quantity": entry.quantity,
        "imported_at": entry.imported_at.to_rfc3339(),
    })
}

pub fn actor_to_json(record: &ActorRecord) -> serde_json::Value {
    serde_json::json!({
        "actor_id": record.actor_id.to_string(),
        "email": record.email,
        "role": record.role.as_str(),
        "registered_at": record.registered_at.to_rfc3339(),
    })
}
