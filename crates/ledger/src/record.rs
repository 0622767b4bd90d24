use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eximhub_core::{ActorId, ImportId, ProductId, Quantity};

/// One ledger entry: an importer took `quantity` units of a product.
///
/// Entries are append-only. The only mutation the ledger permits is the
/// one-way `reversed` flip performed by a release; entries are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: ImportId,
    pub product_id: ProductId,
    pub importer_id: ActorId,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub reversed: bool,
}

impl ImportRecord {
    /// Build a fresh (active) entry. Positivity of the amount is carried by
    /// the [`Quantity`] argument.
    pub fn new(
        product_id: ProductId,
        importer_id: ActorId,
        quantity: Quantity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ImportId::new(),
            product_id,
            importer_id,
            quantity: quantity.get(),
            created_at,
            reversed: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.reversed
    }
}
