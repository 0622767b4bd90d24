use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eximhub_core::{ActorId, ProductId};

use crate::record::ImportRecord;

/// One row of an importer's grouped ledger view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterProductSummary {
    pub product_id: ProductId,
    pub total_quantity: i64,
    pub last_imported_at: DateTime<Utc>,
}

/// One row of a product's importer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImporterEntry {
    pub importer_id: ActorId,
    pub quantity: i64,
    pub imported_at: DateTime<Utc>,
}

/// Group an importer's records by product: total active quantity plus the
/// most recent import time, ordered most-recent-first.
///
/// Reversed records do not contribute. Both storage backends feed this same
/// function, so grouping behavior cannot drift between them.
pub fn summarize_importer(records: &[ImportRecord]) -> Vec<ImporterProductSummary> {
    let mut by_product: HashMap<ProductId, (i64, DateTime<Utc>)> = HashMap::new();
    for record in records.iter().filter(|r| r.is_active()) {
        let entry = by_product
            .entry(record.product_id)
            .or_insert((0, record.created_at));
        entry.0 += record.quantity;
        if record.created_at > entry.1 {
            entry.1 = record.created_at;
        }
    }

    let mut summaries: Vec<ImporterProductSummary> = by_product
        .into_iter()
        .map(
            |(product_id, (total_quantity, last_imported_at))| ImporterProductSummary {
                product_id,
                total_quantity,
                last_imported_at,
            },
        )
        .collect();
    summaries.sort_by(|a, b| b.last_imported_at.cmp(&a.last_imported_at));
    summaries
}

/// Flatten a product's active records into (importer, quantity, when) rows,
/// most recent first.
pub fn product_importers(records: &[ImportRecord]) -> Vec<ProductImporterEntry> {
    let mut entries: Vec<ProductImporterEntry> = records
        .iter()
        .filter(|r| r.is_active())
        .map(|r| ProductImporterEntry {
            importer_id: r.importer_id,
            quantity: r.quantity,
            imported_at: r.created_at,
        })
        .collect();
    entries.sort_by(|a, b| b.imported_at.cmp(&a.imported_at));
    entries
}
