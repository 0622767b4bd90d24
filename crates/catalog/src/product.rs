use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eximhub_core::{ActorId, DomainError, DomainResult, ProductId};

/// A listed product.
///
/// `available_quantity` starts at the listed stock and never goes negative.
/// Everything else is descriptive and immutable once listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub owner_id: ActorId,
    pub name: String,
    pub origin: String,
    pub price_cents: i64,
    pub rating: Option<u8>,
    pub available_quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for listing a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub name: String,
    pub origin: String,
    pub price_cents: i64,
    pub rating: Option<u8>,
    pub initial_quantity: i64,
}

impl Product {
    /// Validate a draft and turn it into a listed product.
    pub fn from_draft(
        owner_id: ActorId,
        draft: ListingDraft,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if draft.origin.trim().is_empty() {
            return Err(DomainError::validation("origin cannot be empty"));
        }
        if draft.price_cents < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if let Some(rating) = draft.rating {
            if !(1..=5).contains(&rating) {
                return Err(DomainError::validation("rating must be between 1 and 5"));
            }
        }
        if draft.initial_quantity < 0 {
            return Err(DomainError::validation("initial quantity cannot be negative"));
        }

        Ok(Self {
            id: ProductId::new(),
            owner_id,
            name: draft.name,
            origin: draft.origin,
            price_cents: draft.price_cents,
            rating: draft.rating,
            available_quantity: draft.initial_quantity,
            created_at,
        })
    }

    pub fn is_owned_by(&self, actor: ActorId) -> bool {
        self.owner_id == actor
    }
}
