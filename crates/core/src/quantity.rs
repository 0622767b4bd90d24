//! Positive-quantity value object.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A strictly positive unit count.
///
/// Every quantity entering the reservation path is constructed through
/// [`Quantity::new`], so downstream code can treat the inner value as > 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be a positive integer, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}
