//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation, policy,
/// stock arithmetic). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or non-positive input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The product exists but does not have enough stock left.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// An actor tried to import a product they themselves listed.
    #[error("cannot import own listing")]
    SelfImportForbidden,

    /// The actor lacks the capability the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The import was already released.
    #[error("import already reversed")]
    AlreadyReversed,

    /// A conflict occurred (e.g. duplicate key).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stock and ledger no longer agree and automatic repair gave up.
    ///
    /// This is the only non-recoverable variant. Callers must surface it loudly
    /// rather than retry.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn insufficient_stock(requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::InconsistentState(msg.into())
    }
}
