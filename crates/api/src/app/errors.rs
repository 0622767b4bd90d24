use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use eximhub_core::DomainError;
use eximhub_infra::{EngineError, StoreError};

/// Map an engine failure onto the HTTP surface. Every arm carries a stable
/// machine-readable code next to the human message.
pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Domain(domain) => domain_error_to_response(domain),
        EngineError::Store(StoreError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        EngineError::Store(StoreError::Backend(msg)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_stock", e.to_string())
        }
        e @ DomainError::SelfImportForbidden => {
            json_error(StatusCode::FORBIDDEN, "self_import_forbidden", e.to_string())
        }
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        e @ DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        e @ DomainError::AlreadyReversed => {
            json_error(StatusCode::NOT_FOUND, "already_reversed", e.to_string())
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        e @ DomainError::InconsistentState(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "inconsistent_state",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
