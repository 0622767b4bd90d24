use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use eximhub_auth::Role;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", post(register_actor))
}

/// Self-registration: identity comes from the token, only the role is
/// chosen. Registering again overwrites the previous role.
pub async fn register_actor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::RegisterActorRequest>,
) -> axum::response::Response {
    let role: Role = match body.role.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "role must be one of: exporter, importer",
            )
        }
    };

    match services
        .catalog
        .register_actor(actor.actor_id(), actor.email().to_string(), role)
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(dto::actor_to_json(&record))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
