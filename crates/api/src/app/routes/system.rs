use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    // Role is null until the actor registers.
    let role = match services.catalog.actor_profile(actor.actor_id()).await {
        Ok(profile) => profile.map(|p| p.role),
        Err(e) => return errors::engine_error_to_response(e),
    };

    Json(serde_json::json!({
        "actor_id": actor.actor_id().to_string(),
        "email": actor.email(),
        "role": role,
    }))
    .into_response()
}
