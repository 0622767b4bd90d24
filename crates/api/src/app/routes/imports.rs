use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use eximhub_core::{ImportId, ProductId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(reserve_import))
        .route("/my", get(my_imports))
        .route("/:id", delete(release_import))
}

pub async fn reserve_import(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::ReserveImportRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    let receipt = match services
        .engine
        .reserve(product_id, body.quantity, actor.actor_id())
        .await
    {
        Ok(r) => r,
        Err(e) => return errors::engine_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "import_id": receipt.import.id.to_string(),
            "remaining_stock": receipt.remaining_stock,
        })),
    )
        .into_response()
}

pub async fn release_import(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let import_id: ImportId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid import id")
        }
    };

    match services.engine.release(import_id, actor.actor_id()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "restored": true })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn my_imports(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.queries.imports_by_importer(actor.actor_id()).await {
        Ok(summaries) => {
            let items = summaries.iter().map(dto::summary_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::engine_error_to_response(e),
    }
}
