//! HTTP API application wiring (axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: backend selection and shared service construction
//! - `routes/`: HTTP routes and handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
/// Everything except `/health` sits behind the bearer middleware.
pub async fn build_app(jwt_secret: String) -> anyhow::Result<Router> {
    let verifier = Arc::new(eximhub_auth::Hs256TokenVerifier::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { verifier };

    let services = Arc::new(services::build_services().await?);

    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new()))
}
