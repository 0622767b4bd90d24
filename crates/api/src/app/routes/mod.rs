use axum::{routing::get, Router};

pub mod actors;
pub mod imports;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/imports", imports::router())
        .nest("/products", products::router())
        .nest("/actors", actors::router())
}
