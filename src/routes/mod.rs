//! Route definitions for the netident API.

pub mod classify;
pub mod health;
pub mod resolve;
pub mod taxonomy;

use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/classify", post(classify::classify))
        .route("/resolve", post(resolve::resolve))
        .route("/taxonomy", get(taxonomy::list))
        .route("/taxonomy/export", get(taxonomy::export))
        .route("/taxonomy/vendors/{vendor}", get(taxonomy::vendor));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
