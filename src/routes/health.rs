//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::CacheBackend;
use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub cache_backend: String,
    pub cache_entries: usize,
    pub lookup_sources: Vec<String>,
    pub database: String,
    pub redis: String,
}

/// Liveness probe — always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe — reports cache state and backend connectivity.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let db_status = match &state.db {
        None => "disabled".to_string(),
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "connected".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                format!("error: {e}")
            }
        },
    };

    let redis_status = match (&state.config.cache_backend, &state.config.redis_url) {
        (CacheBackend::Redis, Some(url)) => match redis::Client::open(url.as_str()) {
            Ok(client) => match client.get_multiplexed_async_connection().await {
                Ok(_) => "connected".to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "Redis health check failed");
                    format!("error: {e}")
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Redis client creation failed");
                format!("error: {e}")
            }
        },
        _ => "disabled".to_string(),
    };

    let resolver = &state.resolver;
    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        cache_backend: resolver.cache().backend().to_string(),
        cache_entries: resolver.cache().len().await,
        lookup_sources: resolver.chain().configs().into_iter().map(|c| c.name).collect(),
        database: db_status,
        redis: redis_status,
    })
}
