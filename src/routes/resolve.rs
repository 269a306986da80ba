//! Identifier resolution endpoint.

use axum::{extract::State, Json};
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::models::resolution::{DeviceTypeHint, Resolution, ResolveRequest};
use crate::AppState;

/// POST /api/v1/resolve — resolve a dotted identifier to a readable name.
///
/// Accepts either a bare identifier with an optional `hint`, or a combined
/// device name such as `FortiAP-1.16.70.80...`.
pub async fn resolve(
    State(state): State<AppState>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<Resolution>>, AppError> {
    body.validate()?;

    let resolution = match body.hint {
        Some(hint) => {
            let hint = DeviceTypeHint::new(hint);
            state.resolver.resolve(&body.identifier, Some(&hint)).await?
        }
        None => state.resolver.resolve_device_name(&body.identifier).await?,
    };

    Ok(ApiResponse::success(resolution))
}
