//! Device classification endpoint.

use axum::{extract::State, Json};
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::models::classification::{ClassifyRequest, ClassifyResponse};
use crate::AppState;

/// POST /api/v1/classify — classify a device from its identifiers.
pub async fn classify(
    State(state): State<AppState>,
    Json(body): Json<ClassifyRequest>,
) -> Result<Json<ApiResponse<ClassifyResponse>>, AppError> {
    body.validate()?;
    if body.is_blank() {
        return Err(AppError::Validation(
            "at least one non-empty identifier is required".to_string(),
        ));
    }

    let result = state.classifier.classify(&body.identifiers());
    let icon_url = result.icon_url(&state.config.icon_base_url);
    Ok(ApiResponse::success(ClassifyResponse { result, icon_url }))
}
