//! Read-only taxonomy listing and icon mapping export.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::models::device_type::{DeviceTypeDetail, DeviceTypeSummary};
use crate::services::taxonomy::TaxonomyExport;
use crate::AppState;

/// GET /api/v1/taxonomy — all device types in registry order.
pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<DeviceTypeSummary>>> {
    ApiResponse::success(state.classifier.registry().all_device_types())
}

/// GET /api/v1/taxonomy/vendors/{vendor} — definitions for one vendor.
pub async fn vendor(
    State(state): State<AppState>,
    Path(vendor): Path<String>,
) -> Result<Json<ApiResponse<Vec<DeviceTypeDetail>>>, AppError> {
    let devices = state.classifier.registry().vendor_devices(&vendor);
    if devices.is_empty() {
        return Err(AppError::NotFound(format!("vendor {vendor}")));
    }
    Ok(ApiResponse::success(devices))
}

/// GET /api/v1/taxonomy/export — icon mapping for frontends.
pub async fn export(State(state): State<AppState>) -> Json<ApiResponse<TaxonomyExport>> {
    ApiResponse::success(
        state
            .classifier
            .registry()
            .export_mapping(&state.config.icon_base_url),
    )
}
