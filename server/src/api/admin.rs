//! Administrative routes, mounted behind [`crate::auth::require_admin`].

use super::blocking;
use crate::error::ApiError;
use crate::service::{AnalyticsReport, DeviceDetail, ListFilter};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use winlic_license::{
    AppUpdate, AppUpdateRequest, Device, DevicePatch, DeviceStatus, DeviceSummary, UpdateRecord,
};

#[derive(Debug, Serialize)]
pub(crate) struct DeviceListResponse {
    success: bool,
    count: usize,
    devices: Vec<DeviceSummary>,
}

/// `GET /api/admin/users`
pub(crate) async fn list_devices(
    State(state): State<AppState>,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let Query(filter) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let devices = blocking(&state, move |service| service.list_devices(filter)).await?;
    Ok(Json(DeviceListResponse {
        success: true,
        count: devices.len(),
        devices,
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceDetailResponse {
    success: bool,
    #[serde(flatten)]
    detail: DeviceDetail,
}

/// `GET /api/admin/users/{device_id}`
pub(crate) async fn device_detail(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceDetailResponse>, ApiError> {
    let detail = blocking(&state, move |service| service.device_detail(&device_id)).await?;
    Ok(Json(DeviceDetailResponse {
        success: true,
        detail,
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateResponse {
    success: bool,
    message: &'static str,
    device: Device,
}

/// `PATCH /api/admin/users/{device_id}`
pub(crate) async fn update_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    body: Result<Json<DevicePatch>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let Json(patch) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let device = blocking(&state, move |service| service.update_device(&device_id, patch)).await?;
    Ok(Json(UpdateResponse {
        success: true,
        message: "Device updated successfully",
        device,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LockRequest {
    #[serde(default)]
    current_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LockResponse {
    success: bool,
    status: DeviceStatus,
    lock_reason: Option<String>,
}

/// `POST /api/admin/users/{device_id}/lock`
///
/// The body is optional; an empty body toggles from the stored status.
pub(crate) async fn toggle_lock(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    body: Bytes,
) -> Result<Json<LockResponse>, ApiError> {
    let request: LockRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LockRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let device = blocking(&state, move |service| {
        service.toggle_lock(&device_id, request.current_status.as_deref())
    })
    .await?;
    Ok(Json(LockResponse {
        success: true,
        status: device.status,
        lock_reason: device.lock_reason,
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct SuccessResponse {
    success: bool,
}

/// `POST /api/admin/users/{device_id}/force-check`
pub(crate) async fn force_check(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    blocking(&state, move |service| service.force_check(&device_id)).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyticsResponse {
    success: bool,
    #[serde(flatten)]
    report: AnalyticsReport,
}

/// `GET /api/admin/analytics`
pub(crate) async fn analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let report = blocking(&state, |service| service.analytics()).await?;
    Ok(Json(AnalyticsResponse {
        success: true,
        report,
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateListResponse {
    success: bool,
    count: usize,
    updates: Vec<UpdateRecord>,
}

/// `GET /api/admin/updates`
pub(crate) async fn list_updates(
    State(state): State<AppState>,
) -> Result<Json<UpdateListResponse>, ApiError> {
    let updates = blocking(&state, |service| service.list_updates()).await?;
    Ok(Json(UpdateListResponse {
        success: true,
        count: updates.len(),
        updates,
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct PublishResponse {
    success: bool,
    message: &'static str,
    id: i64,
    update: AppUpdate,
}

/// `POST /api/admin/updates`
pub(crate) async fn publish_update(
    State(state): State<AppState>,
    body: Result<Json<AppUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let record = blocking(&state, move |service| service.publish_update(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(PublishResponse {
            success: true,
            message: "Update created successfully",
            id: record.id,
            update: record.update,
        }),
    ))
}
