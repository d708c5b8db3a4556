//! Device-facing routes. No authentication: devices identify themselves by id.

use super::blocking;
use crate::error::ApiError;
use crate::service::RegisterRequest;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use winlic_license::{DeviceStatus, LicenseCheck};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterResponse {
    success: bool,
    is_new: bool,
    status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// `POST /api/devices/register`
pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let registration = blocking(&state, move |service| service.register(request)).await?;

    let (code, message) = if registration.is_new {
        (StatusCode::CREATED, Some("Device registered successfully"))
    } else {
        (StatusCode::OK, None)
    };
    Ok((
        code,
        Json(RegisterResponse {
            success: true,
            is_new: registration.is_new,
            status: registration.status,
            message,
        }),
    ))
}

/// `GET /api/devices/{device_id}/license`
pub(crate) async fn check_license(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<LicenseCheck>, ApiError> {
    let check = blocking(&state, move |service| service.check_license(&device_id)).await?;
    Ok(Json(check))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityBatch {
    #[serde(default)]
    logs: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivityResponse {
    success: bool,
    count: usize,
    message: String,
}

/// `POST /api/devices/{device_id}/activity`
pub(crate) async fn record_activity(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    body: Result<Json<ActivityBatch>, JsonRejection>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let Json(batch) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let count = blocking(&state, move |service| {
        service.record_activity(&device_id, batch.logs)
    })
    .await?;
    Ok(Json(ActivityResponse {
        success: true,
        count,
        message: format!("{count} activity logs saved"),
    }))
}
