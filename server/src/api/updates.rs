//! Release polling for devices. No authentication.

use super::blocking;
use crate::error::ApiError;
use crate::AppState;
use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use winlic_license::AppUpdate;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestUpdateResponse {
    success: bool,
    has_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<AppUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// `GET /api/updates/latest`
pub(crate) async fn latest(
    State(state): State<AppState>,
) -> Result<Json<LatestUpdateResponse>, ApiError> {
    let update = blocking(&state, |service| service.latest_update()).await?;
    let message = update.is_none().then_some("No updates available");
    Ok(Json(LatestUpdateResponse {
        success: true,
        has_update: update.is_some(),
        update,
        message,
    }))
}
