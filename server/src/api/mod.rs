//! Router assembly and shared handler plumbing.

mod admin;
mod devices;
mod updates;

use crate::auth::{require_admin, API_KEY_HEADER};
use crate::error::ApiError;
use crate::service::LicenseService;
use crate::AppState;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde::Serialize;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use winlic_license::LicenseResult;
use winlic_types::Timestamp;

/// Runs a service call on the blocking pool.
pub(crate) async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&LicenseService) -> LicenseResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?;
    Ok(result?)
}

#[derive(Serialize)]
struct HealthResponse {
    api: &'static str,
    timestamp: Timestamp,
    store: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let service = state.service.clone();
    let healthy = tokio::task::spawn_blocking(move || service.store_healthy())
        .await
        .unwrap_or(false);
    if !healthy {
        error!("health check: store unreachable");
    }
    Json(HealthResponse {
        api: "ok",
        timestamp: Timestamp::now(),
        store: if healthy { "connected" } else { "error" },
    })
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(86_400))
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/users", get(admin::list_devices))
        .route(
            "/users/{device_id}",
            get(admin::device_detail).patch(admin::update_device),
        )
        .route("/users/{device_id}/lock", post(admin::toggle_lock))
        .route("/users/{device_id}/force-check", post(admin::force_check))
        .route("/analytics", get(admin::analytics))
        .route(
            "/updates",
            get(admin::list_updates).post(admin::publish_update),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let api = Router::new()
        .route("/devices/register", post(devices::register))
        .route("/devices/{device_id}/license", get(devices::check_license))
        .route("/devices/{device_id}/activity", post(devices::record_activity))
        .route("/updates/latest", get(updates::latest))
        .route("/health", get(health))
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
