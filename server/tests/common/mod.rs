//! Shared helpers for server tests.

#![allow(dead_code)]

use std::sync::Arc;
use winlic_server::{build_router, AdminAuth, AppState, LicenseService};
use winlic_store::SqliteStore;
use winlic_types::Timestamp;

pub const ADMIN_KEY: &str = "test-admin-key";

/// A fixed "now" for service-level tests.
pub fn now() -> Timestamp {
    Timestamp::parse("2025-06-15T12:00:00Z").unwrap()
}

/// A service over a fresh in-memory store with its clock pinned to `now()`.
pub fn pinned_service() -> (LicenseService, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let service = LicenseService::new(store.clone()).with_clock(now);
    (service, store)
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_test_server() -> String {
    spawn_with_key(Some(ADMIN_KEY)).await
}

/// Like [`spawn_test_server`] with an explicit admin key (or none).
pub async fn spawn_with_key(key: Option<&str>) -> String {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    serve(AppState::new(store, AdminAuth::new(key))).await
}

/// Serves the router for `state` on an OS-assigned port.
pub async fn serve(state: AppState) -> String {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

/// A client that sends the admin key on every request.
pub fn admin_client() -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("x-api-key", ADMIN_KEY.parse().unwrap());
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap()
}

/// Registers `device_id` through the public API.
pub async fn register(base: &str, device_id: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/devices/register", base))
        .json(&serde_json::json!({ "deviceId": device_id, "appVersion": "1.4.0" }))
        .send()
        .await
        .unwrap()
}
