//! HTTP API for the winlic device license server.
//!
//! Device-facing routes (registration, license check, activity upload,
//! release polling) are open; everything under `/api/admin` requires the configured API key.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod service;

use std::sync::Arc;
use winlic_store::DeviceStore;

pub use api::build_router;
pub use auth::AdminAuth;
pub use error::ApiError;
pub use service::LicenseService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LicenseService>,
    pub auth: Arc<AdminAuth>,
}

impl AppState {
    /// Wires a service around `store`.
    pub fn new(store: Arc<dyn DeviceStore>, auth: AdminAuth) -> Self {
        Self::from_service(LicenseService::new(store), auth)
    }

    /// Uses an already configured service.
    pub fn from_service(service: LicenseService, auth: AdminAuth) -> Self {
        Self {
            service: Arc::new(service),
            auth: Arc::new(auth),
        }
    }
}
