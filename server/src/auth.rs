//! API-key authentication for administrative routes.
//!
//! The key comes from configuration and is presented either as
//! `X-API-Key: <key>` or `Authorization: Bearer <key>`. Keys are compared as
//! SHA-256 digests. With no key configured every admin call is rejected.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use tracing::warn;
use winlic_license::LicenseError;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Verifies administrative credentials.
#[derive(Clone)]
pub struct AdminAuth {
    key_digest: Option<[u8; 32]>,
}

impl AdminAuth {
    /// Creates an authenticator for `key`. A missing or blank key rejects all callers.
    #[must_use]
    pub fn new(key: Option<&str>) -> Self {
        Self {
            key_digest: key.map(str::trim).filter(|k| !k.is_empty()).map(digest),
        }
    }

    /// Returns true if an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.key_digest.is_some()
    }

    /// Returns true if the request headers carry the configured key.
    #[must_use]
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        match (&self.key_digest, presented_key(headers)) {
            (Some(expected), Some(presented)) => digest(presented) == *expected,
            _ => false,
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware guarding the admin router.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.auth.authorize(request.headers()) {
        return Ok(next.run(request).await);
    }
    warn!(path = %request.uri().path(), "rejected admin request without valid API key");
    Err(LicenseError::Unauthorized.into())
}
