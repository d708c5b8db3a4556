//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use winlic_license::LicenseError;

/// Message sent in place of any internal failure detail.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A failure from the license service.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// The request body or query string could not be parsed.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// The blocking task running a store call failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Validation, malformed body: 400
    /// - Unauthorized: 401
    /// - Not found: 404
    /// - Status conflict: 409
    /// - Store and internal failures: 500
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::License(LicenseError::Validation(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::License(LicenseError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::License(LicenseError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::License(LicenseError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::License(LicenseError::Store(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::License(LicenseError::Validation(msg)) => msg.clone(),
            Self::BadRequest(msg) => msg.clone(),
            Self::License(LicenseError::Unauthorized) => "Valid API key required".to_string(),
            Self::License(LicenseError::NotFound(_)) => "Device not found".to_string(),
            Self::License(err @ LicenseError::Conflict { .. }) => err.to_string(),
            Self::License(LicenseError::Store(_)) | Self::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = json!({ "error": true, "message": self.public_message() });
        (status, Json(body)).into_response()
    }
}
