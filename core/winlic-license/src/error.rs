//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
///
/// Each variant corresponds to one class of HTTP failure; the server maps
/// them to status codes without inspecting the message.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A required field is missing or a value is not acceptable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation needs an existing device and there is none.
    #[error("device not found: {0}")]
    NotFound(String),

    /// Administrative call without a valid credential.
    #[error("unauthorized")]
    Unauthorized,

    /// A compare-and-swap on the device status lost a race.
    #[error("device status changed: expected {expected}, found {actual}")]
    Conflict {
        /// Status the caller believed the device had.
        expected: String,
        /// Status actually stored.
        actual: String,
    },

    /// The backing store failed or returned malformed data.
    #[error("store error: {0}")]
    Store(String),
}

impl From<winlic_types::Error> for LicenseError {
    fn from(err: winlic_types::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
