//! Core type definitions for the winlic license service.
//!
//! This crate defines the small, storage-agnostic primitives shared by the
//! license domain, the store and the HTTP server:
//! - Device and activity identifiers (opaque, client-generated strings)
//! - UTC timestamps with millisecond storage precision
//! - Activity events submitted by devices
//!
//! Licensing rules live in `winlic-license`, not here.

mod event;
mod ids;
mod timestamp;

pub use event::{ActivityEvent, ActivityId};
pub use ids::{DeviceId, MAX_ID_LEN};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
