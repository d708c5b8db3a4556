//! Device licensing rules for winlic.
//!
//! This crate handles:
//! - The device record and its administrative status (active/locked/expired)
//! - The authoritative license decision returned to polling clients
//! - The advisory offline grace period shown to operators
//! - Validation of administrative partial updates
//! - Published client releases polled by devices
//!
//! # Decision order
//!
//! A license check evaluates, first match wins:
//! 1. unknown device: `unregistered`
//! 2. `locked` (dominates everything else)
//! 3. `expired` status, or a license expiry in the past
//! 4. otherwise `active`
//!
//! The grace status is derived from how long a device has been offline. It is
//! reported for display only and never changes the decision.

mod app_update;
mod device;
mod error;
mod status;
mod update;

pub use app_update::{AppUpdate, AppUpdateRequest, UpdateRecord};
pub use device::{
    Device, DeviceControls, DeviceInfo, DeviceStatus, DeviceSummary, ADMIN_LOCK_REASON,
};
pub use error::{LicenseError, LicenseResult};
pub use status::{
    evaluate, GraceStatus, LicenseCheck, LicenseState, EXPIRED_MESSAGE, GRACE_PERIOD_SECS,
    GRACE_WARNING_SECS, LOCKED_MESSAGE, UNREGISTERED_MESSAGE,
};
pub use update::{DevicePatch, DeviceUpdate};
