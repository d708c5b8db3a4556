//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::Duration;
use winlic_license::{Device, DeviceStatus};
use winlic_types::{DeviceId, Timestamp};

/// A fixed "now" so decisions are reproducible.
pub fn now() -> Timestamp {
    Timestamp::parse("2025-06-15T12:00:00Z").unwrap()
}

/// Returns `now()` shifted by a number of days (negative = past).
pub fn days_from_now(days: i64) -> Timestamp {
    now().offset(Duration::days(days))
}

/// A freshly registered active device.
pub fn active_device(id: &str) -> Device {
    Device::registered(DeviceId::parse(id).unwrap(), Some("1.4.0".into()), None, now())
}

/// A device with the given status and expiry.
pub fn device_with(status: DeviceStatus, expiry: Option<Timestamp>) -> Device {
    let mut device = active_device("dev-test");
    device.status = status;
    device.license_expiry = expiry;
    device
}
