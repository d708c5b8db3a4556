//! The device record.
//!
//! One record per installed client, keyed by the client-generated
//! [`DeviceId`]. Records are created on first registration and afterwards
//! only mutated, never deleted.

use crate::error::LicenseError;
use crate::status::{evaluate, GraceStatus, LicenseCheck};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use winlic_types::{DeviceId, Timestamp};

/// Lock reason recorded when an operator locks a device from the dashboard.
pub const ADMIN_LOCK_REASON: &str = "Admin manual lock";

/// Administrative status of a device.
///
/// "Unregistered" is not a stored status: it is what a license check reports
/// for a device the store has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Normal operation.
    Active,
    /// Access revoked by an operator until explicitly unlocked.
    Locked,
    /// License marked expired by an operator.
    Expired,
}

impl DeviceStatus {
    /// All stored statuses, in display order.
    pub const ALL: [DeviceStatus; 3] = [Self::Active, Self::Locked, Self::Expired];

    /// Returns the wire/store representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Locked => "locked",
            Self::Expired => "expired",
        }
    }

    /// Returns the status a lock toggle moves to: `locked` becomes `active`,
    /// anything else becomes `locked`.
    #[must_use]
    pub fn toggled(&self) -> Self {
        match self {
            Self::Locked => Self::Active,
            Self::Active | Self::Expired => Self::Locked,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "locked" => Ok(Self::Locked),
            "expired" => Ok(Self::Expired),
            other => Err(LicenseError::Validation(format!(
                "status must be one of active, locked, expired (got {other:?})"
            ))),
        }
    }
}

/// Granular feature permissions an operator can toggle per device.
///
/// Every permission defaults to `true`; a partial object fills the missing
/// permissions with their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceControls {
    pub can_create_customer: bool,
    pub can_edit_customer: bool,
    pub can_delete_customer: bool,
    pub can_create_window: bool,
    pub can_edit_window: bool,
    pub can_delete_window: bool,
    pub can_export_data: bool,
    pub can_print: bool,
    pub can_share: bool,
}

impl Default for DeviceControls {
    fn default() -> Self {
        Self {
            can_create_customer: true,
            can_edit_customer: true,
            can_delete_customer: true,
            can_create_window: true,
            can_edit_window: true,
            can_delete_window: true,
            can_export_data: true,
            can_print: true,
            can_share: true,
        }
    }
}

/// Hardware description reported by the client at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Device model, e.g. "Pixel 7".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Manufacturer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Operating system version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

/// A device record as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: DeviceId,
    pub status: DeviceStatus,
    pub registered_at: Timestamp,
    pub last_active_at: Timestamp,
    pub app_version: Option<String>,
    pub license_expiry: Option<Timestamp>,
    pub force_check: bool,
    pub lock_reason: Option<String>,
    pub controls: DeviceControls,
    pub device_info: Option<DeviceInfo>,
}

impl Device {
    /// Creates the record for a first registration.
    #[must_use]
    pub fn registered(
        device_id: DeviceId,
        app_version: Option<String>,
        device_info: Option<DeviceInfo>,
        now: Timestamp,
    ) -> Self {
        Self {
            device_id,
            status: DeviceStatus::Active,
            registered_at: now,
            last_active_at: now,
            app_version,
            license_expiry: None,
            force_check: false,
            lock_reason: None,
            controls: DeviceControls::default(),
            device_info,
        }
    }

    /// Returns true if an operator has locked this device.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status == DeviceStatus::Locked
    }

    /// Runs the license decision for this device at `now`.
    #[must_use]
    pub fn check(&self, now: Timestamp) -> LicenseCheck {
        evaluate(Some(self), now)
    }

    /// Returns the advisory offline grace status at `now`.
    #[must_use]
    pub fn grace_status(&self, now: Timestamp) -> GraceStatus {
        GraceStatus::at(self.last_active_at, now)
    }

    /// Returns the operator-facing view of this device at `now`.
    #[must_use]
    pub fn summary(&self, now: Timestamp) -> DeviceSummary {
        DeviceSummary {
            grace_status: self.grace_status(now),
            device: self.clone(),
        }
    }
}

/// A device plus its derived grace status, as listed on the admin API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    #[serde(flatten)]
    pub device: Device,
    pub grace_status: GraceStatus,
}
