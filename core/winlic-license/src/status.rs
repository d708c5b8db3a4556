//! The license decision and the advisory grace period.

use crate::device::{Device, DeviceStatus};
use serde::{Deserialize, Serialize};
use winlic_types::Timestamp;

/// Offline grace window in seconds (7 days).
pub const GRACE_PERIOD_SECS: i64 = 7 * 24 * 60 * 60;

/// Offline age after which the grace window is reported as ending (5 days).
pub const GRACE_WARNING_SECS: i64 = 5 * 24 * 60 * 60;

/// Message returned for a device the store has never seen.
pub const UNREGISTERED_MESSAGE: &str = "Device not registered. Please register first.";

/// Message returned for a locked device without a lock reason.
pub const LOCKED_MESSAGE: &str = "Your device access has been revoked. Contact support.";

/// Message returned for an expired license.
pub const EXPIRED_MESSAGE: &str = "Your license has expired. Please renew.";

/// The state a license check reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseState {
    /// The device has never registered.
    Unregistered,
    /// The license is valid.
    Active,
    /// An operator locked the device.
    Locked,
    /// The license expired, by status or by date.
    Expired,
}

impl LicenseState {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Active => "active",
            Self::Locked => "locked",
            Self::Expired => "expired",
        }
    }
}

/// Result of a license check, in the shape clients poll for.
///
/// `expires_at` is omitted for unregistered and locked devices and present
/// (possibly `null`) for expired and active ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseCheck {
    pub is_valid: bool,
    pub status: LicenseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Option<Timestamp>>,
}

impl LicenseCheck {
    fn unregistered() -> Self {
        Self {
            is_valid: false,
            status: LicenseState::Unregistered,
            message: Some(UNREGISTERED_MESSAGE.to_string()),
            expires_at: None,
        }
    }

    fn locked(reason: Option<&str>) -> Self {
        let message = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Your device access has been revoked: {reason}. Contact support."),
            None => LOCKED_MESSAGE.to_string(),
        };
        Self {
            is_valid: false,
            status: LicenseState::Locked,
            message: Some(message),
            expires_at: None,
        }
    }

    fn expired(expiry: Option<Timestamp>) -> Self {
        Self {
            is_valid: false,
            status: LicenseState::Expired,
            message: Some(EXPIRED_MESSAGE.to_string()),
            expires_at: Some(expiry),
        }
    }

    fn active(expiry: Option<Timestamp>) -> Self {
        Self {
            is_valid: true,
            status: LicenseState::Active,
            message: None,
            expires_at: Some(expiry),
        }
    }

    /// Returns the expiry reported with this result, if any.
    #[must_use]
    pub fn expiry(&self) -> Option<Timestamp> {
        self.expires_at.flatten()
    }
}

/// Decides whether a device may be used at `now`.
///
/// `None` stands for a device absent from the store.
#[must_use]
pub fn evaluate(device: Option<&Device>, now: Timestamp) -> LicenseCheck {
    let Some(device) = device else {
        return LicenseCheck::unregistered();
    };

    if device.status == DeviceStatus::Locked {
        return LicenseCheck::locked(device.lock_reason.as_deref());
    }

    let past_expiry = device
        .license_expiry
        .is_some_and(|expiry| expiry.is_before(&now));
    if device.status == DeviceStatus::Expired || past_expiry {
        return LicenseCheck::expired(device.license_expiry);
    }

    LicenseCheck::active(device.license_expiry)
}

/// Advisory offline status derived from `lastActiveAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraceStatus {
    /// Seen within the last 5 days.
    Active,
    /// Offline for more than 5 days; the 7-day window is about to run out.
    GracePeriod,
    /// Offline for more than 7 days.
    Expired,
}

impl GraceStatus {
    /// Computes the grace status of a device last seen at `last_active_at`.
    #[must_use]
    pub fn at(last_active_at: Timestamp, now: Timestamp) -> Self {
        let offline_secs = last_active_at.age_at(now).num_seconds();
        if offline_secs > GRACE_PERIOD_SECS {
            Self::Expired
        } else if offline_secs > GRACE_WARNING_SECS {
            Self::GracePeriod
        } else {
            Self::Active
        }
    }

    /// Returns true while the device is inside the 7-day window.
    #[must_use]
    pub fn within_window(&self) -> bool {
        !matches!(self, Self::Expired)
    }

    /// Returns the dashboard label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::GracePeriod => "Grace Ending",
            Self::Expired => "Expired (Offline)",
        }
    }
}
