//! Administrative partial updates.
//!
//! [`DevicePatch`] is the loosely typed body operators send; converting it
//! into a [`DeviceUpdate`] validates every field. For `licenseExpiry` and
//! `lockReason` an explicit JSON `null` means "clear", which is why those
//! fields are double options.

use crate::device::{Device, DeviceControls, DeviceStatus};
use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Deserializer};
use winlic_types::Timestamp;

/// Raw PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatch {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub license_expiry: Option<Option<String>>,
    #[serde(default)]
    pub controls: Option<DeviceControls>,
    #[serde(default, deserialize_with = "present")]
    pub lock_reason: Option<Option<String>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A validated partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceUpdate {
    pub status: Option<DeviceStatus>,
    pub license_expiry: Option<Option<Timestamp>>,
    pub controls: Option<DeviceControls>,
    pub lock_reason: Option<Option<String>>,
}

impl DeviceUpdate {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.license_expiry.is_none()
            && self.controls.is_none()
            && self.lock_reason.is_none()
    }

    /// Applies this update to a device record in place.
    pub fn apply_to(&self, device: &mut Device) {
        if let Some(status) = self.status {
            device.status = status;
        }
        if let Some(expiry) = self.license_expiry {
            device.license_expiry = expiry;
        }
        if let Some(controls) = self.controls {
            device.controls = controls;
        }
        if let Some(reason) = &self.lock_reason {
            device.lock_reason.clone_from(reason);
        }
    }

    /// Returns the names of the fields this update touches, camelCase.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.status.is_some() {
            names.push("status");
        }
        if self.license_expiry.is_some() {
            names.push("licenseExpiry");
        }
        if self.controls.is_some() {
            names.push("controls");
        }
        if self.lock_reason.is_some() {
            names.push("lockReason");
        }
        names
    }
}

impl TryFrom<DevicePatch> for DeviceUpdate {
    type Error = LicenseError;

    fn try_from(patch: DevicePatch) -> LicenseResult<Self> {
        let status = patch
            .status
            .as_deref()
            .map(str::parse::<DeviceStatus>)
            .transpose()?;

        // An empty string clears the expiry, same as null.
        let license_expiry = match patch.license_expiry {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) if raw.trim().is_empty() => Some(None),
            Some(Some(raw)) => Some(Some(Timestamp::parse(&raw).map_err(|e| {
                LicenseError::Validation(format!("licenseExpiry: {e}"))
            })?)),
        };

        let update = Self {
            status,
            license_expiry,
            controls: patch.controls,
            lock_reason: patch.lock_reason,
        };

        if update.is_empty() {
            return Err(LicenseError::Validation(
                "no valid fields to update".to_string(),
            ));
        }
        Ok(update)
    }
}
