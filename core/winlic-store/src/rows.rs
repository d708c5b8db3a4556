//! Conversion between SQLite rows and typed records.

use crate::error::{StorageError, StorageResult};
use rusqlite::Row;
use serde_json::{Map, Value};
use winlic_license::{AppUpdate, Device, DeviceControls, DeviceInfo, DeviceStatus, UpdateRecord};
use winlic_types::{ActivityEvent, ActivityId, DeviceId, Timestamp};

pub(crate) const DEVICE_COLUMNS: &str = "device_id, status, registered_at, last_active_at, \
    app_version, license_expiry, force_check, lock_reason, controls, device_info";

pub(crate) const UPDATE_COLUMNS: &str = "id, version, build_number, apk_url, file_size, \
    release_notes, force_update, skip_allowed, created_at";

pub(crate) const ACTIVITY_COLUMNS: &str =
    "id, device_id, action_name, page, context, timestamp, extra";

/// Untyped device row, as read from SQLite.
pub(crate) struct DeviceRow {
    device_id: String,
    status: String,
    registered_at: i64,
    last_active_at: i64,
    app_version: Option<String>,
    license_expiry: Option<i64>,
    force_check: bool,
    lock_reason: Option<String>,
    controls: Option<String>,
    device_info: Option<String>,
}

impl DeviceRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            device_id: row.get(0)?,
            status: row.get(1)?,
            registered_at: row.get(2)?,
            last_active_at: row.get(3)?,
            app_version: row.get(4)?,
            license_expiry: row.get(5)?,
            force_check: row.get(6)?,
            lock_reason: row.get(7)?,
            controls: row.get(8)?,
            device_info: row.get(9)?,
        })
    }
}

fn invalid(device_id: &str, what: impl std::fmt::Display) -> StorageError {
    StorageError::InvalidData(format!("device {device_id:?}: {what}"))
}

fn timestamp(device_id: &str, field: &str, millis: i64) -> StorageResult<Timestamp> {
    Timestamp::from_millis(millis).map_err(|e| invalid(device_id, format!("{field}: {e}")))
}

impl TryFrom<DeviceRow> for Device {
    type Error = StorageError;

    fn try_from(row: DeviceRow) -> StorageResult<Self> {
        let id = row.device_id.as_str();
        let device_id = DeviceId::parse(id).map_err(|e| invalid(id, e))?;
        let status = row
            .status
            .parse::<DeviceStatus>()
            .map_err(|_| invalid(id, format!("unknown status {:?}", row.status)))?;

        let controls = match row.controls.as_deref() {
            None => DeviceControls::default(),
            Some(json) => {
                serde_json::from_str(json).map_err(|e| invalid(id, format!("controls: {e}")))?
            }
        };
        let device_info = row
            .device_info
            .as_deref()
            .map(serde_json::from_str::<DeviceInfo>)
            .transpose()
            .map_err(|e| invalid(id, format!("device_info: {e}")))?;

        Ok(Device {
            status,
            registered_at: timestamp(id, "registered_at", row.registered_at)?,
            last_active_at: timestamp(id, "last_active_at", row.last_active_at)?,
            app_version: row.app_version,
            license_expiry: row
                .license_expiry
                .map(|ms| timestamp(id, "license_expiry", ms))
                .transpose()?,
            force_check: row.force_check,
            lock_reason: row.lock_reason,
            controls,
            device_info,
            device_id,
        })
    }
}

/// Untyped activity row.
pub(crate) struct ActivityRow {
    id: String,
    device_id: String,
    action_name: String,
    page: String,
    context: Option<String>,
    timestamp: i64,
    extra: String,
}

impl ActivityRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            device_id: row.get(1)?,
            action_name: row.get(2)?,
            page: row.get(3)?,
            context: row.get(4)?,
            timestamp: row.get(5)?,
            extra: row.get(6)?,
        })
    }
}

impl TryFrom<ActivityRow> for ActivityEvent {
    type Error = StorageError;

    fn try_from(row: ActivityRow) -> StorageResult<Self> {
        let bad = |what: String| StorageError::InvalidData(format!("activity {:?}: {what}", row.id));
        let extra: Map<String, Value> =
            serde_json::from_str(&row.extra).map_err(|e| bad(format!("extra: {e}")))?;
        Ok(ActivityEvent {
            id: ActivityId::parse(&row.id).map_err(|e| bad(e.to_string()))?,
            device_id: DeviceId::parse(&row.device_id).map_err(|e| bad(e.to_string()))?,
            action_name: row.action_name,
            page: row.page,
            context: row.context,
            timestamp: Timestamp::from_millis(row.timestamp).map_err(|e| bad(e.to_string()))?,
            extra,
        })
    }
}

/// Untyped release row.
pub(crate) struct UpdateRow {
    id: i64,
    version: String,
    build_number: i64,
    apk_url: String,
    file_size: i64,
    release_notes: Option<String>,
    force_update: bool,
    skip_allowed: bool,
    created_at: i64,
}

impl UpdateRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            build_number: row.get(2)?,
            apk_url: row.get(3)?,
            file_size: row.get(4)?,
            release_notes: row.get(5)?,
            force_update: row.get(6)?,
            skip_allowed: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl TryFrom<UpdateRow> for UpdateRecord {
    type Error = StorageError;

    fn try_from(row: UpdateRow) -> StorageResult<Self> {
        let bad = |what: String| StorageError::InvalidData(format!("update {}: {what}", row.id));
        Ok(UpdateRecord {
            id: row.id,
            update: AppUpdate {
                build_number: u32::try_from(row.build_number)
                    .map_err(|_| bad(format!("build_number {}", row.build_number)))?,
                file_size: u64::try_from(row.file_size)
                    .map_err(|_| bad(format!("file_size {}", row.file_size)))?,
                created_at: Timestamp::from_millis(row.created_at)
                    .map_err(|e| bad(e.to_string()))?,
                version: row.version,
                apk_url: row.apk_url,
                release_notes: row.release_notes,
                force_update: row.force_update,
                skip_allowed: row.skip_allowed,
            },
        })
    }
}
