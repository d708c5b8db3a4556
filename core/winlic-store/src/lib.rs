//! SQLite storage layer for winlic.
//!
//! Provides persistent storage for device records, the append-only
//! activity log and published client releases.
//!
//! # Architecture
//!
//! - [`DeviceStore`] is the seam the license service talks to; it is passed
//!   in as `Arc<dyn DeviceStore>` at startup rather than reached through a
//!   global.
//! - [`SqliteStore`] implements it over a single serialized connection, so
//!   every read-modify-write on one device is atomic.
//! - Rows are converted into typed records on read; a row that does not
//!   describe a valid device is reported as [`StorageError::InvalidData`].
//! - Schema migrations run automatically on open.

mod error;
mod rows;
mod schema;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use sqlite::SqliteStore;

use winlic_license::{AppUpdate, Device, DeviceInfo, DeviceStatus, DeviceUpdate, UpdateRecord};
use winlic_types::{ActivityEvent, DeviceId, Timestamp};

/// Default page size for device listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Upper bound for device listings.
pub const MAX_LIST_LIMIT: usize = 500;

/// Filter for [`DeviceStore::list_devices`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceQuery {
    /// Only devices with this status.
    pub status: Option<DeviceStatus>,
    /// Case-insensitive substring of the device id.
    pub search: Option<String>,
    /// Maximum number of devices; `None` returns all of them.
    pub limit: Option<usize>,
}

impl DeviceQuery {
    /// A query returning every device.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

/// Outcome of a compare-and-swap on a device's status.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSwap {
    /// The status matched and was replaced; carries the updated record.
    Swapped(Device),
    /// The stored status differs from the expected one; nothing changed.
    Mismatch(DeviceStatus),
    /// No such device.
    Missing,
}

/// Persistence for devices and their activity.
///
/// All methods are blocking. Callers on an async runtime should run them on
/// a blocking thread.
pub trait DeviceStore: Send + Sync {
    /// Loads one device.
    fn get_device(&self, id: &DeviceId) -> StorageResult<Option<Device>>;

    /// Inserts a device unless one with the same id exists.
    ///
    /// Returns `true` if the record was inserted.
    fn insert_device(&self, device: &Device) -> StorageResult<bool>;

    /// Records a contact from the device: sets `lastActiveAt` and, when
    /// given, `appVersion` and `deviceInfo`. Returns the updated record.
    fn touch_device(
        &self,
        id: &DeviceId,
        seen_at: Timestamp,
        app_version: Option<&str>,
        device_info: Option<&DeviceInfo>,
    ) -> StorageResult<Option<Device>>;

    /// Applies a partial update. Returns the updated record.
    fn update_device(&self, id: &DeviceId, update: &DeviceUpdate) -> StorageResult<Option<Device>>;

    /// Replaces the status only if it currently equals `expected`, writing
    /// `lock_reason` in the same statement.
    fn swap_status(
        &self,
        id: &DeviceId,
        expected: DeviceStatus,
        new: DeviceStatus,
        lock_reason: Option<&str>,
    ) -> StorageResult<StatusSwap>;

    /// Sets or clears the force-check flag. Returns `false` if the device is absent.
    fn set_force_check(&self, id: &DeviceId, force_check: bool) -> StorageResult<bool>;

    /// Lists devices, most recently active first.
    fn list_devices(&self, query: &DeviceQuery) -> StorageResult<Vec<Device>>;

    /// Upserts a batch of activity events by id. Returns the number written.
    fn save_activity(&self, events: &[ActivityEvent]) -> StorageResult<usize>;

    /// Most recent activity of one device, newest first.
    fn device_activity(&self, id: &DeviceId, limit: usize) -> StorageResult<Vec<ActivityEvent>>;

    /// Most recent activity across all devices, newest first.
    fn recent_activity(&self, limit: usize) -> StorageResult<Vec<ActivityEvent>>;

    /// Records a published release.
    fn insert_update(&self, update: &AppUpdate) -> StorageResult<UpdateRecord>;

    /// The release with the highest build number; the newest wins a tie.
    fn latest_update(&self) -> StorageResult<Option<UpdateRecord>>;

    /// Releases by build number, highest first.
    fn list_updates(&self, limit: usize) -> StorageResult<Vec<UpdateRecord>>;

    /// Checks that the store is reachable.
    fn ping(&self) -> StorageResult<()>;
}
