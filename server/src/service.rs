//! The license state service.
//!
//! Every operation is a short, blocking round trip against the injected
//! [`DeviceStore`]. The HTTP layer runs these on tokio's blocking pool.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use winlic_license::{
    evaluate, AppUpdate, AppUpdateRequest, Device, DeviceInfo, DevicePatch, DeviceStatus,
    DeviceSummary, DeviceUpdate, LicenseCheck, LicenseError, LicenseResult, UpdateRecord,
    ADMIN_LOCK_REASON, GRACE_PERIOD_SECS,
};
use winlic_store::{DeviceQuery, DeviceStore, StatusSwap, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use winlic_types::{ActivityEvent, DeviceId, Timestamp};

/// Activity entries returned with a device detail.
pub const DETAIL_ACTIVITY_LIMIT: usize = 50;

/// Activity entries returned with the analytics report.
pub const RECENT_ACTIVITY_LIMIT: usize = 20;

/// Releases returned by the admin release listing.
pub const UPDATE_LIST_LIMIT: usize = 20;

/// Window for the "active today" counter.
const ACTIVE_TODAY_SECS: i64 = 24 * 60 * 60;

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Body of a registration call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
}

/// Outcome of a registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub is_new: bool,
    pub status: DeviceStatus,
}

/// Filter for the admin device listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A device with its recent activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    pub device: DeviceSummary,
    pub activity_logs: Vec<ActivityEvent>,
    pub stats: DetailStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailStats {
    pub activity_count: usize,
}

/// Device counts by stored status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub active: usize,
    pub locked: usize,
    pub expired: usize,
}

/// Aggregate statistics for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_devices: usize,
    pub active_today: usize,
    /// Devices seen within the 7-day grace window.
    pub active_sessions: usize,
    pub locked_devices: usize,
    pub status_breakdown: StatusBreakdown,
    pub version_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub analytics: Analytics,
    pub recent_activity: Vec<ActivityEvent>,
}

/// Answers "is this device authorized right now" and maintains device records.
pub struct LicenseService {
    store: Arc<dyn DeviceStore>,
    clock: Clock,
}

fn parse_id(raw: &str) -> LicenseResult<DeviceId> {
    DeviceId::parse(raw).map_err(|e| LicenseError::Validation(format!("deviceId: {e}")))
}

fn not_found(id: &DeviceId) -> LicenseError {
    LicenseError::NotFound(id.to_string())
}

/// Treats empty strings as "not supplied".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl LicenseService {
    /// Creates a service over the given store, using the system clock.
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self {
            store,
            clock: Arc::new(Timestamp::now),
        }
    }

    /// Replaces the clock. Used by tests to pin "now".
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> Timestamp {
        (self.clock)()
    }

    /// Registers a device, or records a contact from an already known one.
    pub fn register(&self, request: RegisterRequest) -> LicenseResult<Registration> {
        let raw_id = non_empty(request.device_id)
            .ok_or_else(|| LicenseError::Validation("deviceId is required".to_string()))?;
        let id = parse_id(&raw_id)?;
        let app_version = non_empty(request.app_version);
        let now = self.now();

        let fresh = Device::registered(id.clone(), app_version.clone(), request.device_info.clone(), now);
        if self.store.insert_device(&fresh)? {
            info!(device_id = %id, app_version = ?app_version, "registered new device");
            return Ok(Registration {
                is_new: true,
                status: fresh.status,
            });
        }

        let device = self
            .store
            .touch_device(&id, now, app_version.as_deref(), request.device_info.as_ref())?
            .ok_or_else(|| not_found(&id))?;
        debug!(device_id = %id, status = %device.status, "known device re-registered");
        Ok(Registration {
            is_new: false,
            status: device.status,
        })
    }

    /// The authoritative license decision. Unknown devices are `unregistered`,
    /// not an error, and so is any id that could never have been registered.
    pub fn check_license(&self, device_id: &str) -> LicenseResult<LicenseCheck> {
        let Ok(id) = DeviceId::parse(device_id) else {
            debug!(len = device_id.len(), "license check for unstorable id");
            return Ok(evaluate(None, self.now()));
        };
        let device = self.store.get_device(&id)?;
        let check = evaluate(device.as_ref(), self.now());
        debug!(device_id = %id, status = check.status.as_str(), valid = check.is_valid, "license check");
        Ok(check)
    }

    /// Flips a device between locked and active.
    ///
    /// `current_status` is what the operator saw; the flip only applies if
    /// the store still agrees. Without it, the stored status is read first.
    pub fn toggle_lock(&self, device_id: &str, current_status: Option<&str>) -> LicenseResult<Device> {
        let id = parse_id(device_id)?;
        let expected = match current_status {
            Some(raw) => raw.parse::<DeviceStatus>()?,
            None => {
                self.store
                    .get_device(&id)?
                    .ok_or_else(|| not_found(&id))?
                    .status
            }
        };
        let target = expected.toggled();
        let reason = (target == DeviceStatus::Locked).then_some(ADMIN_LOCK_REASON);

        match self.store.swap_status(&id, expected, target, reason)? {
            StatusSwap::Swapped(device) => {
                info!(device_id = %id, from = %expected, to = %target, "device lock toggled");
                Ok(device)
            }
            StatusSwap::Mismatch(actual) => Err(LicenseError::Conflict {
                expected: expected.to_string(),
                actual: actual.to_string(),
            }),
            StatusSwap::Missing => Err(not_found(&id)),
        }
    }

    /// Flags the device for an out-of-band check on its next contact.
    pub fn force_check(&self, device_id: &str) -> LicenseResult<()> {
        let id = parse_id(device_id)?;
        if !self.store.set_force_check(&id, true)? {
            return Err(not_found(&id));
        }
        info!(device_id = %id, "force check requested");
        Ok(())
    }

    /// Applies an administrative partial update.
    pub fn update_device(&self, device_id: &str, patch: DevicePatch) -> LicenseResult<Device> {
        let id = parse_id(device_id)?;
        let update = DeviceUpdate::try_from(patch)?;
        let device = self
            .store
            .update_device(&id, &update)?
            .ok_or_else(|| not_found(&id))?;
        info!(device_id = %id, fields = ?update.field_names(), "device updated");
        Ok(device)
    }

    /// Lists devices with their derived grace status.
    pub fn list_devices(&self, filter: ListFilter) -> LicenseResult<Vec<DeviceSummary>> {
        let status = non_empty(filter.status)
            .map(|s| s.parse::<DeviceStatus>())
            .transpose()?;
        let query = DeviceQuery {
            status,
            search: non_empty(filter.search),
            limit: Some(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)),
        };
        let now = self.now();
        Ok(self
            .store
            .list_devices(&query)?
            .iter()
            .map(|d| d.summary(now))
            .collect())
    }

    /// One device with its most recent activity.
    pub fn device_detail(&self, device_id: &str) -> LicenseResult<DeviceDetail> {
        let id = parse_id(device_id)?;
        let device = self.store.get_device(&id)?.ok_or_else(|| not_found(&id))?;
        let activity_logs = self.store.device_activity(&id, DETAIL_ACTIVITY_LIMIT)?;
        Ok(DeviceDetail {
            device: device.summary(self.now()),
            stats: DetailStats {
                activity_count: activity_logs.len(),
            },
            activity_logs,
        })
    }

    /// Stores a batch of client activity entries. Returns the number of
    /// entries submitted; entries that cannot be stored are skipped without
    /// failing the rest of the batch.
    pub fn record_activity(&self, device_id: &str, logs: Option<Value>) -> LicenseResult<usize> {
        let id = parse_id(device_id)?;
        let entries = match logs {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => return Err(LicenseError::Validation("logs array is required".to_string())),
        };

        let submitted = entries.len();
        let now = self.now();
        let events: Vec<ActivityEvent> = entries
            .into_iter()
            .filter_map(|raw| ActivityEvent::from_submission(&id, raw, now))
            .collect();

        let saved = self.store.save_activity(&events)?;
        debug!(device_id = %id, submitted, saved, "activity batch stored");
        Ok(submitted)
    }

    /// Aggregate statistics plus the latest activity across devices.
    pub fn analytics(&self) -> LicenseResult<AnalyticsReport> {
        let now = self.now();
        let devices = self.store.list_devices(&DeviceQuery::all())?;
        let day_ago = now.offset(Duration::seconds(-ACTIVE_TODAY_SECS));
        let window_start = now.offset(Duration::seconds(-GRACE_PERIOD_SECS));

        let mut analytics = Analytics {
            total_devices: devices.len(),
            ..Analytics::default()
        };
        for device in &devices {
            if day_ago.is_before(&device.last_active_at) {
                analytics.active_today += 1;
            }
            if window_start.is_before(&device.last_active_at) {
                analytics.active_sessions += 1;
            }
            match device.status {
                DeviceStatus::Active => analytics.status_breakdown.active += 1,
                DeviceStatus::Locked => analytics.status_breakdown.locked += 1,
                DeviceStatus::Expired => analytics.status_breakdown.expired += 1,
            }
            let version = device
                .app_version
                .clone()
                .unwrap_or_else(|| "Unknown".to_string());
            *analytics.version_distribution.entry(version).or_default() += 1;
        }
        analytics.locked_devices = analytics.status_breakdown.locked;

        Ok(AnalyticsReport {
            analytics,
            recent_activity: self.store.recent_activity(RECENT_ACTIVITY_LIMIT)?,
        })
    }

    /// The release devices should be running, if any was published.
    pub fn latest_update(&self) -> LicenseResult<Option<AppUpdate>> {
        Ok(self.store.latest_update()?.map(|record| record.update))
    }

    /// Records a published release.
    pub fn publish_update(&self, request: AppUpdateRequest) -> LicenseResult<UpdateRecord> {
        let update = AppUpdate::from_request(request, self.now())?;
        let record = self.store.insert_update(&update)?;
        info!(
            id = record.id,
            version = %update.version,
            build_number = update.build_number,
            force_update = update.force_update,
            "release published"
        );
        Ok(record)
    }

    /// Recent releases, highest build first.
    pub fn list_updates(&self) -> LicenseResult<Vec<UpdateRecord>> {
        Ok(self.store.list_updates(UPDATE_LIST_LIMIT)?)
    }

    /// Returns true if the store answers.
    pub fn store_healthy(&self) -> bool {
        self.store.ping().is_ok()
    }
}
