//! SQLite-backed [`DeviceStore`].

use crate::error::{StorageError, StorageResult};
use crate::rows::{ActivityRow, DeviceRow, UpdateRow, ACTIVITY_COLUMNS, DEVICE_COLUMNS, UPDATE_COLUMNS};
use crate::schema;
use crate::{DeviceQuery, DeviceStore, StatusSwap, MAX_LIST_LIMIT};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};
use winlic_license::{AppUpdate, Device, DeviceInfo, DeviceStatus, DeviceUpdate, UpdateRecord};
use winlic_types::{ActivityEvent, DeviceId, Timestamp};

/// Device store backed by a single SQLite connection.
///
/// Cloning is cheap and shares the connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing and ephemeral runs).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn read_device(conn: &Connection, id: &DeviceId) -> StorageResult<Option<Device>> {
    let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE device_id = ?1");
    let row = conn
        .query_row(&sql, params![id.as_str()], DeviceRow::from_row)
        .optional()?;
    row.map(Device::try_from).transpose()
}

fn to_json<T: serde::Serialize>(value: &T) -> StorageResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn write_device(conn: &Connection, device: &Device) -> StorageResult<()> {
    conn.execute(
        "UPDATE devices SET status = ?2, registered_at = ?3, last_active_at = ?4,
             app_version = ?5, license_expiry = ?6, force_check = ?7, lock_reason = ?8,
             controls = ?9, device_info = ?10
         WHERE device_id = ?1",
        params![
            device.device_id.as_str(),
            device.status.as_str(),
            device.registered_at.as_millis(),
            device.last_active_at.as_millis(),
            device.app_version,
            device.license_expiry.map(|t| t.as_millis()),
            device.force_check,
            device.lock_reason,
            to_json(&device.controls)?,
            device.device_info.as_ref().map(to_json).transpose()?,
        ],
    )?;
    Ok(())
}

/// Escapes `%`, `_` and `\` for use in a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn read_activity(
    conn: &Connection,
    sql: &str,
    args: &[SqlValue],
) -> StorageResult<Vec<ActivityEvent>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), ActivityRow::from_row)?;
    let events = rows
        .map(|row| ActivityEvent::try_from(row?))
        .collect::<StorageResult<Vec<_>>>()?;
    Ok(events)
}

fn read_updates(conn: &Connection, limit: usize) -> StorageResult<Vec<UpdateRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {UPDATE_COLUMNS} FROM updates
         ORDER BY build_number DESC, created_at DESC, id DESC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit as i64], UpdateRow::from_row)?;
    let updates = rows
        .map(|row| UpdateRecord::try_from(row?))
        .collect::<StorageResult<Vec<_>>>()?;
    Ok(updates)
}

impl DeviceStore for SqliteStore {
    fn get_device(&self, id: &DeviceId) -> StorageResult<Option<Device>> {
        let conn = self.lock()?;
        read_device(&conn, id)
    }

    fn insert_device(&self, device: &Device) -> StorageResult<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO devices ({DEVICE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                device.device_id.as_str(),
                device.status.as_str(),
                device.registered_at.as_millis(),
                device.last_active_at.as_millis(),
                device.app_version,
                device.license_expiry.map(|t| t.as_millis()),
                device.force_check,
                device.lock_reason,
                to_json(&device.controls)?,
                device.device_info.as_ref().map(to_json).transpose()?,
            ],
        )?;
        debug!(device_id = %device.device_id, inserted = inserted == 1, "insert device");
        Ok(inserted == 1)
    }

    fn touch_device(
        &self,
        id: &DeviceId,
        seen_at: Timestamp,
        app_version: Option<&str>,
        device_info: Option<&DeviceInfo>,
    ) -> StorageResult<Option<Device>> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE devices SET last_active_at = ?2,
                 app_version = COALESCE(?3, app_version),
                 device_info = COALESCE(?4, device_info)
             WHERE device_id = ?1",
            params![
                id.as_str(),
                seen_at.as_millis(),
                app_version,
                device_info.map(to_json).transpose()?,
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        read_device(&conn, id)
    }

    fn update_device(&self, id: &DeviceId, update: &DeviceUpdate) -> StorageResult<Option<Device>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(mut device) = read_device(&tx, id)? else {
            return Ok(None);
        };
        update.apply_to(&mut device);
        write_device(&tx, &device)?;
        tx.commit()?;
        Ok(Some(device))
    }

    fn swap_status(
        &self,
        id: &DeviceId,
        expected: DeviceStatus,
        new: DeviceStatus,
        lock_reason: Option<&str>,
    ) -> StorageResult<StatusSwap> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE devices SET status = ?3, lock_reason = ?4
             WHERE device_id = ?1 AND status = ?2",
            params![id.as_str(), expected.as_str(), new.as_str(), lock_reason],
        )?;

        match read_device(&conn, id)? {
            None => Ok(StatusSwap::Missing),
            Some(device) if changed == 1 => Ok(StatusSwap::Swapped(device)),
            Some(device) => {
                warn!(
                    device_id = %id,
                    expected = %expected,
                    actual = %device.status,
                    "status swap lost the race"
                );
                Ok(StatusSwap::Mismatch(device.status))
            }
        }
    }

    fn set_force_check(&self, id: &DeviceId, force_check: bool) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE devices SET force_check = ?2 WHERE device_id = ?1",
            params![id.as_str(), force_check],
        )?;
        Ok(changed == 1)
    }

    fn list_devices(&self, query: &DeviceQuery) -> StorageResult<Vec<Device>> {
        let mut sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE 1 = 1");
        let mut args: Vec<SqlValue> = Vec::new();

        if let Some(status) = query.status {
            args.push(SqlValue::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", args.len()));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            args.push(SqlValue::Text(like_pattern(search)));
            sql.push_str(&format!(" AND device_id LIKE ?{} ESCAPE '\\'", args.len()));
        }
        sql.push_str(" ORDER BY last_active_at DESC, device_id ASC");
        if let Some(limit) = query.limit {
            args.push(SqlValue::Integer(limit.min(MAX_LIST_LIMIT) as i64));
            sql.push_str(&format!(" LIMIT ?{}", args.len()));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), DeviceRow::from_row)?;
        let devices = rows
            .map(|row| Device::try_from(row?))
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(devices)
    }

    fn save_activity(&self, events: &[ActivityEvent]) -> StorageResult<usize> {
        if events.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO activity_logs ({ACTIVITY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     device_id = excluded.device_id,
                     action_name = excluded.action_name,
                     page = excluded.page,
                     context = excluded.context,
                     timestamp = excluded.timestamp,
                     extra = excluded.extra"
            ))?;
            for event in events {
                stmt.execute(params![
                    event.id.as_str(),
                    event.device_id.as_str(),
                    event.action_name,
                    event.page,
                    event.context,
                    event.timestamp.as_millis(),
                    to_json(&event.extra)?,
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = events.len(), "saved activity batch");
        Ok(events.len())
    }

    fn device_activity(&self, id: &DeviceId, limit: usize) -> StorageResult<Vec<ActivityEvent>> {
        let conn = self.lock()?;
        read_activity(
            &conn,
            &format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
                 WHERE device_id = ?1 ORDER BY timestamp DESC, id ASC LIMIT ?2"
            ),
            &[
                SqlValue::Text(id.as_str().to_string()),
                SqlValue::Integer(limit as i64),
            ],
        )
    }

    fn recent_activity(&self, limit: usize) -> StorageResult<Vec<ActivityEvent>> {
        let conn = self.lock()?;
        read_activity(
            &conn,
            &format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
                 ORDER BY timestamp DESC, id ASC LIMIT ?1"
            ),
            &[SqlValue::Integer(limit as i64)],
        )
    }

    fn insert_update(&self, update: &AppUpdate) -> StorageResult<UpdateRecord> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO updates (version, build_number, apk_url, file_size, release_notes,
                 force_update, skip_allowed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                update.version,
                update.build_number,
                update.apk_url,
                i64::try_from(update.file_size).map_err(|_| {
                    StorageError::InvalidData(format!("file_size {} out of range", update.file_size))
                })?,
                update.release_notes,
                update.force_update,
                update.skip_allowed,
                update.created_at.as_millis(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, build_number = update.build_number, "inserted update");
        Ok(UpdateRecord {
            id,
            update: update.clone(),
        })
    }

    fn latest_update(&self) -> StorageResult<Option<UpdateRecord>> {
        let conn = self.lock()?;
        Ok(read_updates(&conn, 1)?.into_iter().next())
    }

    fn list_updates(&self, limit: usize) -> StorageResult<Vec<UpdateRecord>> {
        let conn = self.lock()?;
        read_updates(&conn, limit)
    }

    fn ping(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
