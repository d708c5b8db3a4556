//! Schema creation and migrations, keyed on `PRAGMA user_version`.

use crate::error::{StorageError, StorageResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version this build writes.
pub(crate) const SCHEMA_VERSION: i64 = 2;

const V1: &str = "
    CREATE TABLE IF NOT EXISTS devices (
        device_id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        registered_at INTEGER NOT NULL,
        last_active_at INTEGER NOT NULL,
        app_version TEXT,
        license_expiry INTEGER,
        force_check INTEGER NOT NULL DEFAULT 0,
        lock_reason TEXT,
        controls TEXT,
        device_info TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_devices_last_active
        ON devices (last_active_at DESC);

    CREATE TABLE IF NOT EXISTS activity_logs (
        id TEXT PRIMARY KEY,
        device_id TEXT NOT NULL,
        action_name TEXT NOT NULL,
        page TEXT NOT NULL,
        context TEXT,
        timestamp INTEGER NOT NULL,
        extra TEXT NOT NULL DEFAULT '{}'
    );

    CREATE INDEX IF NOT EXISTS idx_activity_device_time
        ON activity_logs (device_id, timestamp DESC);

    CREATE INDEX IF NOT EXISTS idx_activity_time
        ON activity_logs (timestamp DESC);
";

const V2: &str = "
    CREATE TABLE IF NOT EXISTS updates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        version TEXT NOT NULL,
        build_number INTEGER NOT NULL,
        apk_url TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        release_notes TEXT,
        force_update INTEGER NOT NULL DEFAULT 0,
        skip_allowed INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_updates_build
        ON updates (build_number DESC);
";

/// Brings the database up to [`SCHEMA_VERSION`].
pub(crate) fn migrate(conn: &Connection) -> StorageResult<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    debug!(current, target = SCHEMA_VERSION, "checking schema version");

    if current > SCHEMA_VERSION {
        return Err(StorageError::Migration(format!(
            "database schema version {current} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    if current < 1 {
        conn.execute_batch(V1)?;
        conn.pragma_update(None, "user_version", 1)?;
        info!("initialized device store schema v1");
    }

    if current < 2 {
        conn.execute_batch(V2)?;
        conn.pragma_update(None, "user_version", 2)?;
        info!("migrated device store schema to v2 (updates)");
    }

    Ok(())
}
