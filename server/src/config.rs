//! Command-line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use winlic_store::{SqliteStore, StorageResult};

/// Database path that selects an ephemeral in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Parser, Debug, Clone)]
#[command(name = "winlic-server")]
#[command(about = "Device license server", version)]
pub struct Args {
    /// Address to bind the HTTP API on
    #[arg(long, env = "WINLIC_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP API port
    #[arg(short, long, env = "WINLIC_PORT", default_value = "3000")]
    pub port: u16,

    /// Path to the SQLite database (":memory:" for an ephemeral store)
    #[arg(short, long, env = "WINLIC_DATABASE", default_value = "winlic.db")]
    pub database: PathBuf,

    /// API key required on /api/admin routes
    #[arg(long, env = "ADMIN_API_KEY", hide_env_values = true)]
    pub admin_api_key: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Returns the `host:port` pair to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Opens the configured store.
    pub fn open_store(&self) -> StorageResult<SqliteStore> {
        if self.database.as_os_str() == IN_MEMORY_DATABASE {
            SqliteStore::open_in_memory()
        } else {
            SqliteStore::open(&self.database)
        }
    }
}
