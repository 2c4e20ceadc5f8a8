//! SQLite store for the FIPE hierarchy cache and its refresh log
//!
//! Four hierarchy tables (brands → models → model-years → values) keyed by
//! upstream codes plus surrogate ids, and one run-log table with a row per
//! refresh attempt. The database is a cache: a schema version mismatch
//! deletes and rebuilds it.

mod hierarchy;
mod runs;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

pub use hierarchy::TableCounts;
pub use runs::{RefreshRun, RefreshStats, RunStatus};

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// How long a statement waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS fipe_brands (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS fipe_models (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        brand_id INTEGER NOT NULL REFERENCES fipe_brands(id),
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE (brand_id, code)
    );

    CREATE TABLE IF NOT EXISTS fipe_years (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        model_id INTEGER NOT NULL REFERENCES fipe_models(id),
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE (model_id, code)
    );

    CREATE TABLE IF NOT EXISTS fipe_values (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        year_id INTEGER NOT NULL UNIQUE REFERENCES fipe_years(id),
        price_cents INTEGER NOT NULL,
        brand TEXT NOT NULL,
        model TEXT NOT NULL,
        model_year INTEGER NOT NULL,
        fuel TEXT NOT NULL,
        fipe_code TEXT NOT NULL,
        reference_month TEXT NOT NULL,
        vehicle_type INTEGER NOT NULL,
        fuel_abbreviation TEXT NOT NULL,
        fetched_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS fipe_updates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        status TEXT NOT NULL CHECK (status IN ('running', 'completed', 'error')),
        total_brands INTEGER NOT NULL DEFAULT 0,
        total_models INTEGER NOT NULL DEFAULT 0,
        total_years INTEGER NOT NULL DEFAULT 0,
        total_values INTEGER NOT NULL DEFAULT 0,
        error_message TEXT,
        started_at INTEGER NOT NULL,
        finished_at INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_models_brand ON fipe_models(brand_id);
    CREATE INDEX IF NOT EXISTS idx_years_model ON fipe_years(model_id);
    CREATE INDEX IF NOT EXISTS idx_years_name ON fipe_years(name);
    CREATE INDEX IF NOT EXISTS idx_updates_started_at ON fipe_updates(started_at);
"#;

/// Relational store shared by the refresher (writer) and the reader
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the store at a database file
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Failed to create data dir: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Price cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(db_path)
                .map_err(|e| StoreError::Io(format!("Failed to remove price cache: {}", e)))?;
            return Self::open(db_path);
        }

        Self::init(conn)
    }

    /// Open a private in-memory store
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Convert a cap where zero means unlimited into a SQL `LIMIT` value
fn sql_limit(limit: usize) -> i64 {
    if limit == 0 { -1 } else { limit as i64 }
}
