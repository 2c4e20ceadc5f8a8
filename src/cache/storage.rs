//! SQLite-backed response cache
//!
//! Stores serialized upstream responses with an expiry time and a cap on the
//! number of entries. The oldest entries are evicted once the cap is reached.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StoreError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

type Result<T> = std::result::Result<T, StoreError>;

/// Cache of upstream API responses keyed by request hash
pub struct ResponseCache {
    conn: Connection,
    db_path: PathBuf,
    max_entries: usize,
}

impl ResponseCache {
    /// Open or create the cache at the default location
    pub fn open(max_entries: usize) -> Result<Self> {
        Self::open_at(&Self::cache_dir()?, max_entries)
    }

    /// Cache directory (~/.cache/fipesync on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(StoreError::NoHome)?;
        Ok(cache_base.join("fipesync"))
    }

    /// Open the cache inside a specific directory. `max_entries` 0 disables eviction.
    pub fn open_at(cache_dir: &Path, max_entries: usize) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| StoreError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("responses.db");
        let conn = Connection::open(&db_path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Response cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(&db_path)
                .map_err(|e| StoreError::Io(format!("Failed to remove response cache: {}", e)))?;
            return Self::open_at(cache_dir, max_entries);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                scope TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expires_at ON cache_entries(expires_at);
            CREATE INDEX IF NOT EXISTS idx_created_at ON cache_entries(created_at);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn,
            db_path,
            max_entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Cached body if present and not expired
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now().timestamp_millis();

        let data = self
            .conn
            .query_row(
                "SELECT data FROM cache_entries WHERE cache_key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data)
    }

    /// Store a body with a TTL, then evict past the entry cap
    pub fn put(
        &self,
        key: &str,
        data: &str,
        endpoint: &str,
        scope: &str,
        ttl: Duration,
    ) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ttl_millis);

        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries
             (cache_key, scope, endpoint, data, created_at, expires_at, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![key, scope, endpoint, data, now, expires, data.len() as i64],
        )?;

        self.evict_over_capacity()?;
        Ok(())
    }

    /// Drop expired entries first, then the oldest until under the cap
    fn evict_over_capacity(&self) -> Result<usize> {
        if self.max_entries == 0 {
            return Ok(0);
        }

        let total = self.count()?;
        if total <= self.max_entries {
            return Ok(0);
        }

        let mut removed = self.purge_expired()?;
        let remaining = total - removed;
        if remaining > self.max_entries {
            removed += self.conn.execute(
                "DELETE FROM cache_entries WHERE cache_key IN (
                     SELECT cache_key FROM cache_entries
                     ORDER BY created_at ASC, rowid ASC
                     LIMIT ?1
                 )",
                [(remaining - self.max_entries) as i64],
            )?;
        }
        log::debug!("Evicted {} response cache entries", removed);
        Ok(removed)
    }

    /// Delete entries whose TTL has passed
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now().timestamp_millis();
        Ok(self
            .conn
            .execute("DELETE FROM cache_entries WHERE expires_at <= ?1", [now])?)
    }

    fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let count = self.count()?;
        self.conn.execute("DELETE FROM cache_entries", [])?;
        Ok(ClearStats {
            entries_removed: count,
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<ResponseCacheStats> {
        let now = Utc::now().timestamp_millis();

        let total_entries = self.count()?;

        let valid_entries: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE expires_at > ?1",
            [now],
            |r| r.get(0),
        )?;

        let total_size: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_entries",
            [],
            |r| r.get(0),
        )?;

        let (oldest, newest): (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM cache_entries WHERE expires_at > ?1",
            [now],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(ResponseCacheStats {
            total_entries,
            valid_entries: valid_entries as usize,
            expired_entries: total_entries.saturating_sub(valid_entries as usize),
            total_size_bytes: total_size as usize,
            max_entries: self.max_entries,
            oldest_entry: oldest,
            newest_entry: newest,
        })
    }
}

/// Statistics about cache clear operation
#[derive(Debug, Serialize)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state. Timestamps are unix millis.
#[derive(Debug, Serialize)]
pub struct ResponseCacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    pub max_entries: usize,
    pub oldest_entry: Option<i64>,
    pub newest_entry: Option<i64>,
}
