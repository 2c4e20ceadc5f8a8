//! Refresh run log
//!
//! One row per refresh attempt. Opening a run doubles as an advisory lock:
//! a fresh `running` row blocks another run from starting.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use serde::Serialize;

use super::Store;
use crate::error::{Error, Result, StoreError};

/// Lifecycle status of a refresh run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Error => "error",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "error" => Ok(RunStatus::Error),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Rows written per level during one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    pub brands: usize,
    pub models: usize,
    pub years: usize,
    pub values: usize,
}

/// One row of the run log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshRun {
    pub id: i64,
    pub status: RunStatus,
    pub stats: RefreshStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RefreshRun {
    /// Still `running` after `lock_timeout`; its process is assumed dead
    pub fn is_abandoned(&self, now: DateTime<Utc>, lock_timeout: Duration) -> bool {
        self.status == RunStatus::Running && running_past(self.started_at, now, lock_timeout)
    }
}

fn running_past(started: DateTime<Utc>, now: DateTime<Utc>, lock_timeout: Duration) -> bool {
    now.signed_duration_since(started)
        .to_std()
        .map(|age| age >= lock_timeout)
        .unwrap_or(false)
}

const RUN_COLUMNS: &str = "id, status, total_brands, total_models, total_years, total_values, \
                           error_message, started_at, finished_at";

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StoreError::Corrupt {
            table: "fipe_updates",
            reason: format!("timestamp out of range: {}", millis),
        }
        .into()
    })
}

/// Raw columns, converted outside the rusqlite closure so conversion errors keep their type
struct RunRow {
    id: i64,
    status: String,
    counts: [i64; 4],
    error_message: Option<String>,
    started_at: i64,
    finished_at: Option<i64>,
}

impl RunRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            status: r.get(1)?,
            counts: [r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?],
            error_message: r.get(6)?,
            started_at: r.get(7)?,
            finished_at: r.get(8)?,
        })
    }

    fn into_run(self) -> Result<RefreshRun> {
        let status = self.status.parse::<RunStatus>().map_err(|reason| StoreError::Corrupt {
            table: "fipe_updates",
            reason,
        })?;
        Ok(RefreshRun {
            id: self.id,
            status,
            stats: RefreshStats {
                brands: self.counts[0] as usize,
                models: self.counts[1] as usize,
                years: self.counts[2] as usize,
                values: self.counts[3] as usize,
            },
            error_message: self.error_message,
            started_at: millis_to_datetime(self.started_at)?,
            finished_at: self.finished_at.map(millis_to_datetime).transpose()?,
        })
    }
}

impl Store {
    /// Open a `running` row unless a run younger than `lock_timeout` is still running.
    ///
    /// The check and the insert share an immediate transaction, so two
    /// processes cannot both pass the check.
    pub fn begin_run(&mut self, now: DateTime<Utc>, lock_timeout: Duration) -> Result<i64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let latest: Option<(String, i64)> = tx
            .query_row(
                "SELECT status, started_at FROM fipe_updates
                 ORDER BY started_at DESC, id DESC LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        if let Some((status, started_at)) = latest
            && status == RunStatus::Running.as_str()
        {
            let started = millis_to_datetime(started_at)?;
            if !running_past(started, now, lock_timeout) {
                return Err(Error::RefreshInProgress {
                    started_at: started.format("%Y-%m-%d %H:%M UTC").to_string(),
                });
            }
            log::warn!(
                "Previous run started at {} never finished; treating it as abandoned",
                started
            );
        }

        tx.execute(
            "INSERT INTO fipe_updates (status, started_at) VALUES (?1, ?2)",
            params![RunStatus::Running.as_str(), now.timestamp_millis()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(id)
    }

    /// Close a run opened by `begin_run`
    pub fn finish_run(
        &self,
        id: i64,
        stats: &RefreshStats,
        error: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let status = if error.is_some() {
            RunStatus::Error
        } else {
            RunStatus::Completed
        };

        self.conn.execute(
            "UPDATE fipe_updates
             SET status = ?1, total_brands = ?2, total_models = ?3, total_years = ?4,
                 total_values = ?5, error_message = ?6, finished_at = ?7
             WHERE id = ?8",
            params![
                status.as_str(),
                stats.brands as i64,
                stats.models as i64,
                stats.years as i64,
                stats.values as i64,
                error,
                now.timestamp_millis(),
                id
            ],
        )?;
        Ok(())
    }

    /// Insert a run row with an arbitrary start time
    #[cfg(test)]
    pub fn record_run(
        &self,
        status: RunStatus,
        stats: &RefreshStats,
        error: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO fipe_updates
                 (status, total_brands, total_models, total_years, total_values,
                  error_message, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                status.as_str(),
                stats.brands as i64,
                stats.models as i64,
                stats.years as i64,
                stats.values as i64,
                error,
                started_at.timestamp_millis()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent run by start time
    pub fn latest_run(&self) -> Result<Option<RefreshRun>> {
        let sql = format!(
            "SELECT {} FROM fipe_updates ORDER BY started_at DESC, id DESC LIMIT 1",
            RUN_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, [], RunRow::from_row)
            .optional()?;
        row.map(RunRow::into_run).transpose()
    }

    /// Run log, newest first
    pub fn runs(&self, limit: usize) -> Result<Vec<RefreshRun>> {
        let sql = format!(
            "SELECT {} FROM fipe_updates ORDER BY started_at DESC, id DESC LIMIT ?1",
            RUN_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([super::sql_limit(limit)], RunRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(RunRow::into_run).collect()
    }
}
