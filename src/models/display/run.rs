//! Refresh run display model

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use crate::output::formatters::{format_datetime, format_datetime_opt, format_duration, truncate};
use crate::store::RefreshRun;

/// Maximum error message length in table cells
const ERROR_WIDTH: usize = 48;

/// One row of the refresh history
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct RunDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    /// Stored status, or `abandoned` for a run left `running` past the lock timeout
    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "BRANDS")]
    pub brands: usize,

    #[tabled(rename = "MODELS")]
    pub models: usize,

    #[tabled(rename = "YEARS")]
    pub years: usize,

    #[tabled(rename = "VALUES")]
    pub values: usize,

    #[tabled(rename = "STARTED")]
    pub started: String,

    #[tabled(rename = "FINISHED")]
    pub finished: String,

    #[tabled(rename = "DURATION")]
    pub duration: String,

    #[tabled(rename = "ERROR")]
    pub error: String,
}

impl RunDisplay {
    pub fn new(run: RefreshRun, now: DateTime<Utc>, lock_timeout: Duration) -> Self {
        let status = if run.is_abandoned(now, lock_timeout) {
            "abandoned".to_string()
        } else {
            run.status.to_string()
        };
        let duration = run
            .finished_at
            .and_then(|f| f.signed_duration_since(run.started_at).to_std().ok())
            .map(format_duration)
            .unwrap_or_else(|| "-".to_string());

        Self {
            id: run.id,
            status,
            brands: run.stats.brands,
            models: run.stats.models,
            years: run.stats.years,
            values: run.stats.values,
            started: format_datetime(&run.started_at),
            finished: format_datetime_opt(run.finished_at.as_ref()),
            duration,
            error: run
                .error_message
                .as_deref()
                .map(|e| truncate(e, ERROR_WIDTH))
                .unwrap_or_default(),
        }
    }
}
