//! When is the cache due for another refresh

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{Config, WalkLimits};
use crate::store::{RefreshRun, RunStatus, Store};

/// Timing and scope knobs of the refresher
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Minimum time between the starts of two refreshes
    pub interval: Duration,
    /// Shorter window applied after a failed run
    pub retry_after_failure: Duration,
    /// Age after which a run still marked running no longer blocks a new one
    pub lock_timeout: Duration,
    pub limits: WalkLimits,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            retry_after_failure: Duration::from_secs(60 * 60),
            lock_timeout: Duration::from_secs(2 * 60 * 60),
            limits: WalkLimits::default(),
        }
    }
}

impl RefreshPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.refresh_interval(),
            retry_after_failure: config.retry_after_failure(),
            lock_timeout: config.lock_timeout(),
            limits: config.limits,
        }
    }

    /// Window that must pass after `run` started before the next refresh.
    ///
    /// Failed runs retry sooner. Running rows, including crashed ones, wait
    /// out the full interval from their start.
    pub fn window_after(&self, run: &RefreshRun) -> Duration {
        match run.status {
            RunStatus::Error => self.retry_after_failure,
            RunStatus::Running | RunStatus::Completed => self.interval,
        }
    }
}

/// Whether a refresh is due at `now`. Fails open: an unreadable log means yes.
pub fn needs_update_at(store: &Store, policy: &RefreshPolicy, now: DateTime<Utc>) -> bool {
    match store.latest_run() {
        Ok(None) => true,
        Ok(Some(run)) => match now.signed_duration_since(run.started_at).to_std() {
            Ok(elapsed) => elapsed >= policy.window_after(&run),
            // Started in the future: clock skew, not due
            Err(_) => false,
        },
        Err(err) => {
            log::warn!("Could not read refresh log, assuming an update is needed: {}", err);
            true
        }
    }
}

/// Earliest time the next refresh is due, `None` on a cold start
pub fn next_eligible_at(
    store: &Store,
    policy: &RefreshPolicy,
) -> crate::error::Result<Option<DateTime<Utc>>> {
    Ok(store.latest_run()?.map(|run| {
        chrono::Duration::from_std(policy.window_after(&run))
            .ok()
            .and_then(|window| run.started_at.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }))
}
