//! Command execution context
//!
//! Loads the config once, applies CLI overrides, and builds the store,
//! refresher and clients commands need.

use std::path::PathBuf;

use crate::cache::{CachedFipeClient, ResponseCache};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::FipeClient;
use crate::config::{Config, WalkLimits};
use crate::error::Result;
use crate::notify::SlackNotifier;
use crate::refresh::{RefreshPolicy, Refresher};
use crate::store::Store;

/// Context for command execution containing config and runtime options
pub struct CommandContext {
    /// Loaded config with CLI/env overrides applied
    pub config: Config,
    pub format: OutputFormat,
    no_cache: bool,
}

impl CommandContext {
    /// Load config (defaults when the file is missing) and apply overrides
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;

        if let Some(url) = opts.api_url_ref() {
            config.api_base_url = url.to_string();
        }
        if let Some(db) = opts.db_ref() {
            config.database_path = Some(PathBuf::from(db));
        }
        config.validate()?;

        Ok(Self {
            config,
            format: opts.format,
            no_cache: opts.no_cache,
        })
    }

    pub fn open_store(&self) -> Result<Store> {
        let path = self.config.database_path()?;
        log::debug!("Opening price cache at {}", path.display());
        Store::open(&path)
    }

    /// Refresher against the live API with the given walk caps
    pub fn refresher(&self, limits: WalkLimits) -> Result<Refresher<FipeClient>> {
        let client = FipeClient::from_config(&self.config)?;
        let policy = RefreshPolicy {
            limits,
            ..RefreshPolicy::from_config(&self.config)
        };
        Ok(Refresher::new(client, self.open_store()?, policy))
    }

    pub fn policy(&self) -> RefreshPolicy {
        RefreshPolicy::from_config(&self.config)
    }

    /// Upstream client for live lookups, behind the response cache unless disabled
    pub fn live_client(&self) -> Result<CachedFipeClient<FipeClient>> {
        let inner = FipeClient::from_config(&self.config)?;

        let cache = if self.no_cache || !self.config.response_cache.enabled {
            None
        } else {
            match ResponseCache::open(self.config.response_cache.max_entries) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    log::warn!("Response cache unavailable, querying upstream directly: {}", e);
                    None
                }
            }
        };

        let scope = format!("{}|{}", self.config.api_base_url, self.config.vehicle_kind);
        Ok(CachedFipeClient::new(
            inner,
            cache,
            scope,
            self.config.response_cache_ttl(),
        ))
    }

    /// Slack notifier if a webhook is configured
    pub fn notifier(&self) -> Option<SlackNotifier> {
        let url = self.config.slack_webhook_url.as_deref()?;
        match SlackNotifier::new(url) {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("Slack notifications disabled: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts(dir: &TempDir) -> GlobalOptions {
        GlobalOptions {
            format: OutputFormat::Table,
            config: Some(dir.path().join("config.yaml").display().to_string()),
            db: None,
            api_url: None,
            no_cache: false,
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let ctx = CommandContext::new(&opts(&dir)).unwrap();
        assert_eq!(ctx.config.api_base_url, crate::config::DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.api_base_url = "http://from-file".to_string();
        config.save_to(&dir.path().join("config.yaml")).unwrap();

        let db = dir.path().join("override.db");
        let mut o = opts(&dir);
        o.api_url = Some("http://from-flag".to_string());
        o.db = Some(db.display().to_string());

        let ctx = CommandContext::new(&o).unwrap();
        assert_eq!(ctx.config.api_base_url, "http://from-flag");
        assert_eq!(ctx.config.database_path().unwrap(), db);

        ctx.open_store().unwrap();
        assert!(db.exists());
    }

    #[test]
    fn test_empty_api_url_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut o = opts(&dir);
        o.api_url = Some("  ".to_string());
        assert!(CommandContext::new(&o).is_err());
    }

    #[test]
    fn test_notifier_only_with_webhook() {
        let dir = TempDir::new().unwrap();
        let mut ctx = CommandContext::new(&opts(&dir)).unwrap();
        assert!(ctx.notifier().is_none());

        ctx.config.slack_webhook_url = Some("http://localhost/hook".to_string());
        assert!(ctx.notifier().is_some());
    }
}
