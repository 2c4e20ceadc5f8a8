//! Configuration management for fipesync

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::VehicleKind;
use crate::error::{ConfigError, Result, StoreError};

/// Default FIPE API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://parallelum.com.br/fipe/api/v1";

/// Longest accepted hour-based window (one leap year)
const MAX_HOURS: u64 = 366 * 24;

/// Longest accepted minute-based window
const MAX_MINUTES: u64 = MAX_HOURS * 60;

/// Longest accepted per-request timeout
const MAX_REQUEST_SECS: u64 = 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// FIPE API base URL
    pub api_base_url: String,

    /// Vehicle category walked by refreshes and live lookups
    pub vehicle_kind: VehicleKind,

    /// SQLite database holding the price cache (defaults to the XDG data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Minimum hours between two full refreshes
    pub refresh_interval_hours: u64,

    /// Minutes after a failed run before the cache is eligible again
    pub retry_after_failure_minutes: u64,

    /// Minutes after which a run still marked running is considered abandoned
    pub lock_timeout_minutes: u64,

    /// Upstream request pacing
    pub requests_per_second: u32,

    /// Per-request upstream timeout
    pub request_timeout_secs: u64,

    /// Capped walk sizes
    pub limits: WalkLimits,

    /// Response cache for live lookups
    pub response_cache: ResponseCacheConfig,

    /// Slack incoming webhook notified after each `update`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_webhook_url: Option<String>,
}

/// How many children per level one refresh walks. Zero disables the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkLimits {
    pub max_brands: usize,
    pub max_models_per_brand: usize,
    pub max_years_per_model: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_brands: 10,
            max_models_per_brand: 5,
            max_years_per_model: 3,
        }
    }
}

impl WalkLimits {
    /// A walk over the full cross-product
    #[cfg(test)]
    pub fn unbounded() -> Self {
        Self {
            max_brands: 0,
            max_models_per_brand: 0,
            max_years_per_model: 0,
        }
    }
}

/// Live lookup response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseCacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
    pub max_entries: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 24,
            max_entries: 5000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            vehicle_kind: VehicleKind::default(),
            database_path: None,
            refresh_interval_hours: 24,
            retry_after_failure_minutes: 60,
            lock_timeout_minutes: 120,
            requests_per_second: 5,
            request_timeout_secs: 30,
            limits: WalkLimits::default(),
            response_cache: ResponseCacheConfig::default(),
            slack_webhook_url: None,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".fipesync").join("config.yaml"))
    }

    /// Resolve a config path override, falling back to the default location
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration, returning defaults when the file does not exist
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match Self::load_from(&Self::resolve_path(path)?) {
            Err(crate::error::Error::Config(ConfigError::NotFound)) => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a path override or the default location
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(&Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // The webhook URL is a credential
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Reject values that would make the refresher misbehave
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".to_string()).into());
        }
        if self.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "requests_per_second must be at least 1".to_string(),
            )
            .into());
        }
        check_range("refresh_interval_hours", self.refresh_interval_hours, 1, MAX_HOURS)?;
        check_range(
            "retry_after_failure_minutes",
            self.retry_after_failure_minutes,
            0,
            MAX_MINUTES,
        )?;
        check_range("lock_timeout_minutes", self.lock_timeout_minutes, 1, MAX_MINUTES)?;
        check_range("request_timeout_secs", self.request_timeout_secs, 1, MAX_REQUEST_SECS)?;
        check_range("response_cache.ttl_hours", self.response_cache.ttl_hours, 0, MAX_HOURS)?;
        Ok(())
    }

    /// Database path, falling back to `<data dir>/fipesync/fipe.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.database_path {
            return Ok(path.clone());
        }
        let base = dirs::data_dir().ok_or(StoreError::NoHome)?;
        Ok(base.join("fipesync").join("fipe.db"))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_hours.saturating_mul(60 * 60))
    }

    pub fn retry_after_failure(&self) -> Duration {
        Duration::from_secs(self.retry_after_failure_minutes.saturating_mul(60))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn response_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.response_cache.ttl_hours.saturating_mul(60 * 60))
    }
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.vehicle_kind, VehicleKind::Cars);
        assert_eq!(config.refresh_interval(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.limits, WalkLimits::default());
        assert_eq!(config.limits.max_brands, 10);
        assert_eq!(config.limits.max_models_per_brand, 5);
        assert_eq!(config.limits.max_years_per_model, 3);
        assert!(config.response_cache.enabled);
        assert!(config.slack_webhook_url.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = Config::load_at(path.to_str()).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.vehicle_kind = VehicleKind::Motorcycles;
        config.limits.max_brands = 2;
        config.database_path = Some(dir.path().join("fipe.db"));
        config.slack_webhook_url = Some("https://hooks.slack.test/abc".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.vehicle_kind, VehicleKind::Motorcycles);
        assert_eq!(loaded.limits.max_brands, 2);
        assert_eq!(loaded.limits.max_models_per_brand, 5);
        assert_eq!(loaded.database_path, Some(dir.path().join("fipe.db")));
        assert_eq!(
            loaded.slack_webhook_url.as_deref(),
            Some("https://hooks.slack.test/abc")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        Config::default().save_to(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "vehicle_kind: caminhoes\nlimits:\n  max_brands: 0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.vehicle_kind, VehicleKind::Trucks);
        assert_eq!(config.limits.max_brands, 0);
        assert_eq!(config.limits.max_years_per_model, 3);
        assert_eq!(config.refresh_interval_hours, 24);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "refresh_interval_hours: 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("refresh_interval_hours"));
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = Config {
            database_path: Some(PathBuf::from("/tmp/custom.db")),
            ..Config::default()
        };
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/custom.db")
        );
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "refresh_interval_hours: 18446744073709551615\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("refresh_interval_hours"));
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_window_bounds() {
        let mut config = Config {
            lock_timeout_minutes: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.lock_timeout_minutes = 120;
        config.response_cache.ttl_hours = MAX_HOURS + 1;
        assert!(config.validate().is_err());

        config.response_cache.ttl_hours = MAX_HOURS;
        config.refresh_interval_hours = MAX_HOURS;
        config.retry_after_failure_minutes = MAX_MINUTES;
        config.validate().unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(MAX_HOURS * 60 * 60));
    }

    #[test]
    fn test_duration_accessors_saturate() {
        let config = Config {
            refresh_interval_hours: u64::MAX,
            lock_timeout_minutes: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(u64::MAX));
        assert_eq!(config.lock_timeout(), Duration::from_secs(u64::MAX));
    }
}
