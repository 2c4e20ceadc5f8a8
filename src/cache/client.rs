//! Cached wrapper for the FIPE API client
//!
//! Used by the live lookup commands. The refresher always talks to the
//! upstream directly so a refresh never replays stale responses.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Mutex;
use std::time::Duration;

use crate::cache::{ResponseCache, cache_key};
use crate::client::{FipeApi, Reference, UpstreamValue};
use crate::error::Result;

/// Cached wrapper for any `FipeApi` implementation.
///
/// A `None` cache (`--no-cache`, disabled in config, or unopenable) passes
/// every call straight through.
pub struct CachedFipeClient<C: FipeApi> {
    inner: C,
    cache: Option<Mutex<ResponseCache>>,
    scope: String,
    ttl: Duration,
}

impl<C: FipeApi> CachedFipeClient<C> {
    /// Wrap `inner`; `scope` keeps entries for different upstreams apart
    pub fn new(
        inner: C,
        cache: Option<ResponseCache>,
        scope: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            cache: cache.map(Mutex::new),
            scope: scope.into(),
            ttl,
        }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn get_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cache = self.cache.as_ref()?;
        let guard = cache.lock().ok()?;
        match guard.get(key) {
            Ok(data) => data.and_then(|d| serde_json::from_str(&d).ok()),
            Err(e) => {
                log::debug!("Response cache read failed: {}", e);
                None
            }
        }
    }

    fn set_cached<T: Serialize>(&self, key: &str, data: &T, endpoint: &str) {
        if let Some(ref cache) = self.cache
            && let Ok(guard) = cache.lock()
            && let Ok(json) = serde_json::to_string(data)
            && let Err(e) = guard.put(key, &json, endpoint, &self.scope, self.ttl)
        {
            log::debug!("Response cache write failed: {}", e);
        }
    }

    async fn cached<T, F>(&self, endpoint: &str, params: &[&str], fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: std::future::Future<Output = Result<T>>,
    {
        let key = cache_key(endpoint, &self.scope, params);

        if let Some(hit) = self.get_cached(&key) {
            log::debug!("Cache hit: {}", endpoint);
            return Ok(hit);
        }

        let result = fetch.await?;
        self.set_cached(&key, &result, endpoint);
        Ok(result)
    }
}

#[async_trait]
impl<C: FipeApi> FipeApi for CachedFipeClient<C> {
    async fn list_brands(&self) -> Result<Vec<Reference>> {
        self.cached("list_brands", &[], self.inner.list_brands()).await
    }

    async fn list_models(&self, brand: &str) -> Result<Vec<Reference>> {
        self.cached("list_models", &[brand], self.inner.list_models(brand))
            .await
    }

    async fn list_years(&self, brand: &str, model: &str) -> Result<Vec<Reference>> {
        self.cached("list_years", &[brand, model], self.inner.list_years(brand, model))
            .await
    }

    async fn get_value(&self, brand: &str, model: &str, year: &str) -> Result<UpstreamValue> {
        self.cached(
            "get_value",
            &[brand, model, year],
            self.inner.get_value(brand, model, year),
        )
        .await
    }
}
