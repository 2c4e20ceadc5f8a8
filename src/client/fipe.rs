//! FIPE API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{FipeApi, Reference, UpstreamValue, VehicleKind};
use crate::config::Config;
use crate::error::{ApiError, Result};

/// Default pacing when none is configured
#[cfg(test)]
const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Default per-request timeout
#[cfg(test)]
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// FIPE API client
pub struct FipeClient {
    http: HttpClient,
    base_url: String,
    kind: VehicleKind,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl FipeClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            &config.api_base_url,
            config.vehicle_kind,
            config.requests_per_second,
            config.request_timeout(),
        )
    }

    /// Create a client against a custom host with default pacing
    #[cfg(test)]
    pub fn with_base_url(base_url: &str, kind: VehicleKind) -> Result<Self> {
        Self::build(base_url, kind, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_TIMEOUT)
    }

    fn build(
        base_url: &str,
        kind: VehicleKind,
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("fipesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            kind,
            rate_limiter,
        })
    }

    #[cfg(test)]
    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    /// GET a path below `/{kind}` and decode the JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}{}", self.base_url, self.kind.as_path(), path);
        log::debug!("GET {}", url);

        let response = self.http.get(&url).send().await.map_err(ApiError::from)?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let data = response.json::<T>().await.map_err(|e| {
                    ApiError::InvalidResponse(format!(
                        "Failed to parse response from {}: {}",
                        path, e
                    ))
                })?;
                Ok(data)
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string()).into()),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)).into())
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                Err(ApiError::BadRequest(error_msg).into())
            }
            status if status.is_server_error() => {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("Server error: {}", status));
                Err(ApiError::ServerError(error_msg).into())
            }
            _ => {
                let error_msg = format!("Unexpected status code: {}", status);
                Err(ApiError::InvalidResponse(error_msg).into())
            }
        }
    }
}

#[async_trait]
impl FipeApi for FipeClient {
    async fn list_brands(&self) -> Result<Vec<Reference>> {
        self.get("/marcas").await
    }

    async fn list_models(&self, brand: &str) -> Result<Vec<Reference>> {
        #[derive(Deserialize)]
        struct ModelsResponse {
            modelos: Vec<Reference>,
        }

        let path = format!("/marcas/{}/modelos", brand);
        let response: ModelsResponse = self.get(&path).await?;
        Ok(response.modelos)
    }

    async fn list_years(&self, brand: &str, model: &str) -> Result<Vec<Reference>> {
        let path = format!("/marcas/{}/modelos/{}/anos", brand, model);
        self.get(&path).await
    }

    async fn get_value(&self, brand: &str, model: &str, year: &str) -> Result<UpstreamValue> {
        let path = format!("/marcas/{}/modelos/{}/anos/{}", brand, model, year);
        self.get(&path).await
    }
}
