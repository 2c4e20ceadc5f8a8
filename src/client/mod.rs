//! FIPE price table API client

use async_trait::async_trait;

use crate::error::Result;

pub mod fipe;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use fipe::FipeClient;
#[cfg(test)]
pub use mock::MockFipeClient;
pub use models::{Price, Reference, UpstreamValue, VehicleKind};

/// Read-only view of the FIPE hierarchy: brands → models → model-years → value.
///
/// Every call may fail independently; callers decide how far a failure spreads.
#[async_trait]
pub trait FipeApi: Send + Sync {
    /// List all brands
    async fn list_brands(&self) -> Result<Vec<Reference>>;

    /// List models of one brand
    async fn list_models(&self, brand: &str) -> Result<Vec<Reference>>;

    /// List model-years (year + fuel variants) of one model
    async fn list_years(&self, brand: &str, model: &str) -> Result<Vec<Reference>>;

    /// Get the current price of one model-year
    async fn get_value(&self, brand: &str, model: &str, year: &str) -> Result<UpstreamValue>;
}
