//! Mock FIPE API client for testing
//!
//! Serves a configured in-memory hierarchy and can fail chosen calls, so the
//! refresher's failure handling can be exercised without a network.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{FipeApi, Reference, UpstreamValue};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockFipeClient::new()
///     .with_brand(Reference::new("59", "VW"))
///     .with_models("59", vec![Reference::new("5940", "Golf")])
///     .failing_models_for("21");
/// ```
#[derive(Default)]
pub struct MockFipeClient {
    brands: Vec<Reference>,
    models: HashMap<String, Vec<Reference>>,
    years: HashMap<(String, String), Vec<Reference>>,
    values: HashMap<(String, String, String), UpstreamValue>,
    fail_brands: bool,
    failing_models: HashSet<String>,
    failing_years: HashSet<(String, String)>,
    failing_values: HashSet<(String, String, String)>,
    call_count: Mutex<CallCounts>,
}

/// Number of calls per endpoint
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct CallCounts {
    pub list_brands: usize,
    pub list_models: usize,
    pub list_years: usize,
    pub get_value: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list_brands + self.list_models + self.list_years + self.get_value
    }
}

impl MockFipeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_brand(mut self, brand: Reference) -> Self {
        self.brands.push(brand);
        self
    }

    pub fn with_models(mut self, brand: &str, models: Vec<Reference>) -> Self {
        self.models.insert(brand.to_string(), models);
        self
    }

    pub fn with_years(mut self, brand: &str, model: &str, years: Vec<Reference>) -> Self {
        self.years.insert((brand.to_string(), model.to_string()), years);
        self
    }

    pub fn with_value(
        mut self,
        brand: &str,
        model: &str,
        year: &str,
        value: UpstreamValue,
    ) -> Self {
        self.values.insert(
            (brand.to_string(), model.to_string(), year.to_string()),
            value,
        );
        self
    }

    /// Make the brand list call fail
    pub fn failing_brands(mut self) -> Self {
        self.fail_brands = true;
        self
    }

    /// Make the model list of one brand fail
    pub fn failing_models_for(mut self, brand: &str) -> Self {
        self.failing_models.insert(brand.to_string());
        self
    }

    /// Make the year list of one model fail
    pub fn failing_years_for(mut self, brand: &str, model: &str) -> Self {
        self.failing_years.insert((brand.to_string(), model.to_string()));
        self
    }

    /// Make the price of one model-year fail
    pub fn failing_value_for(mut self, brand: &str, model: &str, year: &str) -> Self {
        self.failing_values
            .insert((brand.to_string(), model.to_string(), year.to_string()));
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }
}

#[async_trait]
impl FipeApi for MockFipeClient {
    async fn list_brands(&self) -> Result<Vec<Reference>> {
        self.call_count.lock().await.list_brands += 1;
        if self.fail_brands {
            return Err(ApiError::ServerError("brand list unavailable".to_string()).into());
        }
        Ok(self.brands.clone())
    }

    async fn list_models(&self, brand: &str) -> Result<Vec<Reference>> {
        self.call_count.lock().await.list_models += 1;
        if self.failing_models.contains(brand) {
            return Err(ApiError::Network(format!("models of brand {} timed out", brand)).into());
        }
        Ok(self.models.get(brand).cloned().unwrap_or_default())
    }

    async fn list_years(&self, brand: &str, model: &str) -> Result<Vec<Reference>> {
        self.call_count.lock().await.list_years += 1;
        let key = (brand.to_string(), model.to_string());
        if self.failing_years.contains(&key) {
            return Err(ApiError::ServerError(format!("years of model {} failed", model)).into());
        }
        Ok(self.years.get(&key).cloned().unwrap_or_default())
    }

    async fn get_value(&self, brand: &str, model: &str, year: &str) -> Result<UpstreamValue> {
        self.call_count.lock().await.get_value += 1;
        let key = (brand.to_string(), model.to_string(), year.to_string());
        if self.failing_values.contains(&key) {
            return Err(ApiError::InvalidResponse(format!("value of {} was garbled", year)).into());
        }
        self.values.get(&key).cloned().ok_or_else(|| {
            ApiError::NotFound(format!("/marcas/{}/modelos/{}/anos/{}", brand, model, year)).into()
        })
    }
}

/// Upstream value fixture with sensible defaults
pub fn upstream_value(brand: &str, model: &str, year: i32, price: &str) -> UpstreamValue {
    UpstreamValue {
        vehicle_type: 1,
        price: price.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        model_year: year,
        fuel: "Gasolina".to_string(),
        fipe_code: "005340-6".to_string(),
        reference_month: "julho de 2024".to_string(),
        fuel_abbreviation: "G".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_default_empty() {
        let mock = MockFipeClient::new();

        assert!(mock.list_brands().await.unwrap().is_empty());
        assert!(mock.list_models("59").await.unwrap().is_empty());
        assert!(mock.get_value("59", "1", "2020-1").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_failures_are_targeted() {
        let mock = MockFipeClient::new()
            .with_models("59", vec![Reference::new("5940", "Golf")])
            .failing_models_for("21");

        assert!(mock.list_models("21").await.is_err());
        assert_eq!(mock.list_models("59").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_call_counts() {
        let mock = MockFipeClient::new();

        mock.list_brands().await.unwrap();
        mock.list_models("59").await.unwrap();
        mock.list_models("21").await.unwrap();

        let counts = mock.call_counts().await;
        assert_eq!(counts.list_brands, 1);
        assert_eq!(counts.list_models, 2);
        assert_eq!(counts.total(), 3);
    }
}
