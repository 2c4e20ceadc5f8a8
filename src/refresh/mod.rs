//! Refresh orchestrator
//!
//! Rebuilds the local hierarchy from the upstream API: wipe, save every
//! brand, then walk a capped subset of brands → models → years → values.
//! Each refresh is bracketed by a run-log row that records its outcome.

mod isolated;
mod staleness;

use chrono::Utc;

use crate::client::FipeApi;
use crate::error::Result;
use crate::store::{RefreshStats, Store};

pub use isolated::isolated;
pub use staleness::{RefreshPolicy, needs_update_at, next_eligible_at};

/// Where the refresher is in its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshState {
    Idle,
    Running { run_id: i64 },
    Completed(RefreshStats),
    Failed(String),
}

/// Drives a full refresh of the local cache
pub struct Refresher<C: FipeApi> {
    client: C,
    store: Store,
    policy: RefreshPolicy,
    state: RefreshState,
}

impl<C: FipeApi> Refresher<C> {
    pub fn new(client: C, store: Store, policy: RefreshPolicy) -> Self {
        Self {
            client,
            store,
            policy,
            state: RefreshState::Idle,
        }
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    #[cfg(test)]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Whether the cache is due for a refresh now
    pub fn needs_update(&self) -> bool {
        needs_update_at(&self.store, &self.policy, Utc::now())
    }

    /// Delete every brand, model, year and value. The run log is kept.
    pub fn clear_old_data(&self) -> Result<()> {
        log::info!("Clearing cached FIPE data");
        self.store.clear_hierarchy()?;
        log::debug!("Cached FIPE data cleared");
        Ok(())
    }

    /// Run one complete refresh and record it in the run log.
    ///
    /// Fails only when the run cannot start, the wipe fails, or the brand
    /// list cannot be fetched or saved. Everything below the brand level is
    /// skipped on error and the run still completes.
    pub async fn perform_full_update(&mut self) -> Result<RefreshStats> {
        if let RefreshState::Running { run_id } = self.state {
            log::warn!("Run {} was interrupted before finishing", run_id);
        }

        let run_id = self.store.begin_run(Utc::now(), self.policy.lock_timeout)?;
        self.state = RefreshState::Running { run_id };
        log::info!("Refresh run {} started", run_id);

        let mut stats = RefreshStats::default();
        let outcome = self.walk(&mut stats).await;

        match outcome {
            Ok(()) => {
                if let Err(e) = self.store.finish_run(run_id, &stats, None, Utc::now()) {
                    log::warn!("Failed to record completion of run {}: {}", run_id, e);
                }
                log::info!(
                    "Refresh run {} completed: {} brands, {} models, {} years, {} values",
                    run_id,
                    stats.brands,
                    stats.models,
                    stats.years,
                    stats.values
                );
                self.state = RefreshState::Completed(stats);
                Ok(stats)
            }
            Err(err) => {
                let message = err.to_string();
                log::error!("Refresh run {} failed: {}", run_id, message);
                if let Err(e) = self
                    .store
                    .finish_run(run_id, &stats, Some(&message), Utc::now())
                {
                    log::warn!("Failed to record failure of run {}: {}", run_id, e);
                }
                self.state = RefreshState::Failed(message);
                Err(err)
            }
        }
    }

    async fn walk(&self, stats: &mut RefreshStats) -> Result<()> {
        let limits = self.policy.limits;

        self.clear_old_data()?;

        let brands = self.client.list_brands().await?;
        for brand in &brands {
            self.store.upsert_brand(brand)?;
        }
        stats.brands = brands.len();
        log::info!("Saved {} brands", stats.brands);

        let selected = isolated("listing saved brands", Vec::new(), async {
            self.store.brands(limits.max_brands)
        })
        .await;

        for brand in &selected {
            stats.models += isolated(
                format!("models of brand {} ({})", brand.code, brand.name),
                0,
                self.save_models(&brand.code),
            )
            .await;

            let models = isolated(
                format!("listing saved models of brand {}", brand.code),
                Vec::new(),
                async { self.store.models_of(&brand.code, limits.max_models_per_brand) },
            )
            .await;

            for model in &models {
                stats.years += isolated(
                    format!("years of model {}/{} ({})", brand.code, model.code, model.name),
                    0,
                    self.save_years(&brand.code, &model.code),
                )
                .await;

                let years = isolated(
                    format!("listing saved years of model {}/{}", brand.code, model.code),
                    Vec::new(),
                    async {
                        self.store
                            .years_of(&brand.code, &model.code, limits.max_years_per_model)
                    },
                )
                .await;

                for year in &years {
                    stats.values += isolated(
                        format!("value of {}/{}/{}", brand.code, model.code, year.code),
                        0,
                        self.save_value(&brand.code, &model.code, &year.code),
                    )
                    .await;
                }
            }
        }

        Ok(())
    }

    async fn save_models(&self, brand: &str) -> Result<usize> {
        let models = self.client.list_models(brand).await?;
        for model in &models {
            self.store.upsert_model(brand, model)?;
        }
        log::debug!("Saved {} models of brand {}", models.len(), brand);
        Ok(models.len())
    }

    async fn save_years(&self, brand: &str, model: &str) -> Result<usize> {
        let years = self.client.list_years(brand, model).await?;
        for year in &years {
            self.store.upsert_year(brand, model, year)?;
        }
        log::debug!("Saved {} years of model {}/{}", years.len(), brand, model);
        Ok(years.len())
    }

    async fn save_value(&self, brand: &str, model: &str, year: &str) -> Result<usize> {
        let value = self.client.get_value(brand, model, year).await?;
        self.store.upsert_value(brand, model, year, &value, Utc::now())?;
        Ok(1)
    }
}
