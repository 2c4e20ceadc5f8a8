//! Read-only queries over the cached hierarchy
//!
//! Serves lookups from the local store only; never touches the upstream API.
//! Only model-years that have a saved price are visible.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;

use crate::client::{Price, Reference};
use crate::error::{Error, Result};
use crate::store::{RefreshRun, Store, TableCounts};

/// A cached price with the labels it was fetched under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedValue {
    pub year_code: String,
    pub year_name: String,
    pub price: Price,
    pub brand: String,
    pub model: String,
    pub model_year: i32,
    pub fuel: String,
    pub fipe_code: String,
    pub reference_month: String,
    pub vehicle_type: i64,
    pub fuel_abbreviation: String,
    pub fetched_at: DateTime<Utc>,
}

/// Table sizes and freshness of the local cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    #[serde(flatten)]
    pub counts: TableCounts,
    pub last_update: Option<DateTime<Utc>>,
}

pub struct CacheReader<'a> {
    store: &'a Store,
}

fn collect_refs(
    stmt: &mut rusqlite::Statement<'_>,
    params: impl rusqlite::Params,
) -> Result<Vec<Reference>> {
    let rows = stmt
        .query_map(params, |r| Ok(Reference::new(r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl<'a> CacheReader<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Model-years that have a price, newest label first
    pub fn get_years(&self) -> Result<Vec<Reference>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT DISTINCT y.code, y.name
             FROM fipe_years y
             JOIN fipe_values v ON v.year_id = y.id
             ORDER BY y.name DESC, y.code DESC",
        )?;
        collect_refs(&mut stmt, [])
    }

    /// Brands with at least one priced model-year matching `year`
    pub fn get_brands_by_year(&self, year: &str) -> Result<Vec<Reference>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT DISTINCT b.code, b.name
             FROM fipe_brands b
             JOIN fipe_models m ON m.brand_id = b.id
             JOIN fipe_years y ON y.model_id = m.id
             JOIN fipe_values v ON v.year_id = y.id
             WHERE y.name = ?1 OR y.code = ?1
             ORDER BY b.name, b.code",
        )?;
        collect_refs(&mut stmt, params![year])
    }

    /// Models of one brand with a priced model-year matching `year`
    pub fn get_models_by_year_and_brand(
        &self,
        year: &str,
        brand_code: &str,
    ) -> Result<Vec<Reference>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT DISTINCT m.code, m.name
             FROM fipe_models m
             JOIN fipe_brands b ON b.id = m.brand_id
             JOIN fipe_years y ON y.model_id = m.id
             JOIN fipe_values v ON v.year_id = y.id
             WHERE (y.name = ?1 OR y.code = ?1) AND b.code = ?2
             ORDER BY m.name, m.code",
        )?;
        collect_refs(&mut stmt, params![year, brand_code])
    }

    /// The cached price of one model-year, or `Error::NotFound`
    pub fn get_value_by_year_brand_model(
        &self,
        year: &str,
        brand_code: &str,
        model_code: &str,
    ) -> Result<PricedValue> {
        self.store
            .conn()
            .query_row(
                "SELECT y.code, y.name, v.price_cents, v.brand, v.model, v.model_year, v.fuel,
                        v.fipe_code, v.reference_month, v.vehicle_type, v.fuel_abbreviation,
                        v.fetched_at
                 FROM fipe_values v
                 JOIN fipe_years y ON y.id = v.year_id
                 JOIN fipe_models m ON m.id = y.model_id
                 JOIN fipe_brands b ON b.id = m.brand_id
                 WHERE (y.name = ?1 OR y.code = ?1) AND b.code = ?2 AND m.code = ?3
                 ORDER BY y.code
                 LIMIT 1",
                params![year, brand_code, model_code],
                |r| {
                    let fetched: i64 = r.get(11)?;
                    Ok(PricedValue {
                        year_code: r.get(0)?,
                        year_name: r.get(1)?,
                        price: Price::from_cents(r.get(2)?),
                        brand: r.get(3)?,
                        model: r.get(4)?,
                        model_year: r.get(5)?,
                        fuel: r.get(6)?,
                        fipe_code: r.get(7)?,
                        reference_month: r.get(8)?,
                        vehicle_type: r.get(9)?,
                        fuel_abbreviation: r.get(10)?,
                        fetched_at: DateTime::from_timestamp_millis(fetched)
                            .ok_or(rusqlite::Error::IntegralValueOutOfRange(11, fetched))?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No cached value for brand {} model {} year {}",
                    brand_code, model_code, year
                ))
            })
    }

    /// Row counts plus the start time of the latest refresh
    pub fn get_cache_stats(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            counts: self.store.table_counts()?,
            last_update: self.store.latest_run()?.map(|run| run.started_at),
        })
    }

    pub fn latest_run(&self) -> Result<Option<RefreshRun>> {
        self.store.latest_run()
    }
}
