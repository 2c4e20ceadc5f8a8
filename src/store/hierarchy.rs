//! Brand / model / model-year / value tables

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use super::{Store, sql_limit};
use crate::client::{Price, Reference, UpstreamValue};
use crate::error::Result;

/// Row counts of the four hierarchy tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub brands: usize,
    pub models: usize,
    pub years: usize,
    pub values: usize,
}

impl Store {
    /// Insert a brand or rename it on code conflict
    pub fn upsert_brand(&self, brand: &Reference) -> Result<()> {
        self.conn.execute(
            "INSERT INTO fipe_brands (code, name) VALUES (?1, ?2)
             ON CONFLICT (code) DO UPDATE SET name = excluded.name",
            params![brand.code, brand.name],
        )?;
        Ok(())
    }

    /// Insert a model under an existing brand or rename it on (brand, code) conflict
    pub fn upsert_model(&self, brand_code: &str, model: &Reference) -> Result<()> {
        self.conn.execute(
            "INSERT INTO fipe_models (brand_id, code, name)
             VALUES ((SELECT id FROM fipe_brands WHERE code = ?1), ?2, ?3)
             ON CONFLICT (brand_id, code) DO UPDATE SET name = excluded.name",
            params![brand_code, model.code, model.name],
        )?;
        Ok(())
    }

    /// Insert a model-year under an existing model or rename it on (model, code) conflict
    pub fn upsert_year(&self, brand_code: &str, model_code: &str, year: &Reference) -> Result<()> {
        self.conn.execute(
            "INSERT INTO fipe_years (model_id, code, name)
             VALUES ((SELECT m.id FROM fipe_models m
                      JOIN fipe_brands b ON b.id = m.brand_id
                      WHERE b.code = ?1 AND m.code = ?2), ?3, ?4)
             ON CONFLICT (model_id, code) DO UPDATE SET name = excluded.name",
            params![brand_code, model_code, year.code, year.name],
        )?;
        Ok(())
    }

    /// Insert or overwrite the single current price of a model-year
    pub fn upsert_value(
        &self,
        brand_code: &str,
        model_code: &str,
        year_code: &str,
        value: &UpstreamValue,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let price = Price::parse(&value.price)?;

        self.conn.execute(
            "INSERT INTO fipe_values
                 (year_id, price_cents, brand, model, model_year, fuel, fipe_code,
                  reference_month, vehicle_type, fuel_abbreviation, fetched_at)
             VALUES ((SELECT y.id FROM fipe_years y
                      JOIN fipe_models m ON m.id = y.model_id
                      JOIN fipe_brands b ON b.id = m.brand_id
                      WHERE b.code = ?1 AND m.code = ?2 AND y.code = ?3),
                     ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT (year_id) DO UPDATE SET
                 price_cents = excluded.price_cents,
                 brand = excluded.brand,
                 model = excluded.model,
                 model_year = excluded.model_year,
                 fuel = excluded.fuel,
                 fipe_code = excluded.fipe_code,
                 reference_month = excluded.reference_month,
                 vehicle_type = excluded.vehicle_type,
                 fuel_abbreviation = excluded.fuel_abbreviation,
                 fetched_at = excluded.fetched_at",
            params![
                brand_code,
                model_code,
                year_code,
                price.cents(),
                value.brand,
                value.model,
                value.model_year,
                value.fuel,
                value.fipe_code,
                value.reference_month.trim(),
                value.vehicle_type,
                value.fuel_abbreviation,
                fetched_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Delete every hierarchy row, children before parents
    pub fn clear_hierarchy(&self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM fipe_values;
             DELETE FROM fipe_years;
             DELETE FROM fipe_models;
             DELETE FROM fipe_brands;",
        )?;
        Ok(())
    }

    /// Saved brands ordered by name; `limit` 0 means all
    pub fn brands(&self, limit: usize) -> Result<Vec<Reference>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, name FROM fipe_brands ORDER BY name, code LIMIT ?1")?;
        let rows = stmt.query_map([sql_limit(limit)], |r| {
            Ok(Reference::new(r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Saved models of a brand ordered by name; `limit` 0 means all
    pub fn models_of(&self, brand_code: &str, limit: usize) -> Result<Vec<Reference>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.code, m.name FROM fipe_models m
             JOIN fipe_brands b ON b.id = m.brand_id
             WHERE b.code = ?1
             ORDER BY m.name, m.code LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![brand_code, sql_limit(limit)], |r| {
            Ok(Reference::new(r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Saved model-years of a model ordered by name; `limit` 0 means all
    pub fn years_of(
        &self,
        brand_code: &str,
        model_code: &str,
        limit: usize,
    ) -> Result<Vec<Reference>> {
        let mut stmt = self.conn.prepare(
            "SELECT y.code, y.name FROM fipe_years y
             JOIN fipe_models m ON m.id = y.model_id
             JOIN fipe_brands b ON b.id = m.brand_id
             WHERE b.code = ?1 AND m.code = ?2
             ORDER BY y.name, y.code LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![brand_code, model_code, sql_limit(limit)], |r| {
            Ok(Reference::new(r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn table_counts(&self) -> Result<TableCounts> {
        let counts = self.conn.query_row(
            "SELECT
                 (SELECT COUNT(*) FROM fipe_brands),
                 (SELECT COUNT(*) FROM fipe_models),
                 (SELECT COUNT(*) FROM fipe_years),
                 (SELECT COUNT(*) FROM fipe_values)",
            [],
            |r| {
                Ok(TableCounts {
                    brands: r.get::<_, i64>(0)? as usize,
                    models: r.get::<_, i64>(1)? as usize,
                    years: r.get::<_, i64>(2)? as usize,
                    values: r.get::<_, i64>(3)? as usize,
                })
            },
        )?;
        Ok(counts)
    }
}
