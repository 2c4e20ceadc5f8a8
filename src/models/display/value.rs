//! Single-record field views

use crate::client::UpstreamValue;
use crate::output::formatters::{format_datetime, format_datetime_opt};
use crate::output::table::FieldRow;
use crate::reader::{CacheStats, PricedValue};

pub fn priced_value_fields(v: &PricedValue) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Brand", &v.brand),
        FieldRow::new("Model", &v.model),
        FieldRow::new("Year", format!("{} ({})", v.year_name, v.year_code)),
        FieldRow::new("Model year", v.model_year),
        FieldRow::new("Fuel", format!("{} ({})", v.fuel, v.fuel_abbreviation)),
        FieldRow::new("FIPE code", &v.fipe_code),
        FieldRow::new("Price", v.price),
        FieldRow::new("Reference month", &v.reference_month),
        FieldRow::new("Fetched", format_datetime(&v.fetched_at)),
    ]
}

pub fn upstream_value_fields(v: &UpstreamValue) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Brand", &v.brand),
        FieldRow::new("Model", &v.model),
        FieldRow::new("Model year", v.model_year),
        FieldRow::new("Fuel", format!("{} ({})", v.fuel, v.fuel_abbreviation)),
        FieldRow::new("FIPE code", &v.fipe_code),
        FieldRow::new("Price", &v.price),
        FieldRow::new("Reference month", v.reference_month.trim()),
    ]
}

pub fn cache_stats_fields(s: &CacheStats) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Brands", s.counts.brands),
        FieldRow::new("Models", s.counts.models),
        FieldRow::new("Years", s.counts.years),
        FieldRow::new("Values", s.counts.values),
        FieldRow::new("Last update", format_datetime_opt(s.last_update.as_ref())),
    ]
}
