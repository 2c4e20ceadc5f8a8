//! Commands served from the local price cache

use chrono::Utc;
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use log::debug;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::Reference;
use crate::error::Result;
use crate::models::display::{cache_stats_fields, priced_value_fields};
use crate::models::{ReferenceDisplay, RunDisplay};
use crate::output::{Formattable, json, print_record};
use crate::reader::CacheReader;

fn print_references(items: Vec<Reference>, format: OutputFormat) -> Result<()> {
    let display: Vec<ReferenceDisplay> = items.into_iter().map(ReferenceDisplay::from).collect();
    display.print(format)
}

pub fn years(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let years = CacheReader::new(&store).get_years()?;
    debug!("Found {} cached years", years.len());
    print_references(years, ctx.format)
}

pub fn brands(opts: &GlobalOptions, year: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let brands = CacheReader::new(&store).get_brands_by_year(year)?;
    print_references(brands, ctx.format)
}

pub fn models(opts: &GlobalOptions, year: &str, brand: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let models = CacheReader::new(&store).get_models_by_year_and_brand(year, brand)?;
    print_references(models, ctx.format)
}

pub fn value(opts: &GlobalOptions, year: &str, brand: &str, model: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let value = CacheReader::new(&store).get_value_by_year_brand_model(year, brand, model)?;
    print_record(&value, priced_value_fields(&value), ctx.format)
}

pub fn stats(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let stats = CacheReader::new(&store).get_cache_stats()?;
    print_record(&stats, cache_stats_fields(&stats), ctx.format)
}

pub fn history(opts: &GlobalOptions, limit: usize) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let lock_timeout = ctx.policy().lock_timeout;
    let now = Utc::now();
    let runs: Vec<RunDisplay> = store
        .runs(limit)?
        .into_iter()
        .map(|run| RunDisplay::new(run, now, lock_timeout))
        .collect();
    runs.print(ctx.format)
}

/// Wipe the hierarchy tables, asking first unless `yes`
pub fn clear(opts: &GlobalOptions, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete all cached FIPE data?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let store = ctx.open_store()?;
    let before = store.table_counts()?;
    store.clear_hierarchy()?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&before)?),
        OutputFormat::Table => println!(
            "{} Removed {} brands, {} models, {} years, {} values",
            "✓".green(),
            before.brands,
            before.models,
            before.years,
            before.values
        ),
    }
    Ok(())
}
