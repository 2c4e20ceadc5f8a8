//! Response cache management commands

use serde::Serialize;

use crate::cache::ResponseCache;
use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::formatters::{format_millis, format_size};
use crate::output::json;

#[derive(Serialize)]
struct CacheStatusReport {
    path: String,
    enabled: bool,
    #[serde(flatten)]
    stats: crate::cache::ResponseCacheStats,
}

fn open(ctx: &CommandContext) -> Result<ResponseCache> {
    Ok(ResponseCache::open(ctx.config.response_cache.max_entries)?)
}

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let cache = open(&ctx)?;
    let report = CacheStatusReport {
        path: cache.path().display().to_string(),
        enabled: ctx.config.response_cache.enabled,
        stats: cache.stats()?,
    };

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&report)?),
        OutputFormat::Table => {
            let stats = &report.stats;
            println!("Response Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", report.path);
            println!("Enabled:        {}", if report.enabled { "yes" } else { "no" });
            println!("Valid entries:  {}", stats.valid_entries);
            println!("Expired:        {}", stats.expired_entries);
            if stats.max_entries > 0 {
                println!("Capacity:       {}", stats.max_entries);
            }
            println!("Total size:     {}", format_size(stats.total_size_bytes));
            if let Some(oldest) = stats.oldest_entry {
                println!("Oldest entry:   {}", format_millis(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("Newest entry:   {}", format_millis(newest));
            }
        }
    }

    Ok(())
}

/// Clear all cache entries
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let stats = open(&ctx)?.clear_all()?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&stats)?),
        OutputFormat::Table => {
            if stats.entries_removed > 0 {
                println!("Cleared {} cached responses", stats.entries_removed);
            } else {
                println!("Response cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path() -> Result<()> {
    println!("{}", ResponseCache::cache_dir()?.display());
    Ok(())
}
