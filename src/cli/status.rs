//! Status command implementation

use chrono::Utc;
use colored::Colorize;
use serde::Serialize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::formatters::{format_datetime, format_duration};
use crate::output::json;
use crate::reader::CacheReader;
use crate::refresh::{needs_update_at, next_eligible_at};
use crate::store::{RefreshRun, RunStatus};

#[derive(Serialize)]
struct StatusReport {
    database: String,
    needs_update: bool,
    next_update: Option<chrono::DateTime<Utc>>,
    latest_run: Option<RefreshRun>,
}

/// Show the latest refresh run and whether a refresh is due
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let policy = ctx.policy();
    let now = Utc::now();

    let report = StatusReport {
        database: ctx.config.database_path()?.display().to_string(),
        needs_update: needs_update_at(&store, &policy, now),
        next_update: next_eligible_at(&store, &policy)?,
        latest_run: CacheReader::new(&store).latest_run()?,
    };

    if ctx.format == OutputFormat::Json {
        println!("{}", json::format_json(&report)?);
        return Ok(());
    }

    println!("{}\n", "FIPE Cache Status".bold());
    println!("Database: {}", report.database.cyan());
    println!();

    match &report.latest_run {
        None => {
            println!("{} No refresh has run yet", "○".dimmed());
            println!("  → Run 'fipesync update' to populate the cache");
        }
        Some(run) => {
            let (mark, label) = match run.status {
                RunStatus::Completed => ("✓".green(), "completed".green()),
                RunStatus::Running if run.is_abandoned(now, policy.lock_timeout) => {
                    ("✗".red(), "abandoned".red())
                }
                RunStatus::Running => ("⚠".yellow(), "running".yellow()),
                RunStatus::Error => ("✗".red(), "failed".red()),
            };
            println!(
                "{} Last refresh {} (run {}, started {})",
                mark,
                label,
                run.id,
                format_datetime(&run.started_at)
            );
            if let Some(finished) = run.finished_at
                && let Ok(took) = finished.signed_duration_since(run.started_at).to_std()
            {
                println!("  Duration: {}", format_duration(took));
            }
            println!(
                "  Saved: {} brands, {} models, {} years, {} values",
                run.stats.brands, run.stats.models, run.stats.years, run.stats.values
            );
            if let Some(ref msg) = run.error_message {
                println!("  Error: {}", msg.red());
            }
        }
    }

    println!();
    if report.needs_update {
        println!("{} Refresh is due", "⚠".yellow());
    } else {
        println!("{} Cache is fresh", "✓".green());
        if let Some(next) = report.next_update {
            println!("  Next refresh due: {}", format_datetime(&next));
        }
    }

    Ok(())
}
