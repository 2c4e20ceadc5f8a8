//! Update command: run a full refresh

use std::time::{Duration, Instant};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat, UpdateArgs};
use crate::error::{Error, Result};
use crate::output::formatters::format_duration;
use crate::output::json;
use crate::store::RefreshStats;

#[derive(Serialize)]
struct UpdateOutcome {
    skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<RefreshStats>,
    duration_secs: f64,
}

fn spinner(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Refreshing FIPE price cache...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Run the update command
pub async fn run(opts: &GlobalOptions, args: &UpdateArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let mut limits = ctx.config.limits;
    if let Some(n) = args.max_brands {
        limits.max_brands = n;
    }
    if let Some(n) = args.max_models {
        limits.max_models_per_brand = n;
    }
    if let Some(n) = args.max_years {
        limits.max_years_per_model = n;
    }

    let mut refresher = ctx.refresher(limits)?;

    if args.if_stale && !refresher.needs_update() {
        log::info!("Cache is fresh, skipping refresh");
        match ctx.format {
            OutputFormat::Json => println!(
                "{}",
                json::format_json(&UpdateOutcome {
                    skipped: true,
                    stats: None,
                    duration_secs: 0.0,
                })?
            ),
            OutputFormat::Table => println!("{} Cache is up to date, nothing to do", "✓".green()),
        }
        return Ok(());
    }

    let notifier = ctx.notifier();
    let pb = spinner(ctx.format);
    let started = Instant::now();
    let result = refresher.perform_full_update().await;
    let elapsed = started.elapsed();
    pb.finish_and_clear();
    log::debug!("Refresher state: {:?}", refresher.state());

    let stats = match result {
        Ok(stats) => stats,
        Err(err) => {
            // Another process holds the run; it will report its own outcome
            if let Some(n) = &notifier
                && !matches!(err, Error::RefreshInProgress { .. })
            {
                n.notify_failure(&err.to_string()).await;
            }
            return Err(err);
        }
    };

    if let Some(n) = &notifier {
        n.notify_success(&stats, elapsed).await;
    }

    match ctx.format {
        OutputFormat::Json => println!(
            "{}",
            json::format_json(&UpdateOutcome {
                skipped: false,
                stats: Some(stats),
                duration_secs: elapsed.as_secs_f64(),
            })?
        ),
        OutputFormat::Table => {
            println!("{} FIPE cache refreshed", "✓".green());
            println!("  Brands:   {}", stats.brands);
            println!("  Models:   {}", stats.models);
            println!("  Years:    {}", stats.years);
            println!("  Values:   {}", stats.values);
            println!("  Duration: {}", format_duration(elapsed));
        }
    }

    Ok(())
}
