//! Init command implementation

use colored::Colorize;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::client::{FipeApi, FipeClient, VehicleKind};
use crate::config::Config;
use crate::error::Result;

const KINDS: [VehicleKind; 3] = [
    VehicleKind::Cars,
    VehicleKind::Motorcycles,
    VehicleKind::Trucks,
];

/// Run the init command
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}", "Welcome to fipesync!".bold().green());
    println!("Let's set up your FIPE price cache.\n");

    let theme = ColorfulTheme::default();
    let mut config = Config::load_at(opts.config_ref()).unwrap_or_default();

    let api_base_url: String = Input::with_theme(&theme)
        .with_prompt("FIPE API base URL")
        .default(
            opts.api_url_ref()
                .map(str::to_string)
                .unwrap_or_else(|| config.api_base_url.clone()),
        )
        .interact_text()?;
    config.api_base_url = api_base_url.trim().to_string();

    let labels: Vec<String> = KINDS.iter().map(|k| k.to_string()).collect();
    let current = KINDS.iter().position(|k| *k == config.vehicle_kind).unwrap_or(0);
    let idx = Select::with_theme(&theme)
        .with_prompt("Vehicle kind to cache")
        .items(&labels)
        .default(current)
        .interact()?;
    config.vehicle_kind = KINDS[idx];

    let webhook: String = Input::with_theme(&theme)
        .with_prompt("Slack webhook URL for refresh notifications (empty to skip)")
        .default(config.slack_webhook_url.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    config.slack_webhook_url = Some(webhook.trim().to_string()).filter(|w| !w.is_empty());

    config.validate()?;

    let check = Confirm::with_theme(&theme)
        .with_prompt("Check that the API is reachable?")
        .default(true)
        .interact()?;
    if check {
        println!("\n{}", "Contacting FIPE API...".cyan());
        let client = FipeClient::from_config(&config)?;
        match client.list_brands().await {
            Ok(brands) => println!(
                "{} API reachable, {} brands listed",
                "✓".green(),
                brands.len()
            ),
            Err(e) => println!("{} API check failed: {}", "⚠".yellow(), e),
        }
    }

    config.save_at(opts.config_ref())?;

    let config_path = Config::resolve_path(opts.config_ref())?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Populate the price cache", "fipesync update".cyan());
    println!("  {} - Show refresh status", "fipesync status".cyan());

    Ok(())
}
