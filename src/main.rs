//! fipesync - local cache and refresher for the FIPE vehicle price table

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod notify;
mod output;
mod reader;
mod refresh;
mod store;

use cli::args::GlobalOptions;
use cli::{Cli, Commands, ResponseCacheCommands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` forces debug level; otherwise honor RUST_LOG, defaulting to warn
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts).await,
        Commands::Update(ref args) => cli::update::run(&opts, args).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Stats => cli::lookup::stats(&opts),
        Commands::Clear { yes } => cli::lookup::clear(&opts, yes),
        Commands::History { limit } => cli::lookup::history(&opts, limit),
        Commands::Years => cli::lookup::years(&opts),
        Commands::Brands { ref year } => cli::lookup::brands(&opts, year),
        Commands::Models {
            ref year,
            ref brand,
        } => cli::lookup::models(&opts, year, brand),
        Commands::Value {
            ref year,
            ref brand,
            ref model,
        } => cli::lookup::value(&opts, year, brand, model),
        Commands::Live(ref cmd) => cli::live::run(&opts, cmd).await,
        Commands::ResponseCache(ref cmd) => match cmd {
            ResponseCacheCommands::Status => cli::cache::status(&opts),
            ResponseCacheCommands::Clear => cli::cache::clear(&opts),
            ResponseCacheCommands::Path => cli::cache::path(),
        },
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
    }
}
