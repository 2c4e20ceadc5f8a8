//! CLI command definitions and handlers

use clap::{Args, Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod cache;
pub mod completions;
pub mod context;
pub mod init;
pub mod live;
pub mod lookup;
pub mod status;
pub mod update;

pub use args::OutputFormat;
pub use context::CommandContext;

/// fipesync - local cache and refresher for the FIPE vehicle price table
#[derive(Parser, Debug)]
#[command(name = "fipesync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "FIPESYNC_FORMAT",
        default_value = "table",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "FIPESYNC_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the price cache database path
    #[arg(long, global = true, env = "FIPESYNC_DB", hide_env = true)]
    pub db: Option<String>,

    /// Override the FIPE API base URL
    #[arg(long = "api-url", global = true, env = "FIPESYNC_API_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "FIPESYNC_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass the response cache, fetch fresh data for live lookups
    #[arg(long, global = true, env = "FIPESYNC_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a configuration file interactively
    Init,

    /// Rebuild the local price cache from the FIPE API
    #[command(after_help = "EXAMPLES:\n  \
            fipesync update                       # Refresh now\n  \
            fipesync update --if-stale            # Refresh only when due (cron)\n  \
            fipesync update --max-brands 0        # Walk every brand")]
    Update(UpdateArgs),

    /// Show the latest refresh and whether one is due
    Status,

    /// Show cached row counts and last update time
    Stats,

    /// Delete every cached brand, model, year and value
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List past refresh runs, newest first
    History {
        /// Number of runs to show (0 for all)
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },

    /// List cached model-years that have a price
    Years,

    /// List cached brands for a model-year
    Brands {
        /// Model-year label ("2020 Gasolina") or code ("2020-1")
        #[arg(long)]
        year: String,
    },

    /// List cached models of a brand for a model-year
    Models {
        #[arg(long)]
        year: String,

        /// Brand code
        #[arg(long, short = 'b')]
        brand: String,
    },

    /// Show the cached price of one model-year
    #[command(after_help = "EXAMPLES:\n  \
            fipesync value --year \"2020 Gasolina\" --brand 59 --model 5940\n  \
            fipesync value --year 2020-1 -b 59 -m 5940 --format json")]
    Value {
        #[arg(long)]
        year: String,

        #[arg(long, short = 'b')]
        brand: String,

        /// Model code
        #[arg(long, short = 'm')]
        model: String,
    },

    /// Query the FIPE API directly (through the response cache)
    #[command(subcommand)]
    Live(LiveCommands),

    /// Manage the response cache used by live lookups
    #[command(subcommand)]
    ResponseCache(ResponseCacheCommands),

    /// Generate shell completions
    #[command(after_help = "\
  bash:   fipesync completion bash > /etc/bash_completion.d/fipesync
  zsh:    fipesync completion zsh > \"${fpath[1]}/_fipesync\"
  fish:   fipesync completion fish > ~/.config/fish/completions/fipesync.fish")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options of the `update` command
#[derive(Debug, Clone, Args, Default)]
pub struct UpdateArgs {
    /// Only refresh when the cache is due
    #[arg(long)]
    pub if_stale: bool,

    /// Brands to walk below the brand level (0 for all)
    #[arg(long)]
    pub max_brands: Option<usize>,

    /// Models per brand to walk (0 for all)
    #[arg(long)]
    pub max_models: Option<usize>,

    /// Years per model to price (0 for all)
    #[arg(long)]
    pub max_years: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum LiveCommands {
    /// List all brands
    Brands,

    /// List models of a brand
    Models { brand: String },

    /// List model-years of a model
    Years { brand: String, model: String },

    /// Get the current price of a model-year
    Value {
        brand: String,
        model: String,
        year: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ResponseCacheCommands {
    /// Show response cache statistics
    Status,

    /// Remove all cached responses
    Clear,

    /// Print the response cache location
    Path,
}
