//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format - human-readable rounded tables
    #[default]
    Table,
    /// JSON format - structured for scripts, wrapped in {data, meta}
    Json,
}
