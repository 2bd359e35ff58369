use clap::{Parser, Subcommand};

use crate::render::OutputFormat;

/// pipeboard — Pipefy pipe dashboards in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "pipeboard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to config file (default: ./pipeboard.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Pipe to read cards from
    #[arg(long, global = true)]
    pub pipe_id: Option<String>,

    /// Cards requested per page
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Seconds a fetched card table is reused before refetching
    #[arg(long, global = true)]
    pub cache_ttl: Option<u64>,

    /// Phase counted as completed by `progress` (repeatable)
    #[arg(long = "completed-phase", global = true)]
    pub completed_phases: Vec<String>,

    /// Label that is not a module (repeatable)
    #[arg(long = "exclude-label", global = true)]
    pub exclude_labels: Vec<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Re-render every N seconds, refetching only when the cache expires
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub watch: Option<u64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// List every card, newest first
    Cards {
        /// Only show cards in this phase (repeatable)
        #[arg(long = "phase")]
        phases: Vec<String>,
    },

    /// Total cards, distinct phases and most recent creation date
    Summary,

    /// Card count per phase
    Phases,

    /// Cards created per day
    Timeline,

    /// Distinct module labels
    Modules,

    /// Completion progress of one module
    Progress {
        /// Module label to report on
        module: String,
    },
}
