//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chatpulse",
    version,
    author = "neur0map",
    about = "Engagement metrics and content classification for exported chat transcripts",
    long_about = "Chatpulse reads exported chat transcripts (JSON), computes activity metrics, \
                  classifies topics, sentiment and support questions against a configurable \
                  taxonomy, and prepares bounded samples for an optional narrative summarizer."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/chatpulse/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute metrics and classification for one or more exports
    Analyze {
        /// Export files (JSON array, or object with "messages"/"data")
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the full snapshots as JSON
        #[arg(long)]
        json: bool,

        /// Reference time for the 7/30 day windows (RFC 3339, defaults to now)
        #[arg(long, value_name = "RFC3339")]
        now: Option<String>,
    },

    /// Render the plain-text analytics report
    Report {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Saved summarizer response (JSON) to include in the report
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },

    /// Print the bounded dashboard sample
    Sample {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Sample size (defaults to sampling.dashboard_max)
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Print the summarizer payload as JSON
    Payload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration and taxonomy
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
