use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::discovery::PlatformSelection;

#[derive(Parser)]
#[command(
    name = "vidscout",
    about = "Video Research - discover short-form videos on TikTok, Instagram and YouTube and transcribe them",
    version,
    long_about = "Runs scraping jobs on Apify to find videos about a topic, filters and ranks them by engagement, \
                  and transcribes selected videos with a hosted speech-to-text service (YouTube captions as fallback)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Settings file (defaults to ./config.yaml or the user config directory)
    #[arg(long, global = true, value_name = "FILE", env = "VIDEO_RESEARCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find videos about a topic across platforms
    Discover {
        /// Search topic or keywords
        #[arg(value_name = "TOPIC")]
        topic: String,

        /// Platforms to search
        #[arg(short, long, value_enum, default_value = "all")]
        platform: PlatformSelection,

        /// Drop videos with fewer views
        #[arg(long, default_value = "0", value_name = "COUNT")]
        min_views: u64,

        /// Drop videos with fewer likes
        #[arg(long, default_value = "0", value_name = "COUNT")]
        min_likes: u64,

        /// Earliest creation date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date_from: Option<NaiveDate>,

        /// Latest creation date (YYYY-MM-DD); videos from that whole day (through 23:59:59 UTC) are kept
        #[arg(long, value_name = "DATE")]
        date_to: Option<NaiveDate>,

        /// Results requested from each platform
        #[arg(short, long, default_value = "50", value_name = "COUNT")]
        max_results: u32,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Transcribe videos one after another
    Transcribe {
        /// Video URLs (TikTok, Instagram Reels, YouTube)
        #[arg(value_name = "URL")]
        urls: Vec<String>,

        /// Read URLs from a file, one per line
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Take URLs from a saved `discover --format json` export
        #[arg(long, value_name = "FILE")]
        from_discovery: Option<PathBuf>,

        /// Rows of the discovery export to transcribe, e.g. `1,3-5` (all when omitted)
        #[arg(long, value_name = "ROWS", requires = "from_discovery")]
        select: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show or change saved settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Set a value, e.g. `tiktok.api_token=apify_api_...`
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Clear all saved settings
        #[arg(long, conflicts_with = "set")]
        reset: bool,
    },

    /// List supported platforms
    Platforms,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned console table
    Table,
    /// JSON
    Json,
    /// CSV with every value quoted
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
