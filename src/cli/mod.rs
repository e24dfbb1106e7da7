pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "subwatch")]
#[command(about = "Watch subreddits for new posts", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/subwatch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file for baselines
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print new posts as they appear, until Ctrl-C
    Watch {
        /// Subreddits to watch, without the "r/" prefix
        #[arg(required = true)]
        subreddits: Vec<String>,

        /// Polling interval (e.g., "2s", "30s", "5m"); overrides the config
        #[arg(short, long)]
        interval: Option<String>,
    },
    /// Print every post currently in a subreddit's "new" listing
    Fetch {
        subreddit: String,
    },
    /// Show the stored baseline for a subreddit
    Baseline {
        subreddit: String,

        /// Rebuild it from the current listing
        #[arg(long)]
        refresh: bool,
    },
}
