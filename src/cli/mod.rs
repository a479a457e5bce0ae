// CLI module for citewatch
// Author: kelexine (https://github.com/kelexine)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// citewatch - Google Scholar citation tracker
#[derive(Parser, Debug)]
#[command(name = "citewatch", version, about, long_about = None)]
pub struct Args {
    /// Config file (defaults to ~/.citewatch/config.toml)
    #[arg(long, global = true, env = "CITEWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show cached metrics, fetching if the cache is missing or expired
    Show,
    /// Fetch the profile now and report the result
    Refresh,
    /// Refresh on a schedule until interrupted
    Watch,
    /// Set the tracked profile and preferences
    Configure {
        /// Full profile URL
        #[arg(long)]
        url: Option<String>,

        /// Profile id (the `user=` parameter)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        auto_update: Option<bool>,
    },
    /// Fetch the configured profile once without touching the cache
    Test,
    /// Remove all cached metrics
    ClearCache,
    /// Print the effective configuration
    Config,
}
