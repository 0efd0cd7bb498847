pub mod feeds;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Feed Jarvis CLI
#[derive(Parser, Debug)]
#[command(name = "feed-jarvis-cli")]
#[command(version = "0.3.0")]
#[command(about = "CLI tools for fetching feeds and drafting posts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch feeds and print extracted items
    Fetch(feeds::FetchArgs),

    /// Fetch one feed and render post drafts
    Draft(feeds::DraftArgs),

    /// Show on-disk cache statistics
    CacheStats(feeds::CacheStatsArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch(args) => feeds::fetch(args).await,
        Commands::Draft(args) => feeds::draft(args).await,
        Commands::CacheStats(args) => feeds::cache_stats(args).await,
    }
}
