// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use crate::api::FeedsApiResponse;
use crate::feed::templater::{DraftTemplater, PlaceholderTemplater};
use crate::fetch::config::resolve_cache_dir;
use crate::fetch::{FeedCache, FetchConfig, FetchOptions, FetchService};

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Feed URLs to fetch
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Allowlisted hosts (exact, or `.example.com` for subdomains)
    #[arg(long = "allow-host", value_delimiter = ',')]
    pub allow_hosts: Vec<String>,

    /// Permit localhost and private-range targets
    #[arg(long)]
    pub allow_private: bool,

    /// Response body cap in bytes
    #[arg(long)]
    pub max_bytes: Option<u64>,

    /// Per-URL attempt budget in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Skip the conditional cache entirely
    #[arg(long)]
    pub no_cache: bool,

    /// Cache freshness window in milliseconds
    #[arg(long)]
    pub cache_ttl_ms: Option<u64>,

    /// Serve a stale cached copy when the network attempt fails
    #[arg(long)]
    pub stale_if_error: bool,

    /// Worker pool size
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Cache directory (can also be set via FEED_JARVIS_CACHE_DIR)
    #[arg(long, env = "FEED_JARVIS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Print the batch result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the draft command
#[derive(Args, Debug)]
pub struct DraftArgs {
    /// Feed URL to draft from
    pub url: String,

    /// Allowlisted hosts (exact, or `.example.com` for subdomains)
    #[arg(long = "allow-host", value_delimiter = ',')]
    pub allow_hosts: Vec<String>,

    /// Permit localhost and private-range targets
    #[arg(long)]
    pub allow_private: bool,

    /// Draft template with {title} and {url} placeholders
    #[arg(long)]
    pub template: Option<String>,

    /// Maximum number of drafts to render
    #[arg(long, default_value = "5")]
    pub limit: usize,

    /// Length cap per rendered draft, in characters
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Skip the conditional cache entirely
    #[arg(long)]
    pub no_cache: bool,

    /// Cache directory (can also be set via FEED_JARVIS_CACHE_DIR)
    #[arg(long, env = "FEED_JARVIS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the cache-stats command
#[derive(Args, Debug)]
pub struct CacheStatsArgs {
    /// Cache directory (can also be set via FEED_JARVIS_CACHE_DIR)
    #[arg(long, env = "FEED_JARVIS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

fn config_with_dir(cache_dir: Option<PathBuf>) -> FetchConfig {
    let mut config = FetchConfig::from_env();
    config.cache_dir = resolve_cache_dir(cache_dir);
    config
}

/// Fetch a batch of feeds and print their items
pub async fn fetch(args: FetchArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let config = config_with_dir(args.cache_dir.clone());
    let mut options = FetchOptions::from_config(&config, args.allow_hosts.clone());
    if args.allow_private {
        options.allow_private_hosts = true;
    }
    if let Some(v) = args.max_bytes {
        options.max_bytes = v;
    }
    if let Some(v) = args.timeout_ms {
        options.timeout_ms = v;
    }
    if args.no_cache {
        options.cache = false;
    }
    if let Some(v) = args.cache_ttl_ms {
        options.cache_ttl_ms = v;
    }
    if args.stale_if_error {
        options.stale_if_error = true;
    }
    let concurrency = args.concurrency.unwrap_or(config.default_concurrency);

    let service = FetchService::new(&config);
    let start = Instant::now();
    let outcome = service.fetch_many(&args.urls, &options, concurrency).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let requested = args.urls.len();
    let failed = outcome.failures.len();

    if args.json {
        let response = FeedsApiResponse::new(requested, outcome, elapsed_ms);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!(
            "📰 {} items from {} feeds in {}ms ({} failed)",
            outcome.items.len(),
            requested,
            elapsed_ms,
            failed
        );
        for item in &outcome.items {
            println!("  • {} - {}", item.title, item.url);
        }
        for failure in &outcome.failures {
            println!(
                "  ✗ {} ({}ms): {}",
                failure.url, failure.duration_ms, failure.message
            );
        }
    }

    if requested > 0 && failed == requested {
        return Err(anyhow!("all {} feeds failed", requested));
    }
    Ok(())
}

/// Fetch one feed and render post drafts for its items
pub async fn draft(args: DraftArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let config = config_with_dir(args.cache_dir.clone());
    let mut options = FetchOptions::from_config(&config, args.allow_hosts.clone());
    if args.allow_private {
        options.allow_private_hosts = true;
    }
    if args.no_cache {
        options.cache = false;
    }

    let service = FetchService::new(&config);
    let outcome = service
        .fetch_one(&args.url, &options)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    if outcome.items.is_empty() {
        println!("No items found in {}", args.url);
        return Ok(());
    }

    let mut templater = match args.template {
        Some(template) => PlaceholderTemplater::with_template(template),
        None => PlaceholderTemplater::new(),
    };
    if let Some(max_chars) = args.max_chars {
        templater = templater.capped_at(max_chars);
    }

    println!(
        "✍️  {} drafts from {} (source: {:?})",
        outcome.items.len().min(args.limit),
        args.url,
        outcome.source
    );
    for item in outcome.items.iter().take(args.limit) {
        let rendered = templater.render(item).await;
        println!("---");
        println!("{}", rendered);
    }
    Ok(())
}

/// Print statistics about the on-disk cache
pub async fn cache_stats(args: CacheStatsArgs) -> Result<()> {
    dotenv::dotenv().ok();

    let dir = resolve_cache_dir(args.cache_dir);
    let stats = FeedCache::new(dir).stats();

    println!("📦 Cache directory: {}", stats.dir.display());
    println!("   Entries: {}", stats.entries);
    println!("   Total size: {} bytes", stats.total_bytes);
    Ok(())
}
