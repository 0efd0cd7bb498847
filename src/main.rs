// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use feed_jarvis::{api, fetch::FetchConfig, version};
use std::env;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so RUST_LOG from the file is honored
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Feed Jarvis...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    // Parse environment variables for configuration
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);

    let config = FetchConfig::from_env();
    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        std::process::exit(1);
    }

    println!("📦 Cache directory: {}", config.cache_dir.display());
    println!("   Max feed size:   {} bytes", config.default_max_bytes);
    println!("   Fetch timeout:   {}ms", config.default_timeout_ms);
    println!("   Cache TTL:       {}ms", config.default_cache_ttl_ms);
    println!("   Concurrency:     {}", config.default_concurrency);

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("🎉 Feed Jarvis is running!");
    println!("{}", separator);
    println!("API Port:       {}", api_port);
    println!("\nAPI Endpoints:");
    println!("  Health:       http://localhost:{}/health", api_port);
    println!("  Version:      http://localhost:{}/v1/version", api_port);
    println!("  Feeds:        POST http://localhost:{}/v1/feeds", api_port);
    println!("  Metrics:      http://localhost:{}/metrics", api_port);
    println!("\nTest with curl:");
    println!("  curl -X POST http://localhost:{}/v1/feeds \\", api_port);
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{");
    println!("      \"urls\": [\"https://blog.rust-lang.org/feed.xml\"],");
    println!("      \"allowHosts\": [\"blog.rust-lang.org\"]");
    println!("    }}'");
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    // Serve until Ctrl+C
    tokio::select! {
        result = api::start_server(config, api_port) => {
            if let Err(e) = result {
                eprintln!("❌ API server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            println!("\n⏹️  Shutting down...");
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}
