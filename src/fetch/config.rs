// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide configuration for the fetch engine
//!
//! Resolved once at startup and threaded into the components, never a
//! hidden global. Per-request knobs live in `FetchOptions` and default
//! to the values here.

use std::env;
use std::path::PathBuf;

/// Default response body cap: 5 MiB
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Default wall-clock budget per fetch attempt
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default cache freshness window: 15 minutes
pub const DEFAULT_CACHE_TTL_MS: u64 = 900_000;

/// Default worker pool size for batch fetches
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for the feed fetch engine
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory holding cached feed entries
    pub cache_dir: PathBuf,
    /// Default response body cap in bytes
    pub default_max_bytes: u64,
    /// Default per-attempt timeout in milliseconds
    pub default_timeout_ms: u64,
    /// Default cache freshness window in milliseconds
    pub default_cache_ttl_ms: u64,
    /// Default worker pool size for batch fetches
    pub default_concurrency: usize,
    /// Allow fetching from localhost / private ranges (default: false)
    pub allow_private_hosts: bool,
}

impl FetchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            cache_dir: resolve_cache_dir(None),
            default_max_bytes: env::var("FEED_JARVIS_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BYTES),
            default_timeout_ms: env::var("FEED_JARVIS_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            default_cache_ttl_ms: env::var("FEED_JARVIS_CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_MS),
            default_concurrency: env::var("FEED_JARVIS_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CONCURRENCY),
            allow_private_hosts: env::var("FEED_JARVIS_ALLOW_PRIVATE_HOSTS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.default_max_bytes == 0 {
            return Err("max bytes must be greater than 0".to_string());
        }
        if self.default_timeout_ms == 0 {
            return Err("timeout must be greater than 0".to_string());
        }
        if self.default_concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: resolve_cache_dir(None),
            default_max_bytes: DEFAULT_MAX_BYTES,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            default_cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            default_concurrency: DEFAULT_CONCURRENCY,
            allow_private_hosts: false,
        }
    }
}

/// Resolve the cache directory: explicit setting, then the
/// `FEED_JARVIS_CACHE_DIR` environment variable, then the OS-conventional
/// user cache directory.
pub fn resolve_cache_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Ok(dir) = env::var("FEED_JARVIS_CACHE_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::cache_dir()
        .map(|d| d.join("feed-jarvis"))
        .unwrap_or_else(|| PathBuf::from("./feed-jarvis-cache"))
}
