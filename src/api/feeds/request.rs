// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feeds API request types

use serde::{Deserialize, Serialize};

use crate::fetch::{FetchConfig, FetchOptions};

/// Maximum number of URLs accepted in one batch request
pub const MAX_URLS_PER_REQUEST: usize = 50;

/// Request body for POST /v1/feeds
///
/// Only `urls` and `allowHosts` are usually supplied; every other field
/// overrides an engine default from the server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedsApiRequest {
    /// Feed URLs to fetch (required, max 50)
    pub urls: Vec<String>,

    /// Host allowlist applied to every URL and redirect target.
    /// Empty means every URL fails the guard.
    #[serde(default)]
    pub allow_hosts: Vec<String>,

    /// Permit localhost/private-range targets (default from config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_private_hosts: Option<bool>,

    /// Response body cap in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,

    /// Per-URL attempt budget in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Use the conditional cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,

    /// Cache freshness window in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_ms: Option<u64>,

    /// Serve a stale cached copy when the network attempt fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_if_error: Option<bool>,

    /// Worker pool size for this batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

impl FeedsApiRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<(), String> {
        if self.urls.is_empty() {
            return Err("urls cannot be empty".to_string());
        }
        if self.urls.len() > MAX_URLS_PER_REQUEST {
            return Err(format!(
                "Too many urls (max {})",
                MAX_URLS_PER_REQUEST
            ));
        }
        if self.urls.iter().any(|u| u.trim().is_empty()) {
            return Err("urls entries cannot be empty".to_string());
        }
        Ok(())
    }

    /// Build per-request fetch options: config defaults, then request
    /// overrides on top
    pub fn to_options(&self, config: &FetchConfig) -> FetchOptions {
        let mut options = FetchOptions::from_config(config, self.allow_hosts.clone());
        if let Some(v) = self.allow_private_hosts {
            options.allow_private_hosts = v;
        }
        if let Some(v) = self.max_bytes {
            options.max_bytes = v;
        }
        if let Some(v) = self.timeout_ms {
            options.timeout_ms = v;
        }
        if let Some(v) = self.cache {
            options.cache = v;
        }
        if let Some(v) = self.cache_ttl_ms {
            options.cache_ttl_ms = v;
        }
        if let Some(v) = self.stale_if_error {
            options.stale_if_error = v;
        }
        options
    }

    /// Worker pool size: request value or the configured default
    pub fn concurrency_or_default(&self, config: &FetchConfig) -> usize {
        self.concurrency.unwrap_or(config.default_concurrency)
    }
}
