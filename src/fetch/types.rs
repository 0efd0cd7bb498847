// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for feed retrieval

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::{
    DEFAULT_CACHE_TTL_MS, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT_MS,
};

/// Per-request fetch options. Immutable for the duration of one call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Hostnames permitted as fetch targets. Entries starting with `.`
    /// match any subdomain suffix; all other entries match exactly.
    /// An empty set refuses every fetch.
    pub allow_hosts: HashSet<String>,
    /// Permit localhost / private-range / link-local hosts
    pub allow_private_hosts: bool,
    /// Hard cap on the response body size in bytes
    pub max_bytes: u64,
    /// Wall-clock budget for one whole fetch attempt in milliseconds
    pub timeout_ms: u64,
    /// Use the local conditional cache for this request
    pub cache: bool,
    /// Freshness window for the TTL fast path in milliseconds
    pub cache_ttl_ms: u64,
    /// Serve a stale cached copy when the network attempt fails
    pub stale_if_error: bool,
}

impl FetchOptions {
    /// Create options with the given allowlist and engine defaults
    pub fn new<I, S>(allow_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_hosts: allow_hosts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Create options with defaults taken from process-wide configuration
    pub fn from_config<I, S>(config: &super::config::FetchConfig, allow_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_hosts: allow_hosts.into_iter().map(Into::into).collect(),
            allow_private_hosts: config.allow_private_hosts,
            max_bytes: config.default_max_bytes,
            timeout_ms: config.default_timeout_ms,
            cache: true,
            cache_ttl_ms: config.default_cache_ttl_ms,
            stale_if_error: false,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            allow_hosts: HashSet::new(),
            allow_private_hosts: false,
            max_bytes: DEFAULT_MAX_BYTES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache: true,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            stale_if_error: false,
        }
    }
}

/// One cached feed document, stored as `<cacheDir>/<sha256(url)>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// When this entry was fetched, epoch milliseconds
    pub fetched_at_ms: i64,
    /// The URL the entry was fetched from
    pub url: String,
    /// Raw feed body
    pub xml: String,
    /// `ETag` response header, if the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// `Last-Modified` response header, if the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Where a fetched feed body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// Served from the local conditional cache
    Cache,
    /// Fetched over the network (including 304 revalidations)
    Network,
}

/// Result of one successful logical fetch
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// The URL as requested by the caller (not the final redirect target)
    pub url: String,
    /// Raw feed body
    pub xml: String,
    /// Whether the body came from cache or the network
    pub source: FeedSource,
}

/// A single resolved fetch: extracted items plus where the body came from
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Items extracted from the feed document, in document order
    pub items: Vec<FeedItem>,
    /// Whether the body came from cache or the network
    pub source: FeedSource,
}

/// A normalized feed item produced by the extraction collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Item title
    pub title: String,
    /// Item link
    pub url: String,
}

/// One URL that could not be resolved into content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    /// The URL that failed
    pub url: String,
    /// Human-readable failure message
    pub message: String,
    /// How long the attempt took in milliseconds
    pub duration_ms: u64,
}

/// Aggregate result of a batch fetch: partial success, never all-or-nothing
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Extracted items, flattened in input-URL order
    pub items: Vec<FeedItem>,
    /// Per-URL failures, in input-URL order
    pub failures: Vec<FailureRecord>,
}

/// Errors that can occur while retrieving a feed
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL scheme is not http or https
    #[error("Unsupported protocol '{scheme}' (only http/https)")]
    ProtocolUnsupported {
        /// The offending scheme
        scheme: String,
    },

    /// Fetching with an empty host allowlist is refused unconditionally
    #[error("Fetch refused: host allowlist is empty")]
    AllowlistRequired,

    /// Hostname matched no allowlist entry
    #[error("Host not allowlisted: {host}")]
    HostNotAllowlisted {
        /// The rejected hostname
        host: String,
    },

    /// Hostname is localhost / private / link-local and private hosts are disallowed
    #[error("Private host blocked: {host}")]
    PrivateHostBlocked {
        /// The rejected hostname
        host: String,
    },

    /// Redirect chain exceeded the hop budget
    #[error("Too many redirects fetching {url} (limit {max_hops} hops)")]
    TooManyRedirects {
        /// The URL originally requested
        url: String,
        /// Maximum redirect hops allowed
        max_hops: u32,
    },

    /// A 3xx response carried no Location header
    #[error("Redirect from {url} has no Location header")]
    RedirectMissingLocation {
        /// The redirecting URL
        url: String,
    },

    /// Response body exceeded the byte cap
    #[error("Feed at {url} exceeds size limit of {max_bytes} bytes")]
    FeedTooLarge {
        /// The URL being fetched
        url: String,
        /// The configured cap
        max_bytes: u64,
    },

    /// Non-2xx, non-3xx upstream response
    #[error("Upstream HTTP {status} for: {url}")]
    UpstreamHttpError {
        /// HTTP status code
        status: u16,
        /// The URL being fetched
        url: String,
    },

    /// Got 304 Not Modified without a cached entry to revalidate against.
    /// Fatal: the server or our own request logic broke the protocol.
    #[error("Received 304 for {url} with no cached entry to revalidate")]
    CacheProtocolViolation {
        /// The URL being fetched
        url: String,
    },

    /// The whole attempt exceeded its wall-clock budget
    #[error("Timeout after {timeout_ms}ms fetching: {url}")]
    Timeout {
        /// The URL being fetched
        url: String,
        /// The budget that was exceeded
        timeout_ms: u64,
    },

    /// Transport-level failure (DNS, connect, TLS, mid-body disconnect)
    #[error("Network error fetching {url}: {message}")]
    NetworkError {
        /// The URL being fetched
        url: String,
        /// Underlying error message
        message: String,
    },

    /// The caller-supplied or redirect-target URL could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The unparseable URL
        url: String,
        /// Parser error message
        message: String,
    },
}
