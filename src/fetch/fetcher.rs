// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feed fetching with conditional requests and bounded manual redirects
//!
//! One logical fetch: TTL fast path from the cache, then a network
//! attempt under a single wall-clock budget. The transport never
//! auto-follows redirects: each hop is resolved manually and re-checked
//! by the host guard before any I/O reaches it.

use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use reqwest::header::{
    HeaderName, ACCEPT, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, LOCATION,
};
use reqwest::{Client, StatusCode};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use super::cache::FeedCache;
use super::config::FetchConfig;
use super::guard;
use super::types::{CacheEntry, FeedSource, FetchError, FetchOptions, FetchedFeed};

/// Redirect hop budget: at most 5 hops, 6 requests total
pub const MAX_REDIRECT_HOPS: u32 = 5;

/// Accept header favouring feed media types
pub const ACCEPT_FEEDS: &str =
    "application/rss+xml, application/atom+xml, application/xml, text/xml;q=0.9, */*;q=0.1";

/// Fixed outbound user agent
const USER_AGENT: &str = "Mozilla/5.0 (compatible; FeedJarvis/0.3; +https://fabstir.com)";

/// Body of one completed network attempt
struct FetchedBody {
    xml: String,
    etag: Option<String>,
    last_modified: Option<String>,
    not_modified: bool,
}

/// Feed fetcher with conditional caching and manual redirect handling
pub struct FeedFetcher {
    client: Client,
    cache: FeedCache,
}

impl FeedFetcher {
    /// Create a new feed fetcher from process-wide configuration
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            // Redirects are followed manually so the guard re-runs per hop
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            cache: FeedCache::new(config.cache_dir.clone()),
        }
    }

    /// Fetch one feed URL: fast cache path, then the network attempt,
    /// then optional stale-on-error fallback.
    pub async fn fetch_feed(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchedFeed, FetchError> {
        if options.cache {
            let now_ms = Utc::now().timestamp_millis();
            if let Some(entry) = self.cache.read_fresh(url, now_ms, options.cache_ttl_ms) {
                debug!("Cache hit for {} (fresh)", url);
                return Ok(FetchedFeed {
                    url: url.to_string(),
                    xml: entry.xml,
                    source: FeedSource::Cache,
                });
            }
        }

        // One budget for the whole attempt: every hop and the body read
        let attempt = self.attempt(url, options);
        let result = match timeout(Duration::from_millis(options.timeout_ms), attempt).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: options.timeout_ms,
            }),
        };

        match result {
            Ok(body) => {
                if body.not_modified {
                    debug!("Revalidated {} via 304, refreshing cache timestamp", url);
                } else {
                    info!("Fetched {} bytes from {}", body.xml.len(), url);
                }
                if options.cache {
                    let entry = CacheEntry {
                        fetched_at_ms: Utc::now().timestamp_millis(),
                        url: url.to_string(),
                        xml: body.xml.clone(),
                        etag: body.etag,
                        last_modified: body.last_modified,
                    };
                    self.cache.write(url, &entry);
                }
                Ok(FetchedFeed {
                    url: url.to_string(),
                    xml: body.xml,
                    source: FeedSource::Network,
                })
            }
            Err(e) => {
                if options.stale_if_error {
                    if let Some(entry) = self.cache.read_for_revalidation(url) {
                        warn!("Fetch failed for {} ({}), serving stale cache", url, e);
                        return Ok(FetchedFeed {
                            url: url.to_string(),
                            xml: entry.xml,
                            source: FeedSource::Cache,
                        });
                    }
                }
                Err(e)
            }
        }
    }

    /// The bounded attempt: parse the URL, then loop over redirect hops
    /// with the host guard re-run before every request.
    async fn attempt(
        &self,
        requested_url: &str,
        options: &FetchOptions,
    ) -> Result<FetchedBody, FetchError> {
        let mut current = Url::parse(requested_url).map_err(|e| FetchError::InvalidUrl {
            url: requested_url.to_string(),
            message: e.to_string(),
        })?;

        let mut revalidation = if options.cache {
            self.cache.read_for_revalidation(requested_url)
        } else {
            None
        };

        let mut hops = 0u32;
        loop {
            guard::check_allowed(&current, &options.allow_hosts, options.allow_private_hosts)?;

            let mut request = self.client.get(current.clone()).header(ACCEPT, ACCEPT_FEEDS);
            if let Some(entry) = &revalidation {
                if let Some(etag) = &entry.etag {
                    request = request.header(IF_NONE_MATCH, etag);
                }
                if let Some(last_modified) = &entry.last_modified {
                    request = request.header(IF_MODIFIED_SINCE, last_modified);
                }
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_transport_error(&current, e, options))?;
            let status = response.status();

            if status == StatusCode::NOT_MODIFIED {
                // A 304 without revalidation headers on our side means the
                // protocol broke; that is fatal, not recoverable.
                return match revalidation.take() {
                    Some(entry) => Ok(FetchedBody {
                        xml: entry.xml,
                        etag: entry.etag,
                        last_modified: entry.last_modified,
                        not_modified: true,
                    }),
                    None => Err(FetchError::CacheProtocolViolation {
                        url: requested_url.to_string(),
                    }),
                };
            }

            if status.is_redirection() {
                let location = match header_string(&response, LOCATION) {
                    Some(l) => l,
                    None => {
                        return Err(FetchError::RedirectMissingLocation {
                            url: current.to_string(),
                        })
                    }
                };
                hops += 1;
                if hops > MAX_REDIRECT_HOPS {
                    return Err(FetchError::TooManyRedirects {
                        url: requested_url.to_string(),
                        max_hops: MAX_REDIRECT_HOPS,
                    });
                }
                // Relative and protocol-relative locations resolve against
                // the current URL
                let next = current.join(&location).map_err(|e| FetchError::InvalidUrl {
                    url: location.clone(),
                    message: e.to_string(),
                })?;
                debug!("Redirect {} -> {} (hop {})", current, next, hops);
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::UpstreamHttpError {
                    status: status.as_u16(),
                    url: current.to_string(),
                });
            }

            return self.read_capped_body(response, &current, options).await;
        }
    }

    /// Stream the response body under the byte cap, then decode as UTF-8.
    /// Decoding is lossy: invalid sequences become replacement characters,
    /// never an error.
    async fn read_capped_body(
        &self,
        response: reqwest::Response,
        current: &Url,
        options: &FetchOptions,
    ) -> Result<FetchedBody, FetchError> {
        let etag = header_string(&response, ETAG);
        let last_modified = header_string(&response, LAST_MODIFIED);

        // A declared length over the cap fails without reading anything
        if let Some(declared) = response.content_length() {
            if declared > options.max_bytes {
                return Err(FetchError::FeedTooLarge {
                    url: current.to_string(),
                    max_bytes: options.max_bytes,
                });
            }
        }

        let mut body: Vec<u8> = Vec::new();
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::NetworkError {
                url: current.to_string(),
                message: e.to_string(),
            })?;
            received += chunk.len() as u64;
            // The running counter protects against absent, zero, or
            // understated Content-Length
            if received > options.max_bytes {
                return Err(FetchError::FeedTooLarge {
                    url: current.to_string(),
                    max_bytes: options.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedBody {
            xml: String::from_utf8_lossy(&body).into_owned(),
            etag,
            last_modified,
            not_modified: false,
        })
    }
}

fn header_string(response: &reqwest::Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn map_transport_error(url: &Url, error: reqwest::Error, options: &FetchOptions) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: options.timeout_ms,
        }
    } else {
        FetchError::NetworkError {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
