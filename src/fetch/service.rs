// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch fetch orchestration
//!
//! Fans a batch of feed URLs across a bounded worker pool. Workers pull
//! indices from a shared cursor, failures stay local to their URL, and
//! results come back in input order regardless of completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::feed::extractor::{ItemExtractor, RssItemExtractor};

use super::config::FetchConfig;
use super::fetcher::FeedFetcher;
use super::types::{
    BatchOutcome, FailureRecord, FeedItem, FetchError, FetchOptions, FetchOutcome,
};

/// Orchestrates the fetcher, the cache, and item extraction
pub struct FetchService {
    fetcher: FeedFetcher,
    extractor: Box<dyn ItemExtractor>,
}

impl FetchService {
    /// Create a service with the built-in extractor
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_extractor(config, Box::new(RssItemExtractor::new()))
    }

    /// Create a service with a caller-supplied extractor
    pub fn with_extractor(config: &FetchConfig, extractor: Box<dyn ItemExtractor>) -> Self {
        Self {
            fetcher: FeedFetcher::new(config),
            extractor,
        }
    }

    /// Fetch a single feed and extract its items
    pub async fn fetch_one(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, FetchError> {
        let feed = self.fetcher.fetch_feed(url, options).await?;
        let items = self.extractor.extract(&feed.xml);
        debug!("{}: {} items (source {:?})", url, items.len(), feed.source);
        Ok(FetchOutcome {
            items,
            source: feed.source,
        })
    }

    /// Fetch a batch of URLs under a bounded worker pool
    ///
    /// Every URL is attempted exactly once. A failed URL becomes a
    /// `FailureRecord` in the outcome and never cancels or blocks its
    /// siblings. Items come back flattened in input-URL order, whatever
    /// order the workers actually finish in.
    pub async fn fetch_many(
        &self,
        urls: &[String],
        options: &FetchOptions,
        concurrency: usize,
    ) -> BatchOutcome {
        if urls.is_empty() {
            return BatchOutcome::default();
        }

        let pool_size = concurrency.clamp(1, urls.len());
        let cursor = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();
        debug!(
            "Fetching {} urls with {} workers",
            urls.len(),
            pool_size
        );

        // Workers are plain futures driven together on this task; the
        // cursor is the only shared mutable state between them.
        let workers: Vec<_> = (0..pool_size)
            .map(|worker| {
                let cursor = Arc::clone(&cursor);
                async move {
                    let mut claimed: Vec<(usize, Result<Vec<FeedItem>, FailureRecord>)> =
                        Vec::new();
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        if index >= urls.len() {
                            break;
                        }
                        let url = &urls[index];
                        debug!("Worker {} fetching [{}] {}", worker, index, url);
                        let attempt_start = Instant::now();
                        let outcome = match self.fetch_one(url, options).await {
                            Ok(outcome) => Ok(outcome.items),
                            Err(e) => Err(FailureRecord {
                                url: url.clone(),
                                message: e.to_string(),
                                duration_ms: attempt_start.elapsed().as_millis() as u64,
                            }),
                        };
                        claimed.push((index, outcome));
                    }
                    claimed
                }
            })
            .collect();

        // Merge each worker's claims back into input-order slots
        let mut slots: Vec<Option<Result<Vec<FeedItem>, FailureRecord>>> = Vec::new();
        slots.resize_with(urls.len(), || None);
        for claims in join_all(workers).await {
            for (index, outcome) in claims {
                slots[index] = Some(outcome);
            }
        }

        let mut batch = BatchOutcome::default();
        for slot in slots.into_iter().flatten() {
            match slot {
                Ok(items) => batch.items.extend(items),
                Err(failure) => {
                    warn!("Fetch failed for {}: {}", failure.url, failure.message);
                    batch.failures.push(failure);
                }
            }
        }

        info!(
            "Batch complete: {} urls, {} items, {} failures in {}ms",
            urls.len(),
            batch.items.len(),
            batch.failures.len(),
            start.elapsed().as_millis()
        );
        batch
    }
}
