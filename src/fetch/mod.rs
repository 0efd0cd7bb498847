// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feed retrieval engine
//!
//! Turns a batch of feed URLs into feed bodies and extracted items:
//! - SSRF host guard run on the initial URL and on every redirect hop
//! - Conditional on-disk cache (TTL fast path, ETag/Last-Modified
//!   revalidation, atomic writes)
//! - Manual redirect following with a hard hop budget
//! - Streaming body reads under a byte cap
//! - Bounded worker pool with per-URL failure isolation
//!
//! Key properties:
//! - Batch results preserve input-URL order
//! - One URL failing never aborts its siblings
//! - Corrupt cache state degrades to a miss, never an error

pub mod cache;
pub mod config;
pub mod fetcher;
pub mod guard;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheStats, FeedCache};
pub use config::FetchConfig;
pub use fetcher::FeedFetcher;
pub use service::FetchService;
pub use types::{
    BatchOutcome, CacheEntry, FailureRecord, FeedItem, FeedSource, FetchError, FetchOptions,
    FetchOutcome, FetchedFeed,
};
