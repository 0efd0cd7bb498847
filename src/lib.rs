// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod feed;
pub mod fetch;
pub mod version;

// Re-export main types from the engine
pub use fetch::{
    BatchOutcome, CacheEntry, CacheStats, FailureRecord, FeedCache, FeedFetcher, FeedItem,
    FeedSource, FetchConfig, FetchError, FetchOptions, FetchOutcome, FetchService, FetchedFeed,
};

// Re-export types from the collaborator modules
pub use feed::{DraftTemplater, ItemExtractor, PlaceholderTemplater, RssItemExtractor};
