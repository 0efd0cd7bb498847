// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feeds API response types

use serde::{Deserialize, Serialize};

use crate::fetch::{BatchOutcome, FailureRecord, FeedItem};

/// Batch summary counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSummary {
    /// URLs in the request
    pub requested: usize,
    /// URLs resolved into content
    pub fetched: usize,
    /// URLs that failed; always equals `failures.len()`
    pub failed: usize,
    /// Wall-clock time for the whole batch in milliseconds
    pub fetch_time_ms: u64,
}

/// Response body for POST /v1/feeds
///
/// Always partial success: failed URLs land in `failures` next to the
/// items from the ones that worked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedsApiResponse {
    /// Extracted items, flattened in input-URL order
    pub items: Vec<FeedItem>,

    /// Per-URL failures, in input-URL order
    pub failures: Vec<FailureRecord>,

    /// Batch counters
    pub summary: FetchSummary,
}

impl FeedsApiResponse {
    /// Build a response from a batch outcome
    pub fn new(requested: usize, outcome: BatchOutcome, fetch_time_ms: u64) -> Self {
        let failed = outcome.failures.len();
        let summary = FetchSummary {
            requested,
            fetched: requested.saturating_sub(failed),
            failed,
            fetch_time_ms,
        };
        Self {
            items: outcome.items,
            failures: outcome.failures,
            summary,
        }
    }
}
