// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feeds API endpoint handler

use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, info, warn};

use super::request::FeedsApiRequest;
use super::response::FeedsApiResponse;
use crate::api::http_server::AppState;

/// POST /v1/feeds - Fetch a batch of feed URLs
///
/// # Request
/// - `urls`: Feed URLs to fetch (required, max 50)
/// - `allowHosts`: Host allowlist for the guard (empty fails every URL)
/// - `allowPrivateHosts`, `maxBytes`, `timeoutMs`, `cache`, `cacheTtlMs`,
///   `staleIfError`, `concurrency`: optional overrides of server defaults
///
/// # Response
/// - `items`: Extracted items in input-URL order
/// - `failures`: Per-URL failure records (url, message, durationMs)
/// - `summary`: `{requested, fetched, failed, fetchTimeMs}`
///
/// A batch is never all-or-nothing: a failing URL becomes a failure
/// record and the rest of the batch still returns 200.
///
/// # Errors
/// - 400 Bad Request: empty `urls`, blank entries, or too many URLs
pub async fn feeds_handler(
    State(state): State<AppState>,
    Json(request): Json<FeedsApiRequest>,
) -> Result<Json<FeedsApiResponse>, (StatusCode, String)> {
    debug!("Feeds request: {} urls", request.urls.len());

    // Validate request
    if let Err(e) = request.validate() {
        warn!("Feeds validation failed: {}", e);
        return Err((StatusCode::BAD_REQUEST, e));
    }

    state.requests_total.fetch_add(1, Ordering::Relaxed);

    let options = request.to_options(&state.config);
    let concurrency = request.concurrency_or_default(&state.config);

    let start = Instant::now();
    let outcome = state
        .service
        .fetch_many(&request.urls, &options, concurrency)
        .await;
    let fetch_time_ms = start.elapsed().as_millis() as u64;

    let requested = request.urls.len();
    let failed = outcome.failures.len();
    state
        .urls_fetched_total
        .fetch_add((requested - failed) as u64, Ordering::Relaxed);
    state.failures_total.fetch_add(failed as u64, Ordering::Relaxed);

    info!(
        "Feeds complete: {} items, {} failures for {} urls in {}ms",
        outcome.items.len(),
        failed,
        requested,
        fetch_time_ms
    );

    Ok(Json(FeedsApiResponse::new(requested, outcome, fetch_time_ms)))
}
