// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch feeds API endpoint
//!
//! Provides the `POST /v1/feeds` HTTP endpoint for batch feed fetching.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::feeds_handler;
pub use request::{FeedsApiRequest, MAX_URLS_PER_REQUEST};
pub use response::{FeedsApiResponse, FetchSummary};
