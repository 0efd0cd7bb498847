// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod feeds;
pub mod http_server;

pub use feeds::{feeds_handler, FeedsApiRequest, FeedsApiResponse, FetchSummary};
pub use http_server::{create_router, start_server, AppState};
