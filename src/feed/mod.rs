// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feed payload collaborators
//!
//! What happens to a feed body after the engine has fetched it:
//! item extraction and draft templating.

pub mod extractor;
pub mod templater;

// Re-export commonly used types
pub use extractor::{ItemExtractor, RssItemExtractor};
pub use templater::{DraftTemplater, PlaceholderTemplater};
