// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Disk-backed conditional cache for feed documents
//!
//! One JSON file per URL, named by the SHA-256 of the URL so filenames
//! stay opaque. Freshness is judged at read time, never at write time;
//! writes go through a uniquely-named temp file in the same directory
//! plus a rename, so a reader never observes a partial file. Corrupt
//! entries are misses, never errors.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::types::CacheEntry;

/// Disk cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entry files on disk
    pub entries: usize,
    /// Total bytes across entry files
    pub total_bytes: u64,
    /// The directory scanned
    pub dir: PathBuf,
}

/// Outcome of structural validation of one cache file
enum EntryState {
    Valid(CacheEntry),
    Corrupt,
}

/// Disk-backed cache of fetched feeds, keyed by SHA-256 of the URL
pub struct FeedCache {
    dir: PathBuf,
}

impl FeedCache {
    /// Create a cache rooted at the given directory. The directory is
    /// created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Derive the opaque cache key for a URL
    pub fn cache_key(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::cache_key(url)))
    }

    /// TTL-bounded read: the entry must be present, structurally valid,
    /// and no older than `ttl_ms`. A zero TTL never returns an entry.
    pub fn read_fresh(&self, url: &str, now_ms: i64, ttl_ms: u64) -> Option<CacheEntry> {
        if ttl_ms == 0 {
            return None;
        }
        let entry = self.read_valid(url)?;
        let age_ms = now_ms - entry.fetched_at_ms;
        if age_ms <= i64::try_from(ttl_ms).unwrap_or(i64::MAX) {
            Some(entry)
        } else {
            debug!("Cache entry for {} is stale ({}ms old)", url, age_ms);
            None
        }
    }

    /// TTL-agnostic read: presence and validity only. Used to populate
    /// conditional request headers and for stale-on-error fallback.
    pub fn read_for_revalidation(&self, url: &str) -> Option<CacheEntry> {
        self.read_valid(url)
    }

    fn read_valid(&self, url: &str) -> Option<CacheEntry> {
        let path = self.entry_path(url);
        let contents = fs::read_to_string(&path).ok()?;
        match Self::validate(&contents) {
            EntryState::Valid(entry) => Some(entry),
            EntryState::Corrupt => {
                warn!(
                    "Corrupt cache entry for {} at {}, treating as miss",
                    url,
                    path.display()
                );
                None
            }
        }
    }

    /// Structural validation: all required fields present with the right
    /// types. Anything else is `Corrupt` and reads as a miss.
    fn validate(contents: &str) -> EntryState {
        match serde_json::from_str::<CacheEntry>(contents) {
            Ok(entry) => EntryState::Valid(entry),
            Err(_) => EntryState::Corrupt,
        }
    }

    /// Best-effort atomic write: serialize, write to a uniquely-named
    /// temp file in the cache directory, rename over the final path.
    /// Failures are logged and swallowed; the cache never breaks a fetch.
    pub fn write(&self, url: &str, entry: &CacheEntry) {
        if let Err(e) = self.try_write(url, entry) {
            warn!("Failed to write cache entry for {}: {}", url, e);
        }
    }

    fn try_write(&self, url: &str, entry: &CacheEntry) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(entry)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.entry_path(url)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Scan the cache directory for entry count and total size
    pub fn stats(&self) -> CacheStats {
        let mut entries = 0usize;
        let mut total_bytes = 0u64;
        if let Ok(dir) = fs::read_dir(&self.dir) {
            for item in dir.flatten() {
                let path = item.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    entries += 1;
                    if let Ok(meta) = item.metadata() {
                        total_bytes += meta.len();
                    }
                }
            }
        }
        CacheStats {
            entries,
            total_bytes,
            dir: self.dir.clone(),
        }
    }
}
