//! Feed item extraction
//!
//! Pulls `(title, link)` pairs out of raw RSS or Atom XML. Extraction is
//! deliberately lightweight and infallible: malformed feeds yield fewer
//! items (or none), never an error.

use regex::Regex;
use tracing::debug;

use crate::fetch::types::FeedItem;

/// Upper bound on items taken from a single feed document
pub const DEFAULT_MAX_ITEMS: usize = 50;

/// Turns a raw feed document into items
///
/// Implementations must be infallible: anything unparseable maps to an
/// empty list.
#[cfg_attr(test, mockall::automock)]
pub trait ItemExtractor: Send + Sync {
    fn extract(&self, xml: &str) -> Vec<FeedItem>;
}

/// Regex-based extractor for RSS `<item>` and Atom `<entry>` elements
///
/// Tries RSS first, then Atom if no RSS items were found:
/// 1. RSS: `<item>` blocks with inner `<title>` and `<link>` text
/// 2. Atom: `<entry>` blocks with inner `<title>` and `<link href="...">`,
///    preferring `rel="alternate"` (or no `rel`) over `rel="self"`
///
/// Titles are CDATA-unwrapped, entity-decoded, and whitespace-normalized.
/// Items missing a title or a link are skipped.
pub struct RssItemExtractor {
    max_items: usize,
    item_block: Regex,
    entry_block: Regex,
    title_tag: Regex,
    link_tag: Regex,
    link_full: Regex,
    href_attr: Regex,
    rel_attr: Regex,
}

impl RssItemExtractor {
    pub fn new() -> Self {
        Self::with_max_items(DEFAULT_MAX_ITEMS)
    }

    /// Extractor with a custom per-feed item cap
    pub fn with_max_items(max_items: usize) -> Self {
        Self {
            max_items,
            item_block: Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>")
                .expect("Failed to compile item regex"),
            entry_block: Regex::new(r"(?is)<entry\b[^>]*>(.*?)</entry>")
                .expect("Failed to compile entry regex"),
            title_tag: Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>")
                .expect("Failed to compile title regex"),
            link_tag: Regex::new(r"(?is)<link\b[^>]*>([^<]+)</link>")
                .expect("Failed to compile link regex"),
            link_full: Regex::new(r"(?is)<link\b[^>]*>")
                .expect("Failed to compile link-tag regex"),
            href_attr: Regex::new(r#"(?is)href\s*=\s*["']([^"']*)["']"#)
                .expect("Failed to compile href regex"),
            rel_attr: Regex::new(r#"(?is)rel\s*=\s*["']([^"']*)["']"#)
                .expect("Failed to compile rel regex"),
        }
    }

    fn extract_rss(&self, xml: &str) -> Vec<FeedItem> {
        let mut items = Vec::new();
        for captures in self.item_block.captures_iter(xml) {
            if items.len() >= self.max_items {
                break;
            }
            let inner = &captures[1];
            let title = self
                .title_tag
                .captures(inner)
                .map(|c| clean_text(&c[1]))
                .unwrap_or_default();
            let url = self
                .link_tag
                .captures(inner)
                .map(|c| clean_text(&c[1]))
                .unwrap_or_default();
            if !title.is_empty() && !url.is_empty() {
                items.push(FeedItem { title, url });
            }
        }
        items
    }

    fn extract_atom(&self, xml: &str) -> Vec<FeedItem> {
        let mut items = Vec::new();
        for captures in self.entry_block.captures_iter(xml) {
            if items.len() >= self.max_items {
                break;
            }
            let inner = &captures[1];
            let title = self
                .title_tag
                .captures(inner)
                .map(|c| clean_text(&c[1]))
                .unwrap_or_default();
            let url = self.atom_link(inner).unwrap_or_default();
            if !title.is_empty() && !url.is_empty() {
                items.push(FeedItem { title, url });
            }
        }
        items
    }

    /// Pick the entry's canonical link: `rel="alternate"` (or no `rel`)
    /// wins; any href is the fallback.
    fn atom_link(&self, entry: &str) -> Option<String> {
        let mut fallback = None;
        for tag in self.link_full.find_iter(entry) {
            let tag = tag.as_str();
            let href = match self.href_attr.captures(tag) {
                Some(c) => c[1].trim().to_string(),
                None => continue,
            };
            if href.is_empty() {
                continue;
            }
            let rel = self
                .rel_attr
                .captures(tag)
                .map(|c| c[1].to_lowercase())
                .unwrap_or_else(|| "alternate".to_string());
            if rel == "alternate" {
                return Some(href);
            }
            if fallback.is_none() {
                fallback = Some(href);
            }
        }
        fallback
    }
}

impl Default for RssItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemExtractor for RssItemExtractor {
    fn extract(&self, xml: &str) -> Vec<FeedItem> {
        let items = self.extract_rss(xml);
        if !items.is_empty() {
            debug!("Extracted {} RSS items", items.len());
            return items;
        }
        let items = self.extract_atom(xml);
        debug!("Extracted {} Atom entries", items.len());
        items
    }
}

/// Unwrap CDATA, decode basic XML entities, normalize whitespace
fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);
    let decoded = decode_entities(inner);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the entities feeds actually use. `&amp;` goes last so literal
/// `&amp;lt;` stays `&lt;`.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
