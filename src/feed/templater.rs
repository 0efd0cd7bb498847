//! Draft templating
//!
//! Renders a feed item into a short social-post draft. The trait is
//! async so richer implementations (an LLM-backed writer, a remote
//! service) can slot in behind the same seam; the built-in one is plain
//! placeholder substitution.

use async_trait::async_trait;

use crate::fetch::types::FeedItem;

/// Hard cap on rendered draft length, in characters
pub const DEFAULT_DRAFT_MAX_CHARS: usize = 280;

/// Default persona template
pub const DEFAULT_TEMPLATE: &str = "\u{1F4F0} {title}\n\n{url}";

/// Minimum room kept for the title when trimming an oversized draft
const MIN_TITLE_ROOM: usize = 12;

/// Renders one feed item into a post draft
#[async_trait]
pub trait DraftTemplater: Send + Sync {
    async fn render(&self, item: &FeedItem) -> String;
}

/// `{title}` / `{url}` substitution with a length cap
///
/// When a draft runs over the cap the title is trimmed at a word
/// boundary; the link is never cut.
pub struct PlaceholderTemplater {
    template: String,
    max_chars: usize,
}

impl PlaceholderTemplater {
    pub fn new() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            max_chars: DEFAULT_DRAFT_MAX_CHARS,
        }
    }

    /// Override the rendered-length cap
    pub fn capped_at(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn render_with(&self, title: &str, url: &str) -> String {
        self.template.replace("{title}", title).replace("{url}", url)
    }
}

impl Default for PlaceholderTemplater {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftTemplater for PlaceholderTemplater {
    async fn render(&self, item: &FeedItem) -> String {
        let draft = self.render_with(&item.title, &item.url);
        if draft.chars().count() <= self.max_chars {
            return draft;
        }

        let fixed = self.render_with("", &item.url).chars().count();
        let room = self.max_chars.saturating_sub(fixed).max(MIN_TITLE_ROOM);
        let trimmed = truncate_at_word(&item.title, room);
        self.render_with(&trimmed, &item.url)
    }
}

/// Truncate to at most `max_chars` characters, cutting at a word
/// boundary and appending an ellipsis.
fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let cut: String = text.chars().take(keep).collect();
    match cut.rfind(' ') {
        Some(pos) => format!("{}...", &cut[..pos]),
        None => format!("{}...", cut),
    }
}
