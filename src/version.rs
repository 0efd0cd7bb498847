// Version information for Feed Jarvis

/// Full version string with feature description
pub const VERSION: &str = "v0.3.0-conditional-cache-2026-08-25";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.3.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 3;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2026-08-25";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "host-allowlist",
    "private-host-blocking",
    "conditional-get",
    "etag-revalidation",
    "atomic-cache-writes",
    "stale-if-error",
    "manual-redirects",
    "streaming-size-cap",
    "bounded-concurrency",
    "partial-success-batches",
    "rss-atom-extraction",
    "draft-templating",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Feed Jarvis {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
