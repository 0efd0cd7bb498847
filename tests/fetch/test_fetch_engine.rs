//! Integration tests for the feed fetcher against live loopback servers
//!
//! Each test spins up its own axum router on an ephemeral 127.0.0.1 port
//! and drives the fetcher at it, so redirect handling, revalidation, and
//! size caps are exercised over real HTTP.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures_util::stream;
use tempfile::TempDir;

use feed_jarvis::fetch::fetcher::ACCEPT_FEEDS;
use feed_jarvis::{FeedCache, FeedFetcher, FeedSource, FetchError};

use super::support::{self, TestFeedServer};

/// Router serving a fixed RSS body and counting hits.
fn feed_router(hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/feed.xml",
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (
                    [(header::CONTENT_TYPE, "application/rss+xml")],
                    support::RSS_ALPHA,
                )
            }
        }),
    )
}

#[tokio::test]
async fn test_fetches_feed_over_network() {
    let hits = Arc::new(AtomicUsize::new(0));
    let server = TestFeedServer::spawn(feed_router(hits.clone())).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let url = server.url("/feed.xml");
    let feed = fetcher
        .fetch_feed(&url, &support::loopback_options())
        .await
        .unwrap();

    assert_eq!(feed.xml, support::RSS_ALPHA);
    assert_eq!(feed.source, FeedSource::Network);
    assert_eq!(feed.url, url);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sends_feed_accept_header_and_user_agent() {
    let seen: Arc<Mutex<Option<HeaderMap>>> = Arc::new(Mutex::new(None));
    let seen_in = seen.clone();
    let app = Router::new().route(
        "/feed.xml",
        get(move |headers: HeaderMap| {
            let seen = seen_in.clone();
            async move {
                *seen.lock().unwrap() = Some(headers);
                support::RSS_ALPHA
            }
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    fetcher
        .fetch_feed(&server.url("/feed.xml"), &support::loopback_options())
        .await
        .unwrap();

    let headers = seen.lock().unwrap().take().unwrap();
    assert_eq!(
        headers.get(header::ACCEPT).unwrap().to_str().unwrap(),
        ACCEPT_FEEDS
    );
    let agent = headers.get(header::USER_AGENT).unwrap().to_str().unwrap();
    assert!(agent.contains("FeedJarvis"));
}

#[tokio::test]
async fn test_follows_relative_redirect_chain() {
    // /a -> /b (path-absolute) -> feed.xml (path-relative), both forms
    // must resolve against the current hop
    let hits = Arc::new(AtomicUsize::new(0));
    let final_hits = hits.clone();
    let app = Router::new()
        .route(
            "/a",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/b")], "") }),
        )
        .route(
            "/b",
            get(|| async { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "feed.xml")], "") }),
        )
        .route(
            "/feed.xml",
            get(move || {
                let hits = final_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    support::RSS_ALPHA
                }
            }),
        );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let url = server.url("/a");
    let feed = fetcher
        .fetch_feed(&url, &support::loopback_options())
        .await
        .unwrap();

    assert_eq!(feed.xml, support::RSS_ALPHA);
    // The reported URL is the one requested, not the redirect target
    assert_eq!(feed.url, url);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_redirect_loop_exhausts_hop_budget() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let app = Router::new().route(
        "/loop",
        get(move || {
            let hits = hits_in.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::FOUND, [(header::LOCATION, "/loop")], "")
            }
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let result = fetcher
        .fetch_feed(&server.url("/loop"), &support::loopback_options())
        .await;

    assert!(matches!(
        result,
        Err(FetchError::TooManyRedirects { max_hops: 5, .. })
    ));
    // Initial request plus five followed hops, never more
    assert_eq!(hits.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_redirect_without_location_fails() {
    let app = Router::new().route("/dead-end", get(|| async { StatusCode::FOUND }));
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let result = fetcher
        .fetch_feed(&server.url("/dead-end"), &support::loopback_options())
        .await;

    assert!(matches!(
        result,
        Err(FetchError::RedirectMissingLocation { .. })
    ));
}

#[tokio::test]
async fn test_redirect_to_off_allowlist_host_blocked() {
    // The redirect target host never resolves; getting HostNotAllowlisted
    // instead of a network error proves the guard ran before any contact
    let app = Router::new().route(
        "/jump",
        get(|| async {
            (
                StatusCode::FOUND,
                [(header::LOCATION, "http://feeds.invalid/rss")],
                "",
            )
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let result = fetcher
        .fetch_feed(&server.url("/jump"), &support::loopback_options())
        .await;

    match result {
        Err(FetchError::HostNotAllowlisted { host }) => assert_eq!(host, "feeds.invalid"),
        other => panic!("Expected HostNotAllowlisted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_declared_content_length_over_cap_fails() {
    let app = Router::new().route("/big", get(|| async { vec![b'x'; 100 * 1024] }));
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let mut options = support::loopback_options();
    options.max_bytes = 1_024;

    let result = fetcher.fetch_feed(&server.url("/big"), &options).await;

    assert!(matches!(
        result,
        Err(FetchError::FeedTooLarge { max_bytes: 1_024, .. })
    ));
}

#[tokio::test]
async fn test_streamed_body_over_cap_aborts_early() {
    // Endless chunked body with no Content-Length; only the running byte
    // counter can stop this one
    let app = Router::new().route(
        "/endless",
        get(|| async {
            let chunk = Bytes::from(vec![b'x'; 1_024]);
            let body = Body::from_stream(stream::repeat_with(move || {
                Ok::<Bytes, std::io::Error>(chunk.clone())
            }));
            Response::builder()
                .header(header::CONTENT_TYPE, "application/xml")
                .body(body)
                .unwrap()
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let mut options = support::loopback_options();
    options.max_bytes = 16 * 1_024;

    let started = Instant::now();
    let result = fetcher.fetch_feed(&server.url("/endless"), &options).await;

    assert!(matches!(result, Err(FetchError::FeedTooLarge { .. })));
    // The cap fires after ~16KB, long before the 5s attempt budget
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_upstream_http_error_surfaces_status() {
    let app = Router::new().route(
        "/broken",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "nope") }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let result = fetcher
        .fetch_feed(&server.url("/broken"), &support::loopback_options())
        .await;

    assert!(matches!(
        result,
        Err(FetchError::UpstreamHttpError { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_timeout_bounds_whole_attempt() {
    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            support::RSS_ALPHA
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let mut options = support::loopback_options();
    options.timeout_ms = 250;

    let started = Instant::now();
    let result = fetcher.fetch_feed(&server.url("/slow"), &options).await;

    assert!(matches!(
        result,
        Err(FetchError::Timeout { timeout_ms: 250, .. })
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_fresh_cache_skips_network() {
    let hits = Arc::new(AtomicUsize::new(0));
    let server = TestFeedServer::spawn(feed_router(hits.clone())).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let mut options = support::caching_options();
    options.cache_ttl_ms = 60_000;

    let url = server.url("/feed.xml");
    let first = fetcher.fetch_feed(&url, &options).await.unwrap();
    let second = fetcher.fetch_feed(&url, &options).await.unwrap();

    assert_eq!(first.source, FeedSource::Network);
    assert_eq!(second.source, FeedSource::Cache);
    assert_eq!(second.xml, support::RSS_ALPHA);
    // The second call never touched the server
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_etag_revalidation_round_trip() {
    // 200 with an ETag on the first request, 304 when the client presents
    // a matching If-None-Match
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in = seen.clone();
    let app = Router::new().route(
        "/feed.xml",
        get(move |headers: HeaderMap| {
            let seen = seen_in.clone();
            async move {
                let inm = headers
                    .get(header::IF_NONE_MATCH)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());
                let matched = inm.as_deref() == Some("\"v1\"");
                seen.lock().unwrap().push(inm);
                if matched {
                    (StatusCode::NOT_MODIFIED, [(header::ETAG, "\"v1\"")], "").into_response()
                } else {
                    (
                        StatusCode::OK,
                        [
                            (header::ETAG, "\"v1\""),
                            (header::CONTENT_TYPE, "application/rss+xml"),
                        ],
                        support::RSS_ALPHA,
                    )
                        .into_response()
                }
            }
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let mut options = support::caching_options();
    options.cache_ttl_ms = 0; // miss the fast path so every call revalidates

    let url = server.url("/feed.xml");
    let cache = FeedCache::new(dir.path());

    let first = fetcher.fetch_feed(&url, &options).await.unwrap();
    assert_eq!(first.source, FeedSource::Network);
    let stamped = cache.read_for_revalidation(&url).unwrap();

    tokio::time::sleep(Duration::from_millis(25)).await;

    let second = fetcher.fetch_feed(&url, &options).await.unwrap();
    assert_eq!(second.xml, support::RSS_ALPHA);
    assert_eq!(second.source, FeedSource::Network);

    // First request unconditional, second conditional
    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests, vec![None, Some("\"v1\"".to_string())]);

    // The 304 refreshed the entry timestamp and kept the validator
    let refreshed = cache.read_for_revalidation(&url).unwrap();
    assert!(refreshed.fetched_at_ms > stamped.fetched_at_ms);
    assert_eq!(refreshed.etag.as_deref(), Some("\"v1\""));
    assert_eq!(refreshed.xml, support::RSS_ALPHA);
}

#[tokio::test]
async fn test_not_modified_without_cache_entry_is_fatal() {
    // With caching off we never send validators, so an unconditional 304
    // is a protocol violation, not something to recover from
    let app = Router::new().route("/feed.xml", get(|| async { StatusCode::NOT_MODIFIED }));
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let result = fetcher
        .fetch_feed(&server.url("/feed.xml"), &support::loopback_options())
        .await;

    assert!(matches!(
        result,
        Err(FetchError::CacheProtocolViolation { .. })
    ));
}

#[tokio::test]
async fn test_stale_if_error_serves_cache_after_upstream_breaks() {
    // First request succeeds, everything after that is a 500
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let app = Router::new().route(
        "/feed.xml",
        get(move || {
            let hits = hits_in.clone();
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::OK, support::RSS_ALPHA).into_response()
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "down").into_response()
                }
            }
        }),
    );
    let server = TestFeedServer::spawn(app).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let mut options = support::caching_options();
    options.cache_ttl_ms = 0;
    options.stale_if_error = true;

    let url = server.url("/feed.xml");
    let first = fetcher.fetch_feed(&url, &options).await.unwrap();
    assert_eq!(first.source, FeedSource::Network);

    let second = fetcher.fetch_feed(&url, &options).await.unwrap();
    assert_eq!(second.source, FeedSource::Cache);
    assert_eq!(second.xml, support::RSS_ALPHA);

    // Without the fallback the same failure propagates
    options.stale_if_error = false;
    let third = fetcher.fetch_feed(&url, &options).await;
    assert!(matches!(
        third,
        Err(FetchError::UpstreamHttpError { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_corrupt_cache_entry_treated_as_miss() {
    let hits = Arc::new(AtomicUsize::new(0));
    let server = TestFeedServer::spawn(feed_router(hits.clone())).await;
    let dir = TempDir::new().unwrap();
    let fetcher = FeedFetcher::new(&support::test_config(&dir));

    let url = server.url("/feed.xml");
    let entry_path = dir
        .path()
        .join(format!("{}.json", FeedCache::cache_key(&url)));
    fs::create_dir_all(dir.path()).unwrap();
    fs::write(&entry_path, "{definitely not json").unwrap();

    let mut options = support::caching_options();
    options.cache_ttl_ms = 60_000;

    let feed = fetcher.fetch_feed(&url, &options).await.unwrap();

    // The corrupt entry reads as a miss; the network fetch then heals it
    assert_eq!(feed.source, FeedSource::Network);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let cache = FeedCache::new(dir.path());
    let healed = cache.read_for_revalidation(&url).unwrap();
    assert_eq!(healed.xml, support::RSS_ALPHA);
}
