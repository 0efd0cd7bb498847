use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
    time::Instant,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::feeds::feeds_handler;
use crate::fetch::{FeedCache, FetchConfig, FetchService};
use crate::version;

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FetchService>,
    pub config: FetchConfig,
    pub started_at: Instant,
    pub requests_total: Arc<AtomicU64>,
    pub urls_fetched_total: Arc<AtomicU64>,
    pub failures_total: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            service: Arc::new(FetchService::new(&config)),
            config,
            started_at: Instant::now(),
            requests_total: Arc::new(AtomicU64::new(0)),
            urls_fetched_total: Arc::new(AtomicU64::new(0)),
            failures_total: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Build the router; split out from `start_server` so tests can drive
/// it without binding a socket.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Version endpoint
        .route("/v1/version", get(version_handler))
        // Batch feed fetching
        .route("/v1/feeds", post(feeds_handler))
        // Metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(
    config: FetchConfig,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState::new(config);
    let app = create_router(state);

    let addr = format!("127.0.0.1:{}", port).parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": version::VERSION_NUMBER,
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}

async fn version_handler() -> impl IntoResponse {
    Json(version::get_version_info())
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    // Simple Prometheus-style metrics
    let cache_stats = FeedCache::new(state.config.cache_dir.clone()).stats();
    let metrics = format!(
        "# HELP feed_requests_total Total number of /v1/feeds requests\n\
         # TYPE feed_requests_total counter\n\
         feed_requests_total {}\n\
         # HELP feed_urls_fetched_total URLs resolved into content\n\
         # TYPE feed_urls_fetched_total counter\n\
         feed_urls_fetched_total {}\n\
         # HELP feed_urls_failed_total URLs that failed\n\
         # TYPE feed_urls_failed_total counter\n\
         feed_urls_failed_total {}\n\
         # HELP feed_cache_entries Entries in the on-disk cache\n\
         # TYPE feed_cache_entries gauge\n\
         feed_cache_entries {}\n\
         # HELP feed_cache_bytes On-disk cache size in bytes\n\
         # TYPE feed_cache_bytes gauge\n\
         feed_cache_bytes {}\n",
        state.requests_total.load(Ordering::Relaxed),
        state.urls_fetched_total.load(Ordering::Relaxed),
        state.failures_total.load(Ordering::Relaxed),
        cache_stats.entries,
        cache_stats.total_bytes,
    );

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(metrics)
        .unwrap()
}
