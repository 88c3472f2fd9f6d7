use std::{sync::Arc, time::Instant};

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod links;
pub mod models;
pub mod response;
pub mod uptime;

#[cfg(test)]
pub(crate) mod testing;

use cache::LinkCache;
use config::AppConfig;
use uptime::Probe;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: AppConfig,
    pub cache: LinkCache,
    /// Used for the fresh sample taken on every stats request.
    pub prober: Arc<dyn Probe>,
    pub started: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig, prober: Arc<dyn Probe>) -> Self {
        Self {
            db,
            config,
            cache: LinkCache::new(),
            prober,
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/links",
            post(handlers::links::create_link).get(handlers::links::list_links),
        )
        .route(
            "/links/:code",
            get(handlers::links::link_stats).delete(handlers::links::delete_link),
        )
        // Short-link redirect; the static /links routes take priority
        .route("/:code", get(handlers::redirect::redirect));

    Router::new()
        // Load-balancer probe: 200 OK with no body
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/healthz", get(handlers::health::healthz))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
