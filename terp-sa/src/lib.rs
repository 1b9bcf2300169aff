//! TerpTracker strain analysis service (terp-sa)
//!
//! HTTP service around the pure analysis engine in `terp-core`. Adds
//! the stateful concerns: a SQLite profile cache, upstream strain API
//! clients, per-client rate limiting, and seed dataset import.

pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod matching;
pub mod pipeline;
pub mod ratelimit;
pub mod seed;

use std::sync::Arc;

use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::clients::{cannlytics::CannlyticsClient, kushy::KushyClient};
use crate::config::Settings;
use crate::pipeline::AnalysisPipeline;
use crate::ratelimit::ApiRateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Profile cache connection pool
    pub pool: SqlitePool,
    /// Analysis coordinator
    pub pipeline: Arc<AnalysisPipeline>,
    /// Per-client request budgets
    pub rate_limiter: Arc<ApiRateLimiter>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, settings: &Settings) -> Self {
        let cannlytics = CannlyticsClient::new(
            settings.cannlytics_base_url.clone(),
            settings.cannlytics_api_key.clone(),
        );
        let kushy = KushyClient::new(settings.kushy_base_url.clone());
        let pipeline = AnalysisPipeline::new(pool.clone(), cannlytics, kushy);

        Self {
            pool,
            pipeline: Arc::new(pipeline),
            rate_limiter: Arc::new(ApiRateLimiter::new(settings.rate_limit_per_minute)),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::profile_routes())
        .merge(api::terpene_routes())
        .merge(api::health_routes())
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state,
            ratelimit::rate_limit_middleware,
        ))
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
