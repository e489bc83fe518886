//! JSON web API (axum).

mod error;
mod handlers;
mod rate_limit;

pub use error::{status_from_error, WebError};
pub use handlers::*;
pub use rate_limit::RateLimiter;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::adapters::Services;
use crate::domain::config_validation::Settings;
use crate::jobs::JobRunner;

pub struct AppState {
    pub settings: Settings,
    pub services: Services,
    pub runner: Arc<JobRunner>,
    pub health_limiter: RateLimiter,
}

impl AppState {
    pub fn new(settings: Settings, services: Services, runner: Arc<JobRunner>) -> Self {
        let health_limiter =
            RateLimiter::new(settings.health_rate_limit, settings.health_rate_window);
        Self {
            settings,
            services,
            runner,
            health_limiter,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/backtest", post(handlers::submit_backtest))
        .route("/api/backtest/{id}", get(handlers::poll_backtest))
        .route("/api/prices/{symbol}", get(handlers::prices))
        .route("/api/news", get(handlers::news))
        .route("/api/screener", get(handlers::screener))
        .route(
            "/api/journal",
            get(handlers::list_journal).post(handlers::add_trade),
        )
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
