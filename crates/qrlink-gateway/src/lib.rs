#![forbid(unsafe_code)]

pub mod config;
pub mod delivery;
pub mod error;
mod observability;
pub mod server;
mod verify;

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use qrlink_tokens::Verifier;

pub use config::{Args, Config, ConfigError};
pub use observability::REQUEST_ID_HEADER;
pub use server::{start, RunningServer};

/// Shared, read-only request state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub verifier: Verifier,
}

impl AppState {
    pub fn new(verifier: Verifier) -> Self {
        if verifier.is_bypass() {
            tracing::warn!(
                "signature verification is DISABLED (no secret configured); any token with a \
                 valid payload will be accepted"
            );
        }
        if verifier.ttl().is_unlimited() {
            tracing::warn!("token expiry is disabled (ttl = 0)");
        }
        Self { verifier }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.verifier())
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/verify", get(verify::verify_get))
        .route("/healthz", get(health))
        .route_layer(middleware::from_fn(observability::middleware))
        .with_state(Arc::new(state))
}

async fn health() -> &'static str {
    "ok\n"
}
