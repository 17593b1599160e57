//! Webhook server for the Heimdall review bot.
//!
//! This crate implements the event pipeline: HMAC signature verification,
//! event classification, review deduplication, the dispatcher that drives
//! PR-data retrieval → policy resolution → model invocation → comment
//! posting, and the axum router exposing it all.
//!
//! # Endpoints
//!
//! - `POST /webhook` — accepts signed GitHub webhook deliveries
//! - `GET /health` — process uptime and metrics snapshot

use std::sync::Arc;

mod dedup;
mod dispatch;
mod event;
mod health;
mod signature;
#[cfg(test)]
pub(crate) mod testing;
mod webhook;

pub use dedup::{default_cooldown, DedupEntry, ReviewTracker};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use event::{classify, EventClass, ReviewRequest, TRIGGER_TOKEN};
pub use health::{health_handler, HealthResponse};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
pub use webhook::{webhook_handler, WebhookResponse};

use heimdall_core::Metrics;

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    webhook_secret: Vec<u8>,
    dispatcher: Dispatcher,
    metrics: Metrics,
}

impl AppState {
    /// Assemble the state handed to every request handler.
    pub fn new(
        webhook_secret: impl Into<Vec<u8>>,
        dispatcher: Dispatcher,
        metrics: Metrics,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                dispatcher,
                metrics,
            }),
        }
    }

    /// Secret for webhook signature verification.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// The review dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// The shared metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

/// Build the axum router with all endpoints.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
