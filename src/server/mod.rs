//! HTTP server for the cascade bot.
//!
//! This module implements the HTTP server that:
//! - Accepts Bitbucket webhooks, checks the shared key, and hands the work to
//!   the dispatcher
//! - Exposes recent delivery outcomes for observability
//! - Provides a liveness check
//!
//! # Endpoints
//!
//! - `POST /webhook?key=<shared key>` - Accepts Bitbucket webhook deliveries
//! - `GET /api/v1/deliveries` - Returns recent delivery outcomes as JSON
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use secrecy::SecretString;

use crate::dispatch::{Dispatcher, OutcomeLog};
use crate::host::RepositoryHost;

pub mod deliveries;
pub mod health;
pub mod webhook;


pub use deliveries::deliveries_handler;
pub use health::health_handler;
pub use webhook::webhook_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<H> {
    inner: Arc<AppStateInner<H>>,
}

struct AppStateInner<H> {
    /// Key every delivery must carry in its `key` query parameter.
    shared_key: SecretString,

    /// Runs accepted deliveries in the background.
    dispatcher: Dispatcher<H>,

    /// Recent delivery outcomes, filled by the outcome sink.
    outcomes: OutcomeLog,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: RepositoryHost + 'static> AppState<H> {
    pub fn new(shared_key: SecretString, dispatcher: Dispatcher<H>, outcomes: OutcomeLog) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                shared_key,
                dispatcher,
                outcomes,
            }),
        }
    }

    pub fn shared_key(&self) -> &SecretString {
        &self.inner.shared_key
    }

    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.inner.dispatcher
    }

    pub fn outcomes(&self) -> &OutcomeLog {
        &self.inner.outcomes
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<H: RepositoryHost + 'static>(app_state: AppState<H>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<H>))
        .route("/api/v1/deliveries", get(deliveries_handler::<H>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
