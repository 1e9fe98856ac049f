use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auto_cascade::config::Config;
use auto_cascade::dispatch::{
    DEFAULT_OUTCOME_CHANNEL_CAPACITY, Dispatcher, OutcomeLog, spawn_outcome_sink,
};
use auto_cascade::host::BitbucketClient;
use auto_cascade::orchestrator::{DedupeWindow, PullRequestOrchestrator};
use auto_cascade::server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auto_cascade=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to read configuration")?;
    info!(?config, "Starting auto-cascade");

    let client = BitbucketClient::new(
        &config.api_url,
        config.username.clone(),
        config.password.clone(),
    )
    .context("failed to build Bitbucket client")?;

    let mut orchestrator = PullRequestOrchestrator::new(Arc::new(client), config.policy.clone());
    if let Some(window) = config.dedupe_window.and_then(DedupeWindow::new) {
        info!(window = ?config.dedupe_window, "Propagation de-duplication enabled");
        orchestrator = orchestrator.with_dedupe(window);
    }

    let (outcome_tx, outcome_rx) = mpsc::channel(DEFAULT_OUTCOME_CHANNEL_CAPACITY);
    let outcomes = OutcomeLog::default();
    let sink = spawn_outcome_sink(outcome_rx, outcomes.clone());

    let dispatcher = Dispatcher::new(orchestrator, outcome_tx);
    let app = build_router(AppState::new(config.shared_key.clone(), dispatcher, outcomes));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server error")?;

    // The router (and with it the last outcome sender) is gone; let in-flight
    // outcomes drain.
    sink.await.context("outcome sink panicked")?;
    info!("Stopped");
    Ok(())
}
