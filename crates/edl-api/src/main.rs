//! # edl-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment:
//! `PORT` (default 8080), `ISSUER_ORG`, `ENFORCE_SUBJECT_IDENTITY`,
//! `MAX_CONSENT_DAYS`, `LEDGER_SNAPSHOT`, `LOG_FORMAT` and `RUST_LOG`.

use std::sync::Arc;

use edl_api::state::{AppConfig, AppState, LogFormat};
use edl_core::SystemClock;
use edl_store::MemoryLedger;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let ledger = match &config.ledger_snapshot {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path)?;
            let ledger = MemoryLedger::from_snapshot(&json, Arc::new(SystemClock)).map_err(|e| {
                tracing::error!(path = %path.display(), "ledger snapshot could not be loaded: {e}");
                e
            })?;
            tracing::info!(path = %path.display(), keys = ledger.len(), "ledger snapshot loaded");
            ledger
        }
        Some(path) => {
            tracing::warn!(path = %path.display(), "ledger snapshot not found, starting empty");
            MemoryLedger::default()
        }
        None => MemoryLedger::default(),
    };

    tracing::info!(
        issuer_org = %config.contract.issuer_org,
        enforce_subject_identity = config.contract.enforce_subject_identity,
        "registry configured"
    );

    let state = AppState::with_ledger(config.clone(), ledger);
    let app = edl_api::app(state.clone());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("edu-ledger API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &config.ledger_snapshot {
        std::fs::write(path, state.ledger().snapshot()?)?;
        tracing::info!(path = %path.display(), height = state.ledger().height(), "ledger snapshot written");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
