//! KB Cache server
//!
//! Runs the cache behind an HTTP API, optionally restoring and saving a
//! snapshot file across restarts.

use std::net::SocketAddr;

use anyhow::Context;
use serde_json::Value;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kb_cache::api::create_router;
use kb_cache::{AppState, Config, Snapshot};

/// Main entry point for the KB Cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (and its cleanup sweep) from configuration
/// 4. Restore the snapshot file when persistence is enabled
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Stop the sweep, save the snapshot, release the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kb_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KB Cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, default_ttl={}ms, check_period={}s, strategy={}, persistent={}, port={}",
        config.max_size,
        config.default_ttl_ms,
        config.check_period_secs,
        config.strategy,
        config.persistent,
        config.server_port
    );

    let state = AppState::from_config(&config);
    if config.persistent {
        restore_snapshot(&state, &config).await;
    }

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if config.persistent {
        let snapshot = state.cache.export().await;
        snapshot
            .write_to(&config.snapshot_path)
            .with_context(|| format!("failed to save snapshot to {}", config.snapshot_path.display()))?;
        info!(
            "Saved {} entries to {}",
            snapshot.entries.len(),
            config.snapshot_path.display()
        );
    }
    state.cache.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Loads the snapshot file into the cache. A missing or unreadable file is
/// not fatal: the cache simply starts empty.
async fn restore_snapshot(state: &AppState, config: &Config) {
    let path = &config.snapshot_path;
    if !path.exists() {
        info!("No snapshot at {}, starting empty", path.display());
        return;
    }

    match Snapshot::<Value>::read_from(path) {
        Ok(snapshot) => {
            let restored = state.cache.import(snapshot).await;
            info!("Restored {} entries from {}", restored, path.display());
        }
        Err(e) => warn!("Ignoring snapshot at {}: {}", path.display(), e),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
