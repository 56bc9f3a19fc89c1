//! Transport Cache - in-memory caching for transport pricing and availability
//!
//! Runs the cache manager behind the HTTP admin API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transport_cache::api::create_router;
use transport_cache::{AppState, CacheManager, Config};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager and start its sweep
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop serving, cancel timers and destroy the manager
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transport_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting transport cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cleanup_interval={}s, pricing={}x{}s, availability={}x{}s, form_state={}x{}s",
        config.server_port,
        config.cleanup_interval,
        config.pricing_max_size,
        config.pricing_ttl,
        config.availability_max_size,
        config.availability_ttl,
        config.form_state_max_size,
        config.form_state_ttl,
    );

    let state = AppState::from_config(&config);
    let manager = state.manager.clone();
    let debouncer = state.debouncer.clone();
    info!("Cache manager started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let cancelled = debouncer.cancel_all();
    if cancelled > 0 {
        warn!("Cancelled {} pending debounced calls", cancelled);
    }
    shutdown_manager(&manager).await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_manager(manager: &CacheManager) {
    let stats = manager.stats().await;
    info!(
        "Destroying cache manager with {} live entries",
        stats.total_entries
    );
    manager.destroy().await;
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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
