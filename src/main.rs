//! Newsgate - admission layer server
//!
//! Serves the cache and quota administration API and runs the background sweeps.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsgate::{create_router, AppState, BackgroundTasks, Config};

/// Main entry point for the Newsgate server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the cache, the quota manager and the admission gate
/// 4. Start background cache and quota sweeps
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Newsgate admission server");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    info!(
        "Configuration loaded: cache_limit={}B, window={}s, vip_multiplier={}, port={}, caching={}, rate_limiting={}",
        config.cache.limit_bytes,
        config.quota.window_secs,
        config.quota.vip_multiplier,
        config.server_port,
        config.enable_caching,
        config.enable_rate_limiting
    );

    let state = AppState::from_config(&config);
    info!(
        "Cache and quota manager initialized ({} VIP subjects)",
        config.admin_user_ids.len()
    );

    let tasks = BackgroundTasks::start(&state, &config);
    info!("Background sweep tasks started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep tasks and allows graceful shutdown.
async fn shutdown_signal(tasks: BackgroundTasks) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
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

    tasks.shutdown();
}
