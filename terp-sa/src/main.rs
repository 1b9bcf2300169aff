//! Strain analysis service (terp-sa) - Main entry point
//!
//! HTTP microservice exposing the TerpTracker analysis pipeline:
//! normalize caller readings, merge with cached and upstream data,
//! classify, and report.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terp_sa::config::{Cli, Settings};
use terp_sa::{build_router, db, seed, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terp_sa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments and resolve settings
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli).context("Failed to resolve configuration")?;

    info!(
        "Starting TerpTracker strain analysis service on port {}",
        settings.port
    );
    info!("Database: {}", settings.database_path.display());

    // Initialize the profile cache
    let pool = db::init_database_pool(&settings.database_path)
        .await
        .context("Failed to initialize database")?;

    // Import bundled datasets on first launch
    seed::load_seed_datasets(&pool, &settings.seed_dir)
        .await
        .context("Failed to load seed datasets")?;

    if settings.cannlytics_api_key.is_none() {
        info!("Cannlytics API key not configured, supplemental lookups fall back to Kushy only");
    }

    // Build the application router
    let state = AppState::new(pool, &settings);
    let app = build_router(state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    info!("Starting HTTP server on {}", addr);

    // Create and run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
