mod api;
mod config;
mod error;
mod metrics;
mod retention;
mod state;
mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use crate::config::{CubicConfig, LogFormat, LogOutput};
use crate::retention::RetentionSweeper;
use crate::state::AppState;

/// Log ingestion service with automatic metadata derivation
#[derive(Debug, Parser)]
#[command(name = "cubiclog", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Remove logs older than the retention window and exit
    #[arg(long)]
    cleanup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Phase 1: basic tracing while configuration loads
    let basic_tracing = init_tracing_basic();

    info!("Starting CubicLog v{}", env!("CARGO_PKG_VERSION"));

    let config = CubicConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    // Phase 2: global subscriber from [logging]
    drop(basic_tracing);
    init_tracing_from_config(&config)?;

    info!("Configuration loaded successfully");

    let store = store::open_store(&config.storage).context("Failed to open log storage")?;
    info!("✓ Storage backend: {}", store.backend());

    let days = config.retention.days;
    let purged = retention::purge_expired(store.as_ref(), days, Utc::now())
        .context("Failed to purge expired logs")?;

    if cli.cleanup {
        println!("Cleanup completed. Logs older than {} days removed.", days);
        info!(purged, "Cleanup-only run finished");
        return Ok(());
    }

    let state = AppState::new(config.clone(), store);
    state.metrics.logs_purged(purged);

    let sweeper = RetentionSweeper::new(
        state.store.clone(),
        state.metrics.clone(),
        days,
        Duration::from_secs(config.retention.sweep_interval_secs),
        state.shutdown_tx.subscribe(),
    );
    tokio::spawn(sweeper.run());

    if config.auth.key().is_some() {
        info!("✓ API key authentication enabled");
    } else {
        warn!("No API key configured - log endpoints are open");
    }

    let app = api::build_router(state.clone());

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("Invalid bind address")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("✓ CubicLog is ready!");
    info!("Listening on: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the retention sweeper
    state.shutdown();

    info!("Server shut down gracefully");
    Ok(())
}

/// Phase 1: Basic tracing init so we can log during config loading.
/// Uses RUST_LOG env var or a sensible default.
fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cubiclog=debug,insight=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: install the global subscriber described by `[logging]`.
fn init_tracing_from_config(config: &CubicConfig) -> Result<()> {
    use std::sync::Arc;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Prefer RUST_LOG env var, fall back to config level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let open_log_file = |path: &str| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file '{}'", path))
    };

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            let layer = fmt::layer().json().with_target(true).with_thread_ids(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(Arc::new(open_log_file(path)?));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::Stdout) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(Arc::new(open_log_file(path)?));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
