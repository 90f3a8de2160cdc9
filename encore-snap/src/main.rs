//! encore-snap - weekly artist snapshot service
//!
//! Records one popularity/follower snapshot per tracked artist per season
//! week. The snapshot job is triggered over HTTP by an external scheduler,
//! by the optional built-in scheduler, or once from the command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use encore_common::config::{
    default_config_path, load_toml_config, ConfigOverrides, ServiceConfig,
};
use tokio::signal;
use tracing::{error, info, warn};

use encore_snap::services::{spawn_snapshot_scheduler, SpotifyClient};
use encore_snap::{build_router, logging, AppState};

/// Command-line arguments for encore-snap
#[derive(Parser, Debug)]
#[command(name = "encore-snap")]
#[command(about = "Weekly artist snapshot service for Encore")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config dir)
    #[arg(short, long, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "ENCORE_DATABASE")]
    database: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "ENCORE_PORT")]
    port: Option<u16>,

    /// Log level or EnvFilter directive (RUST_LOG takes precedence)
    #[arg(long, env = "ENCORE_LOG")]
    log_level: Option<String>,

    /// Spotify client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    spotify_client_id: Option<String>,

    /// Spotify client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,

    /// Run the snapshot job every N seconds (0 disables)
    #[arg(long, env = "ENCORE_SNAPSHOT_INTERVAL_SECS")]
    snapshot_interval_secs: Option<u64>,

    /// Run one snapshot and exit instead of serving HTTP
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Subscriber first so configuration warnings are visible
    let log_handle = logging::init_tracing(args.log_level.as_deref());

    // Build identification first, before any database work
    info!(
        "Starting encore-snap v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load config file")?,
        None => Default::default(),
    };

    let overrides = ConfigOverrides {
        database_path: args.database,
        port: args.port,
        log_level: args.log_level,
        spotify_client_id: args.spotify_client_id,
        spotify_client_secret: args.spotify_client_secret,
        snapshot_interval_secs: args.snapshot_interval_secs,
    };
    let config = ServiceConfig::resolve(overrides, toml_config)
        .context("Failed to resolve configuration")?;

    logging::apply_configured_level(&log_handle, &config.log_level);

    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No platform config directory; using defaults"),
    }
    info!("Database: {}", config.database_path.display());

    let pool = encore_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let spotify = SpotifyClient::new(config.spotify.clone())
        .context("Failed to create Spotify client")?;
    let state = AppState::new(pool, Arc::new(spotify));

    if args.once {
        return run_once(&state, config.refresh_before_snapshot).await;
    }

    if let Some(secs) = config.snapshot_interval_secs {
        spawn_snapshot_scheduler(
            state.clone(),
            Duration::from_secs(secs),
            config.refresh_before_snapshot,
        );
    } else {
        info!("Built-in scheduler disabled; waiting for external triggers");
    }

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("encore-snap listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// One-shot mode for cron-style invocation
async fn run_once(state: &AppState, refresh_first: bool) -> Result<()> {
    if refresh_first {
        let refreshed = state
            .refresh_cache()
            .await
            .context("Artist cache refresh failed")?;
        info!("Refreshed {} cached artists", refreshed);
    }

    let outcome = state
        .run_snapshot(chrono::Utc::now())
        .await
        .context("Weekly snapshot failed")?;
    info!("{}", outcome.message());
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
