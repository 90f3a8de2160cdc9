//! Configuration loading
//!
//! Bootstrap configuration is resolved in priority order:
//! 1. Command-line argument / environment variable (highest priority)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)
//!
//! Command-line and environment handling lives in the service binaries (clap
//! reads both); this module owns the TOML layer, the compiled defaults and the
//! merge.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for encore-snap
pub const DEFAULT_PORT: u16 = 5780;

/// Environment variable names for the metrics provider credentials
pub const SPOTIFY_CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const SPOTIFY_CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Spotify client credentials
    #[serde(default)]
    pub spotify: SpotifyConfig,

    /// Built-in scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Spotify credentials as they appear in TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Scheduler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduled snapshot runs (0 or absent disables)
    #[serde(default)]
    pub snapshot_interval_secs: Option<u64>,

    /// Refresh the artist cache before each scheduled snapshot
    #[serde(default)]
    pub refresh_before_snapshot: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolved client-credentials pair for the metrics provider
#[derive(Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve Spotify credentials from CLI/env values and TOML
///
/// Each field is resolved independently with CLI/env taking priority.
/// Missing credentials are a hard error: the service never starts
/// unauthenticated.
pub fn resolve_spotify_credentials(
    cli_client_id: Option<&str>,
    cli_client_secret: Option<&str>,
    toml_config: &TomlConfig,
) -> Result<SpotifyCredentials> {
    let client_id = pick_credential(
        "client id",
        cli_client_id,
        toml_config.spotify.client_id.as_deref(),
    );
    let client_secret = pick_credential(
        "client secret",
        cli_client_secret,
        toml_config.spotify.client_secret.as_deref(),
    );

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(SpotifyCredentials {
            client_id,
            client_secret,
        }),
        (id, secret) => {
            let mut missing = Vec::new();
            if id.is_none() {
                missing.push("client id");
            }
            if secret.is_none() {
                missing.push("client secret");
            }
            Err(Error::Config(format!(
                "Spotify {} not configured. Please configure using one of:\n\
                 1. Command line: --spotify-client-id / --spotify-client-secret\n\
                 2. Environment: {}=... and {}=...\n\
                 3. TOML config: [spotify] client_id = \"...\", client_secret = \"...\"",
                missing.join(" and "),
                SPOTIFY_CLIENT_ID_ENV,
                SPOTIFY_CLIENT_SECRET_ENV,
            )))
        }
    }
}

fn pick_credential(label: &str, cli: Option<&str>, toml: Option<&str>) -> Option<String> {
    let cli = cli.filter(|v| is_valid_key(v));
    let toml = toml.filter(|v| is_valid_key(v));

    if cli.is_some() && toml.is_some() {
        warn!(
            "Spotify {} found in both command line/environment and TOML. Using command line/environment.",
            label
        );
    }

    cli.or(toml).map(|v| v.trim().to_string())
}

/// Default configuration file path for the platform
///
/// `~/.config/encore/encore.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("encore").join("encore.toml"))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("encore"))
        .unwrap_or_else(|| PathBuf::from("./encore_data"))
        .join("encore.db")
}

/// Load TOML configuration from `path`
///
/// A missing file is not an error: defaults are returned and a warning is
/// logged. An unreadable or malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found: {} (using defaults)",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub port: u16,
    pub log_level: String,
    pub spotify: SpotifyCredentials,
    pub snapshot_interval_secs: Option<u64>,
    pub refresh_before_snapshot: bool,
}

/// Values supplied on the command line or via environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub snapshot_interval_secs: Option<u64>,
}

impl ServiceConfig {
    /// Merge overrides, TOML values and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let spotify = resolve_spotify_credentials(
            overrides.spotify_client_id.as_deref(),
            overrides.spotify_client_secret.as_deref(),
            &toml_config,
        )?;

        let snapshot_interval_secs = overrides
            .snapshot_interval_secs
            .or(toml_config.scheduler.snapshot_interval_secs)
            .filter(|secs| *secs > 0);

        Ok(Self {
            database_path: overrides
                .database_path
                .or(toml_config.database_path)
                .unwrap_or_else(default_database_path),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            log_level: overrides
                .log_level
                .unwrap_or(toml_config.logging.level),
            spotify,
            snapshot_interval_secs,
            refresh_before_snapshot: toml_config.scheduler.refresh_before_snapshot,
        })
    }
}
