//! Configuration loading for the Template Museum.
//!
//! Loads `museum.toml` with per-section defaults. All sections use
//! `#[serde(default)]` so a minimal or empty config file is valid. The
//! config file path can be overridden with `$MUSEUM_CONFIG_PATH`; a missing
//! file falls back to defaults so the app runs out of the box.

use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Top-level museum configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MuseumConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Filesystem paths for persistent state.
    pub paths: PathsConfig,

    /// Session lifetime settings.
    pub session: SessionConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:5000".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

/// Filesystem paths for persistent state.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// SQLite database file for the credential store.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory for rotated JSON log files.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes before an idle session expires.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_database() -> PathBuf {
    PathBuf::from("/tmp/museum.db")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("/tmp/museum-logs")
}

fn default_ttl_minutes() -> i64 {
    60
}

impl MuseumConfig {
    /// Load configuration from `$MUSEUM_CONFIG_PATH` or `./museum.toml`.
    ///
    /// A missing file yields defaults; a present but malformed file is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: MuseumConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(MuseumConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config file path.
    ///
    /// Checks `$MUSEUM_CONFIG_PATH` first, then `./museum.toml`.
    fn config_path() -> PathBuf {
        match std::env::var("MUSEUM_CONFIG_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => PathBuf::from("museum.toml"),
        }
    }
}
