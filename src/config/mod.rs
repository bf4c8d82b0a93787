//! Configuration management for database and application settings.

/// Database connection and schema bootstrap
pub mod database;

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Default config file looked up next to the working directory.
const CONFIG_FILE: &str = "config.toml";

/// Application configuration, loaded from `config.toml` with environment
/// overrides (`DATABASE_URL`, `MEDIA_ROOT`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SeaORM connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Root directory of the receipt blob store
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            media_root: default_media_root(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://data/finboard.sqlite?mode=rwc".to_string()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("data/media")
}

/// Loads the application configuration: `config.toml` when present, defaults
/// otherwise, then environment overrides on top.
pub fn load_app_configuration() -> Result<AppConfig> {
    let mut config = match std::fs::read_to_string(CONFIG_FILE) {
        Ok(contents) => toml::from_str(&contents).map_err(|error| Error::Config {
            message: format!("failed to parse {CONFIG_FILE}: {error}"),
        })?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!("no {CONFIG_FILE} found, using defaults");
            AppConfig::default()
        }
        Err(error) => {
            return Err(Error::Config {
                message: format!("failed to read {CONFIG_FILE}: {error}"),
            });
        }
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }
    if let Ok(root) = std::env::var("MEDIA_ROOT") {
        config.media_root = PathBuf::from(root);
    }

    Ok(config)
}
