//! Configuration file loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Steps 1 and 2 belong to each service's argument parser. This module
//! covers step 3 and provides [`resolve`] to fold the layers together.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Contents of `config.toml`
///
/// Every key is optional; absent keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub playit_live_base_url: Option<String>,
    pub playit_live_api_key: Option<String>,
    pub requestable_track_group: Option<String>,
    pub max_message_length: Option<usize>,
    pub process_interval_secs: Option<u64>,
    pub catalog_refresh_secs: Option<u64>,
    pub upstream_timeout_secs: Option<u64>,
    pub admin_password: Option<String>,
    pub token_secret: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

/// Platform config file location: `<config_dir>/requestline/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("requestline").join("config.toml"))
}

/// Load the TOML config layer
///
/// An explicitly named file must exist and parse. The platform default
/// file is optional: when missing it yields defaults, when malformed it
/// logs a warning and yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&content)?;
        info!("Loaded config file {}", path.display());
        return Ok(config);
    }

    let Some(path) = default_config_path() else {
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    match std::fs::read_to_string(&path)
        .map_err(Error::from)
        .and_then(|content| toml::from_str(&content).map_err(Error::from))
    {
        Ok(config) => {
            info!("Loaded config file {}", path.display());
            Ok(config)
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            Ok(TomlConfig::default())
        }
    }
}

/// Fold the CLI/env value, the config file value and a default
pub fn resolve<T>(cli_or_env: Option<T>, file: Option<T>, default: T) -> T {
    cli_or_env.or(file).unwrap_or(default)
}

/// Mask a secret for logging (`*` per character)
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}
