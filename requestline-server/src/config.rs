//! requestline-server configuration
//!
//! Command-line arguments and environment variables (via clap) take
//! precedence over the TOML config file, which takes precedence over
//! compiled defaults.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use requestline_common::config::{load_toml_config, mask_secret, resolve, TomlConfig};
use requestline_common::models::DEFAULT_MAX_MESSAGE_LENGTH;
use requestline_common::{Error, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PROCESS_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_CATALOG_REFRESH_SECS: u64 = 300;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for requestline-server
#[derive(Parser, Debug, Default)]
#[command(name = "requestline-server")]
#[command(about = "Listener song requests for PlayIt Live")]
#[command(version)]
pub struct Args {
    /// PlayIt Live base URL
    #[arg(long, env = "PLAYIT_LIVE_BASE_URL")]
    pub playit_live_base_url: Option<String>,

    /// PlayIt Live API key
    #[arg(long, env = "PLAYIT_LIVE_API_KEY", hide_env_values = true)]
    pub playit_live_api_key: Option<String>,

    /// Track group listeners may request from (case-insensitive name)
    #[arg(long, env = "REQUESTABLE_TRACK_GROUP_NAME")]
    pub requestable_track_group: Option<String>,

    /// Maximum listener message length in characters
    #[arg(long, env = "MAX_MESSAGE_LENGTH")]
    pub max_message_length: Option<usize>,

    /// Seconds between request processing cycles
    #[arg(long, env = "PROCESS_INTERVAL_SECS")]
    pub process_interval_secs: Option<u64>,

    /// Seconds between track catalog refreshes
    #[arg(long, env = "CATALOG_REFRESH_SECS")]
    pub catalog_refresh_secs: Option<u64>,

    /// Per-request timeout for PlayIt Live calls, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Admin login password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Secret used to sign admin tokens (defaults to the API key)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding the built web UI
    #[arg(long, env = "REQUESTLINE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "REQUESTLINE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub playit_live_base_url: String,
    pub playit_live_api_key: String,
    pub requestable_track_group: Option<String>,
    pub max_message_length: usize,
    pub process_interval: Duration,
    pub catalog_refresh_interval: Duration,
    pub upstream_timeout: Duration,
    pub admin_password: Option<String>,
    pub token_secret: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load the config file named by `args` (or the platform default) and resolve
    pub fn load(args: Args) -> Result<Self> {
        let file = load_toml_config(args.config.as_deref())?;
        Self::resolve(args, file)
    }

    /// Fold arguments over the file layer and validate
    ///
    /// # Errors
    /// `Error::Config` when the upstream URL or key is missing, or an
    /// interval is zero.
    pub fn resolve(args: Args, file: TomlConfig) -> Result<Self> {
        let playit_live_base_url = args
            .playit_live_base_url
            .or(file.playit_live_base_url)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("PLAYIT_LIVE_BASE_URL is required but not set".to_string()))?;

        let playit_live_api_key = args
            .playit_live_api_key
            .or(file.playit_live_api_key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("PLAYIT_LIVE_API_KEY is required but not set".to_string()))?;

        let token_secret = args
            .token_secret
            .or(file.token_secret)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| playit_live_api_key.clone());

        let process_interval = positive_secs(
            "process interval",
            resolve(args.process_interval_secs, file.process_interval_secs, DEFAULT_PROCESS_INTERVAL_SECS),
        )?;
        let catalog_refresh_interval = positive_secs(
            "catalog refresh interval",
            resolve(args.catalog_refresh_secs, file.catalog_refresh_secs, DEFAULT_CATALOG_REFRESH_SECS),
        )?;
        let upstream_timeout = positive_secs(
            "upstream timeout",
            resolve(args.upstream_timeout_secs, file.upstream_timeout_secs, DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )?;

        Ok(Self {
            playit_live_base_url,
            playit_live_api_key,
            requestable_track_group: args
                .requestable_track_group
                .or(file.requestable_track_group)
                .filter(|v| !v.trim().is_empty()),
            max_message_length: resolve(
                args.max_message_length,
                file.max_message_length,
                DEFAULT_MAX_MESSAGE_LENGTH,
            ),
            process_interval,
            catalog_refresh_interval,
            upstream_timeout,
            admin_password: args
                .admin_password
                .or(file.admin_password)
                .filter(|v| !v.is_empty()),
            token_secret,
            port: resolve(args.port, file.port, DEFAULT_PORT),
            static_dir: args.static_dir.or(file.static_dir),
        })
    }

    /// Log the resolved configuration with secrets masked
    pub fn log_summary(&self) {
        info!("PLAYIT_LIVE_BASE_URL: {}", self.playit_live_base_url);
        info!("PLAYIT_LIVE_API_KEY: {}", mask_secret(&self.playit_live_api_key));
        info!(
            "REQUESTABLE_TRACK_GROUP_NAME: {}",
            self.requestable_track_group.as_deref().unwrap_or("<not set>")
        );
        info!("Max message length: {}", self.max_message_length);
        info!(
            "Process every {:?}, refresh catalog every {:?}, upstream timeout {:?}",
            self.process_interval, self.catalog_refresh_interval, self.upstream_timeout
        );
        if self.admin_password.is_none() {
            info!("ADMIN_PASSWORD not set: admin login disabled");
        }
    }
}

fn positive_secs(name: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Config(format!("{} must be at least 1 second", name)));
    }
    Ok(Duration::from_secs(secs))
}
