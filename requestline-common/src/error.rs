//! Common error types for Requestline

use thiserror::Error;

/// Common result type for Requestline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Requestline services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Config file parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
