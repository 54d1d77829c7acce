//! Configuration error types

use drain_protocol::RangeError;
use thiserror::Error;

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while validating startup flags
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required flags were not provided
    #[error("config validation failed: missing required flags: {}", .0.join(", "))]
    MissingFlags(Vec<String>),

    /// The adapter IP list was empty
    #[error("no adapter addresses provided")]
    NoAdapterAddrs,

    /// An adapter IP failed to parse
    #[error("invalid adapter IP: {ip}")]
    InvalidAdapterIp {
        /// The offending entry
        ip: String,
    },

    /// The blacklist ranges failed to parse
    #[error("failed to parse blacklist ranges: {0}")]
    Blacklist(#[from] RangeError),
}
