//! Error types for the client crate.
//!
//! None of these reach the room notifications. `connect()` reports failure
//! as `false` and logs the reason; these types cover address parsing, host
//! configuration and chat-log export.

use crate::config::ConfigError;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("unsupported scheme {0:?}, expected ws or wss")]
    UnsupportedScheme(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
