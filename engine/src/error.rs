//! Error types for the reelsync engine.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons an inbound payload could not be turned into a [`SyncEvent`].
///
/// [`SyncEvent`]: crate::SyncEvent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("seekTime is not a number: {0:?}")]
    InvalidSeekTime(String),
}

/// Room identity validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("room identity field is empty: {0}")]
    EmptyField(&'static str),
}

/// Errors raised by a [`Player`](crate::Player) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("media not found: {}", .0.display())]
    MediaNotFound(PathBuf),

    #[error("media could not be loaded: {0}")]
    LoadFailed(String),
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
