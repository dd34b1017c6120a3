//! Host configuration.
//!
//! The sync client itself never reads the environment. The terminal host
//! builds a [`HostConfig`] here and passes explicit values down.

use std::env;
use std::time::Duration;

use reelsync_engine::{ReconcileOptions, RoomIdentity};

use crate::error::Result;

/// Default length of the simulated media (90 minutes).
const DEFAULT_MEDIA_LENGTH_SECS: u64 = 5400;

/// Configuration for the terminal host, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Relay address, room and display name
    pub identity: RoomIdentity,
    /// Pause playback when a chat message arrives
    pub pause_on_chat: bool,
    /// Start playing as soon as media is opened
    pub autoplay: bool,
    /// Length of the media the simulated player pretends to play
    pub media_length: Duration,
}

impl HostConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing room fields are left empty; an incomplete identity is not an
    /// error here, it just never connects.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through `var`, which returns the value of a
    /// variable if it is set.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server = var("REELSYNC_SERVER").unwrap_or_default();
        let room = var("REELSYNC_ROOM").unwrap_or_default();
        let user = var("REELSYNC_USER").unwrap_or_default();

        let pause_on_chat = match var("REELSYNC_PAUSE_ON_CHAT") {
            Some(value) => parse_flag(&value)
                .ok_or_else(|| ConfigError::InvalidValue("REELSYNC_PAUSE_ON_CHAT", value))?,
            None => false,
        };

        let autoplay = match var("REELSYNC_AUTOPLAY") {
            Some(value) => parse_flag(&value)
                .ok_or_else(|| ConfigError::InvalidValue("REELSYNC_AUTOPLAY", value))?,
            None => true,
        };

        let media_length = match var("REELSYNC_MEDIA_LENGTH_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REELSYNC_MEDIA_LENGTH_SECS", value))?,
            None => DEFAULT_MEDIA_LENGTH_SECS,
        };

        Ok(Self {
            identity: RoomIdentity::new(server, room, user),
            pause_on_chat,
            autoplay,
            media_length: Duration::from_secs(media_length),
        })
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            pause_on_chat: self.pause_on_chat,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
}
