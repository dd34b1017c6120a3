//! Room events and the values they carry.
//!
//! Action kinds are validated once, at decode time, into [`ActionKind`]. Nothing
//! downstream of the codec ever has to handle an unknown action string.

use crate::error::{DecodeError, Result};
use crate::UserName;
use std::fmt;
use std::str::FromStr;

/// A play-head position as carried on the wire.
///
/// The wire form is a decimal string holding a fraction of the total media
/// length. The raw text is kept verbatim so that a relayed value reaches the
/// host exactly as the sender wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeekTime(String);

impl SeekTime {
    /// Wrap a raw wire value without validating it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Position at the very start of the media.
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Build a seek time from a fractional position.
    pub fn from_fraction(fraction: f64) -> Self {
        Self(fraction.to_string())
    }

    /// The raw wire text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the fractional position.
    ///
    /// Values outside `[0, 1]` parse successfully; only text that is not a
    /// finite number is rejected.
    pub fn fraction(&self) -> Result<f64> {
        match self.0.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(DecodeError::InvalidSeekTime(self.0.clone())),
        }
    }

    /// Parse the fractional position and clamp it into `[0, 1]`.
    pub fn clamped(&self) -> Result<f64> {
        self.fraction().map(|value| value.clamp(0.0, 1.0))
    }
}

impl fmt::Display for SeekTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeekTime {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SeekTime {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<f64> for SeekTime {
    fn from(fraction: f64) -> Self {
        Self::from_fraction(fraction)
    }
}

/// The four actions a room understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SeekTo,
    Pause,
    Play,
    Chat,
}

impl ActionKind {
    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::SeekTo => "seekTo",
            ActionKind::Pause => "pause",
            ActionKind::Play => "play",
            ActionKind::Chat => "chat",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "seekTo" => Ok(ActionKind::SeekTo),
            "pause" => Ok(ActionKind::Pause),
            "play" => Ok(ActionKind::Play),
            "chat" => Ok(ActionKind::Chat),
            other => Err(DecodeError::UnknownAction(other.to_string())),
        }
    }
}

/// An event relayed from another member of the room.
///
/// `user` is the display name the sender joined with. It is not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The sender moved the play-head without playing.
    SeekTo { user: UserName, seek_time: SeekTime },
    /// The sender paused at a position.
    Pause { user: UserName, seek_time: SeekTime },
    /// The sender started or resumed playback from a position.
    Play { user: UserName, seek_time: SeekTime },
    /// The sender posted a chat message, stamped with their position.
    Chat {
        user: UserName,
        seek_time: SeekTime,
        message: String,
    },
}

impl SyncEvent {
    pub fn kind(&self) -> ActionKind {
        match self {
            SyncEvent::SeekTo { .. } => ActionKind::SeekTo,
            SyncEvent::Pause { .. } => ActionKind::Pause,
            SyncEvent::Play { .. } => ActionKind::Play,
            SyncEvent::Chat { .. } => ActionKind::Chat,
        }
    }

    pub fn user(&self) -> &str {
        match self {
            SyncEvent::SeekTo { user, .. }
            | SyncEvent::Pause { user, .. }
            | SyncEvent::Play { user, .. }
            | SyncEvent::Chat { user, .. } => user,
        }
    }

    pub fn seek_time(&self) -> &SeekTime {
        match self {
            SyncEvent::SeekTo { seek_time, .. }
            | SyncEvent::Pause { seek_time, .. }
            | SyncEvent::Play { seek_time, .. }
            | SyncEvent::Chat { seek_time, .. } => seek_time,
        }
    }

    /// Chat text, for chat events.
    pub fn message(&self) -> Option<&str> {
        match self {
            SyncEvent::Chat { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// An action this client sends to its room.
///
/// The relay stamps the sender's name onto it before fanning it out, turning
/// it into a [`SyncEvent`] on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    SeekTo { seek_time: SeekTime },
    Pause { seek_time: SeekTime },
    Play { seek_time: SeekTime },
    Chat { seek_time: SeekTime, message: String },
}

impl OutboundAction {
    pub fn seek_to(seek_time: impl Into<SeekTime>) -> Self {
        OutboundAction::SeekTo {
            seek_time: seek_time.into(),
        }
    }

    pub fn pause(seek_time: impl Into<SeekTime>) -> Self {
        OutboundAction::Pause {
            seek_time: seek_time.into(),
        }
    }

    pub fn play(seek_time: impl Into<SeekTime>) -> Self {
        OutboundAction::Play {
            seek_time: seek_time.into(),
        }
    }

    pub fn chat(seek_time: impl Into<SeekTime>, message: impl Into<String>) -> Self {
        OutboundAction::Chat {
            seek_time: seek_time.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            OutboundAction::SeekTo { .. } => ActionKind::SeekTo,
            OutboundAction::Pause { .. } => ActionKind::Pause,
            OutboundAction::Play { .. } => ActionKind::Play,
            OutboundAction::Chat { .. } => ActionKind::Chat,
        }
    }

    pub fn seek_time(&self) -> &SeekTime {
        match self {
            OutboundAction::SeekTo { seek_time }
            | OutboundAction::Pause { seek_time }
            | OutboundAction::Play { seek_time }
            | OutboundAction::Chat { seek_time, .. } => seek_time,
        }
    }

    /// The event other room members observe once the relay attributes this
    /// action to `user`.
    pub fn attributed_to(self, user: impl Into<UserName>) -> SyncEvent {
        let user = user.into();
        match self {
            OutboundAction::SeekTo { seek_time } => SyncEvent::SeekTo { user, seek_time },
            OutboundAction::Pause { seek_time } => SyncEvent::Pause { user, seek_time },
            OutboundAction::Play { seek_time } => SyncEvent::Play { user, seek_time },
            OutboundAction::Chat { seek_time, message } => SyncEvent::Chat {
                user,
                seek_time,
                message,
            },
        }
    }
}

/// State of the single connection a client owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
        };
        f.write_str(label)
    }
}
