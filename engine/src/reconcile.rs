//! Reconciliation between a local player and its room.
//!
//! The host owns a [`Player`] and, while in a room, an [`Outbound`] sink. The
//! [`Reconciler`] keeps the two apart in one direction only:
//!
//! - Local user actions are sent to the room first, then applied to the
//!   player, using the player's position at the moment of the action.
//! - Remote events are applied to the player and never sent anywhere. If they
//!   were, every relayed action would echo around the room forever.
//! - Position ticks from the player are UI refreshes. They never send.
//!
//! Chat order is receive order. The protocol carries no sequence numbers.

use crate::error::{DecodeError, PlayerError};
use crate::timecode::{elapsed, format_elapsed, format_timecode};
use crate::{ActionKind, OutboundAction, SeekTime, SyncEvent};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The media playback capability the host provides.
pub trait Player {
    /// Current position as a fraction of [`length`](Player::length).
    fn position(&self) -> f64;

    fn set_position(&mut self, fraction: f64);

    /// Total media length. Zero when nothing is loaded or the length is not
    /// yet known.
    fn length(&self) -> Duration;

    fn is_playing(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn load_media(&mut self, path: &Path) -> Result<(), PlayerError>;
}

/// Where local actions go once they leave the host.
pub trait Outbound {
    fn send(&self, action: OutboundAction);
}

impl<O: Outbound + ?Sized> Outbound for &O {
    fn send(&self, action: OutboundAction) {
        (**self).send(action)
    }
}

impl<O: Outbound + ?Sized> Outbound for Arc<O> {
    fn send(&self, action: OutboundAction) {
        (**self).send(action)
    }
}

/// Host behaviour toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOptions {
    /// Pause local playback when a chat message arrives.
    pub pause_on_chat: bool,
}

/// One line of chat as the host displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub user: String,
    /// Sender's position, formatted against the local media length.
    pub timecode: String,
    pub message: String,
}

impl ChatLine {
    /// Name shown for lines this host sent.
    pub const LOCAL_USER: &'static str = "You";

    pub fn local(timecode: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user: Self::LOCAL_USER.to_string(),
            timecode: timecode.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.user, self.timecode, self.message)
    }
}

/// What applying a remote event did, for the host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteApplied {
    /// Playback moved or changed state. `notice` is a one-line banner.
    Playback { kind: ActionKind, notice: String },
    /// A chat message to append to the log. `paused` is set when the message
    /// paused local playback.
    Chat { line: ChatLine, paused: bool },
}

/// Position data for refreshing a seek bar and clock labels.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub fraction: f64,
    pub elapsed: String,
    pub total: String,
}

/// Applies the reconciliation rules to a player and an optional room.
#[derive(Debug)]
pub struct Reconciler<P, O> {
    player: P,
    room: Option<O>,
    options: ReconcileOptions,
}

impl<P: Player, O: Outbound> Reconciler<P, O> {
    /// A reconciler that is not in a room yet.
    pub fn new(player: P, options: ReconcileOptions) -> Self {
        Self {
            player,
            room: None,
            options,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ReconcileOptions) {
        self.options = options;
    }

    pub fn in_room(&self) -> bool {
        self.room.is_some()
    }

    /// Start sending local actions to `room`.
    pub fn join(&mut self, room: O) {
        self.room = Some(room);
    }

    /// Stop sending local actions. Returns the previous sink.
    pub fn leave(&mut self) -> Option<O> {
        self.room.take()
    }

    fn send(&self, action: OutboundAction) {
        if let Some(room) = &self.room {
            room.send(action);
        }
    }

    fn current_seek_time(&self) -> SeekTime {
        SeekTime::from_fraction(self.player.position())
    }

    fn format_fraction(&self, fraction: f64) -> String {
        format_elapsed(fraction, self.player.length())
    }

    // ---- local actions ------------------------------------------------

    pub fn play(&mut self) {
        self.send(OutboundAction::play(self.current_seek_time()));
        self.player.play();
    }

    pub fn pause(&mut self) {
        self.send(OutboundAction::pause(self.current_seek_time()));
        self.player.pause();
    }

    /// Play when paused or stopped, pause when playing.
    pub fn toggle(&mut self) {
        if self.player.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop playback. The room sees a pause at the start of the media.
    pub fn stop(&mut self) {
        self.send(OutboundAction::pause(SeekTime::zero()));
        self.player.stop();
    }

    /// Move the play-head to `fraction`, clamped into `[0, 1]`.
    pub fn seek_to(&mut self, fraction: f64) {
        let target = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            self.player.position()
        };
        self.send(OutboundAction::seek_to(target));
        self.player.set_position(target);
    }

    /// Move the play-head by `seconds` (negative to go back).
    ///
    /// Does nothing while the media length is unknown.
    pub fn seek_by(&mut self, seconds: f64) {
        let length = self.player.length().as_secs_f64();
        if length <= 0.0 {
            return;
        }
        let current = self.player.position() * length;
        self.seek_to((current + seconds) / length);
    }

    /// Send a chat message stamped with the current position. Returns the
    /// line to show in the local chat log.
    pub fn chat(&mut self, message: impl Into<String>) -> ChatLine {
        let message = message.into();
        let position = self.player.position();
        self.send(OutboundAction::chat(
            SeekTime::from_fraction(position),
            message.clone(),
        ));
        ChatLine::local(self.format_fraction(position), message)
    }

    /// Load new media, stopping whatever is playing. With `autoplay` the room
    /// is told playback started.
    pub fn load_media(&mut self, path: &Path, autoplay: bool) -> Result<(), PlayerError> {
        self.player.stop();
        self.player.load_media(path)?;
        if autoplay {
            self.play();
        }
        Ok(())
    }

    // ---- remote events ------------------------------------------------

    /// Apply an event relayed from another member.
    ///
    /// This never sends. The position is clamped into `[0, 1]`.
    pub fn apply_remote(&mut self, event: &SyncEvent) -> Result<RemoteApplied, DecodeError> {
        let fraction = event.seek_time().clamped()?;
        let timecode = self.format_fraction(fraction);
        let user = event.user();

        let applied = match event {
            SyncEvent::SeekTo { .. } => {
                self.player.set_position(fraction);
                RemoteApplied::Playback {
                    kind: ActionKind::SeekTo,
                    notice: format!("{user} seeked the video to {timecode}"),
                }
            }
            SyncEvent::Pause { .. } => {
                self.player.pause();
                self.player.set_position(fraction);
                RemoteApplied::Playback {
                    kind: ActionKind::Pause,
                    notice: format!("{user} paused the video at {timecode}"),
                }
            }
            SyncEvent::Play { .. } => {
                self.player.set_position(fraction);
                self.player.play();
                RemoteApplied::Playback {
                    kind: ActionKind::Play,
                    notice: format!("{user} played the video from {timecode}"),
                }
            }
            SyncEvent::Chat { message, .. } => {
                let paused = self.options.pause_on_chat && self.player.is_playing();
                if paused {
                    self.player.pause();
                }
                RemoteApplied::Chat {
                    line: ChatLine {
                        user: user.to_string(),
                        timecode,
                        message: message.clone(),
                    },
                    paused,
                }
            }
        };

        Ok(applied)
    }

    // ---- player notifications ------------------------------------------

    /// Handle the player's own position tick. UI data only.
    pub fn position_changed(&self) -> PositionUpdate {
        let fraction = self.player.position();
        let length = self.player.length();
        PositionUpdate {
            fraction,
            elapsed: format_timecode(elapsed(fraction, length), length),
            total: format_timecode(length, length),
        }
    }
}
