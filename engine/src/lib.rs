//! # reelsync engine
//!
//! Protocol and playback rules for keeping several media players in lockstep.
//!
//! Members of a room send each other four actions: seek, pause, play and
//! chat. Each carries the sender's play-head position as a fraction of the
//! media length. This crate defines those events, their JSON wire form, and
//! the rules a host follows when it applies them to its own player.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine knows nothing about sockets, files or threads
//! - **Closed action set**: unknown actions are rejected once, at decode time
//! - **No echo**: applying a remote event can never produce an outbound send
//!
//! ## Core Concepts
//!
//! ### Events
//!
//! - [`OutboundAction`] - what this client sends (no sender name)
//! - [`SyncEvent`] - what arrives from the relay, attributed to a user
//! - [`SeekTime`] - the position, kept as the exact decimal text sent
//!
//! ### Codec
//!
//! The [`codec`] module encodes actions and the join handshake and decodes
//! relayed frames. An empty frame is a keep-alive and decodes to `None`.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] drives a [`Player`] from local actions and remote
//! events, sending to an [`Outbound`] sink for local actions only.
//!
//! ## Quick Start
//!
//! ```rust
//! use reelsync_engine::{codec, OutboundAction, SeekTime, SyncEvent};
//!
//! let wire = codec::encode_action(&OutboundAction::play("0.25"));
//! assert!(wire.contains(r#""action":"play""#));
//!
//! let relayed = r#"{"action":"play","seekTime":"0.25","user":"alice"}"#;
//! let event = codec::decode(relayed).unwrap().unwrap();
//! assert_eq!(
//!     event,
//!     SyncEvent::Play { user: "alice".into(), seek_time: SeekTime::new("0.25") }
//! );
//! ```

pub mod codec;
pub mod error;
pub mod event;
pub mod identity;
pub mod reconcile;
pub mod timecode;

// Re-export main types at crate root
pub use error::{DecodeError, IdentityError, PlayerError};
pub use event::{ActionKind, ConnectionStatus, OutboundAction, SeekTime, SyncEvent};
pub use identity::{JoinEnvelope, RoomIdentity};
pub use reconcile::{
    ChatLine, Outbound, Player, PositionUpdate, ReconcileOptions, Reconciler, RemoteApplied,
};

/// Display name a member joined with.
pub type UserName = String;
