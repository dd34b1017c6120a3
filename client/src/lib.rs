//! # reelsync client
//!
//! Keeps a media player in a reelsync room. A [`SyncClient`] owns one
//! WebSocket connection to a relay, joins a room on open, sends the local
//! user's play, pause, seek and chat actions, and republishes what other
//! members do as typed notifications.
//!
//! Notifications fire on the connection task, not on the host's thread.
//! Hosts with single-threaded player state should take
//! [`SyncClient::channel`] and apply events from their own loop, through a
//! [`Reconciler`](reelsync_engine::Reconciler) so that applying a remote
//! event never sends anything back.
//!
//! There is no reconnection, retry or redelivery: a failed or dropped
//! connection shows up as a `Disconnected` notification and the host decides
//! what to do next.

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod host;

pub use client::SyncClient;
pub use config::{ConfigError, HostConfig};
pub use connection::{parse_server_address, ConnectionManager};
pub use dispatcher::{ChatNotice, EventDispatcher, Handler, RoomEvent, SubscriptionId, SyncNotice};
pub use error::ClientError;
