//! The sync client: the public surface a host talks to.

use std::sync::Arc;

use reelsync_engine::{codec, ConnectionStatus, Outbound, OutboundAction, RoomIdentity, SeekTime};
use tokio::sync::mpsc;

use crate::connection::ConnectionManager;
use crate::dispatcher::{EventDispatcher, RoomEvent};

/// A member of one room.
///
/// Built from an explicit [`RoomIdentity`]; nothing is read from the
/// environment. Each client owns its own connection and its own subscriber
/// registry.
///
/// ```no_run
/// # async fn demo() {
/// use reelsync_client::SyncClient;
/// use reelsync_engine::RoomIdentity;
///
/// let identity = RoomIdentity::new("ws://localhost:3000/ws", "movie-night", "alice");
/// let client = SyncClient::new(identity);
/// let mut events = client.channel();
/// if client.connect() {
///     while let Some(event) = events.recv().await {
///         println!("{event:?}");
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct SyncClient {
    dispatcher: Arc<EventDispatcher>,
    connection: ConnectionManager,
}

impl SyncClient {
    pub fn new(identity: RoomIdentity) -> Self {
        let dispatcher = Arc::new(EventDispatcher::new());
        let connection = ConnectionManager::new(identity, Arc::clone(&dispatcher));
        Self {
            dispatcher,
            connection,
        }
    }

    pub fn identity(&self) -> &RoomIdentity {
        self.connection.identity()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// The typed notifications: connection changes, seek, pause, play and
    /// chat.
    pub fn events(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Shorthand for `events().channel()`.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<RoomEvent> {
        self.dispatcher.channel()
    }

    /// Start joining the room. See [`ConnectionManager::connect`].
    pub fn connect(&self) -> bool {
        self.connection.connect()
    }

    /// Encode and send an action. Returns whether it was handed to the
    /// connection; while not connected it is dropped.
    pub fn send_action(&self, action: &OutboundAction) -> bool {
        self.connection.send(codec::encode_action(action))
    }

    pub fn send_seek_to(&self, seek_time: impl Into<SeekTime>) -> bool {
        self.send_action(&OutboundAction::seek_to(seek_time))
    }

    pub fn send_pause(&self, seek_time: impl Into<SeekTime>) -> bool {
        self.send_action(&OutboundAction::pause(seek_time))
    }

    pub fn send_play(&self, seek_time: impl Into<SeekTime>) -> bool {
        self.send_action(&OutboundAction::play(seek_time))
    }

    /// Send a chat message. Empty messages are sent as-is.
    pub fn send_chat_message(
        &self,
        seek_time: impl Into<SeekTime>,
        message: impl Into<String>,
    ) -> bool {
        self.send_action(&OutboundAction::chat(seek_time, message))
    }

    /// Leave the room and release every subscription.
    pub fn close(&self) {
        self.connection.close();
    }

    /// Leave the room and wait until the final notification has fired.
    pub async fn close_and_wait(&self) {
        self.connection.close_and_wait().await;
    }
}

impl Outbound for SyncClient {
    fn send(&self, action: OutboundAction) {
        self.send_action(&action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_identity_never_connects() {
        let client = SyncClient::new(RoomIdentity::new("ws://localhost:3000/ws", "", "alice"));
        assert!(!client.connect());
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn sends_are_dropped_before_connect() {
        let client = SyncClient::new(RoomIdentity::new("ws://localhost:3000/ws", "room", "alice"));
        assert!(!client.send_play(0.5));
        assert!(!client.send_chat_message("0.5", "hello"));
        Outbound::send(&client, OutboundAction::pause("0"));
    }

    #[test]
    fn close_is_safe_without_connect() {
        let client = SyncClient::new(RoomIdentity::new("ws://localhost:3000/ws", "room", "alice"));
        let mut rx = client.channel();
        client.close();
        client.close();
        assert!(rx.try_recv().is_err());
        assert_eq!(client.events().subscriber_count(), 0);
    }
}
