//! Connection manager.
//!
//! Owns the single WebSocket connection of a client. `connect()` only
//! dispatches the attempt; the outcome arrives as a status notification from
//! the connection task, which also runs every other lifecycle callback:
//!
//! 1. open: status becomes `Connected`, `Connected` is published, the join
//!    envelope is written before any other frame
//! 2. message: each text frame goes to the dispatcher in arrival order
//! 3. close (either side, or an error): status becomes `Disconnected` and
//!    `Disconnected` is published exactly once
//!
//! Sends are gated on `Connected`. A send attempted in any other state is
//! dropped, never queued for later.

use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use reelsync_engine::{codec, ConnectionStatus, RoomIdentity};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use url::Url;

use crate::dispatcher::{lock, EventDispatcher};
use crate::error::{ClientError, Result};

/// Parse and check a relay address. Only `ws` and `wss` are accepted.
pub fn parse_server_address(address: &str) -> Result<Url> {
    let url = Url::parse(address.trim()).map_err(|e| ClientError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(ClientError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ClientError::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Connection state shared between the manager and its connection task.
#[derive(Debug, Default)]
struct Link {
    status: ConnectionStatus,
    /// Bumped on every `connect()`; a task only touches state of its own
    /// generation.
    generation: u64,
    /// A connection task of the current generation has not reported
    /// `Disconnected` yet.
    active: bool,
    /// Final `Disconnected` notifications still being delivered.
    /// Subscriptions are kept until they have reached everyone.
    draining: usize,
    /// `close()` was called. Terminal.
    closed: bool,
    outbound: Option<mpsc::UnboundedSender<String>>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[derive(Debug)]
struct Shared {
    link: Mutex<Link>,
    dispatcher: Arc<EventDispatcher>,
}

impl Shared {
    /// Transport opened. Returns false if the attempt was abandoned meanwhile.
    fn mark_connected(&self, generation: u64) -> bool {
        {
            let mut link = lock(&self.link);
            if link.generation != generation
                || link.closed
                || link.status != ConnectionStatus::Connecting
            {
                return false;
            }
            link.status = ConnectionStatus::Connected;
        }
        self.dispatcher.publish_status(ConnectionStatus::Connected);
        true
    }

    /// Last step of every connection task.
    ///
    /// The manager is ready for another `connect()` before `Disconnected` is
    /// published, so a host may retry from the notification itself.
    fn finish(&self, generation: u64) {
        let changed = {
            let mut link = lock(&self.link);
            if link.generation != generation {
                return;
            }
            link.active = false;
            if link.status == ConnectionStatus::Disconnected {
                false
            } else {
                link.status = ConnectionStatus::Disconnected;
                link.outbound = None;
                link.shutdown = None;
                link.draining += 1;
                true
            }
        };

        if changed {
            tracing::info!("Room connection closed");
            self.dispatcher.publish_status(ConnectionStatus::Disconnected);
        }

        let mut link = lock(&self.link);
        if changed {
            link.draining -= 1;
        }
        if link.closed && !link.active && link.draining == 0 {
            self.dispatcher.clear();
        }
    }
}

/// Owns one connection to the relay named in a [`RoomIdentity`].
#[derive(Debug)]
pub struct ConnectionManager {
    identity: RoomIdentity,
    shared: Arc<Shared>,
    /// Connection tasks that may still be running. A retry can start while
    /// the previous task is delivering its last notification.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(identity: RoomIdentity, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            identity,
            shared: Arc::new(Shared {
                link: Mutex::new(Link::default()),
                dispatcher,
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn identity(&self) -> &RoomIdentity {
        &self.identity
    }

    pub fn status(&self) -> ConnectionStatus {
        lock(&self.shared.link).status
    }

    /// Start opening the connection.
    ///
    /// Returns `false`, without changing state, when the identity is
    /// incomplete, the address is malformed, no tokio runtime is available,
    /// a connection is already open or opening, or the manager was closed.
    /// Returns `true` once the attempt is dispatched; whether it succeeds is
    /// reported through the status notification.
    pub fn connect(&self) -> bool {
        if let Err(e) = self.identity.validate() {
            tracing::debug!(error = %e, "Not connecting");
            return false;
        }

        let url = match parse_server_address(self.identity.server()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Not connecting");
                return false;
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("Not connecting: no tokio runtime on this thread");
                return false;
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let generation = {
            let mut link = lock(&self.shared.link);
            if link.closed {
                tracing::debug!("Not connecting: client is closed");
                return false;
            }
            if link.status != ConnectionStatus::Disconnected || link.active {
                tracing::warn!(status = %link.status, "Not connecting: connection already exists");
                return false;
            }
            link.generation += 1;
            link.status = ConnectionStatus::Connecting;
            link.active = true;
            link.outbound = Some(outbound_tx);
            link.shutdown = Some(shutdown_tx);
            link.generation
        };

        tracing::info!(
            server = %url,
            room = %self.identity.room(),
            user = %self.identity.user(),
            "Connecting to room"
        );

        let join = codec::encode_join(&self.identity.join_envelope());
        let task = runtime.spawn(run_connection(
            url,
            join,
            outbound_rx,
            shutdown_rx,
            Arc::clone(&self.shared),
            generation,
        ));
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);

        true
    }

    /// Hand one encoded frame to the connection.
    ///
    /// Returns whether the frame was accepted for writing. Frames are
    /// dropped, with a debug log, unless the connection is `Connected`.
    pub fn send(&self, payload: String) -> bool {
        let link = lock(&self.shared.link);
        match (link.status, &link.outbound) {
            (ConnectionStatus::Connected, Some(tx)) => tx.send(payload).is_ok(),
            (status, _) => {
                tracing::debug!(status = %status, "Dropping outbound frame: not connected");
                false
            }
        }
    }

    /// Request shutdown. Safe to call repeatedly and before any `connect()`.
    ///
    /// Subscriptions are released once the final `Disconnected`
    /// notification has been delivered, or immediately when no connection
    /// exists.
    pub fn close(&self) {
        let mut link = lock(&self.shared.link);
        let first = !link.closed;
        link.closed = true;

        if let Some(shutdown) = link.shutdown.take() {
            tracing::debug!("Requesting room connection shutdown");
            let _ = shutdown.send(());
        }

        if first && !link.active && link.draining == 0 {
            self.shared.dispatcher.clear();
        }
    }

    /// [`close`](Self::close), then wait for every connection task to end.
    /// No notification fires after this returns.
    pub async fn close_and_wait(&self) {
        self.close();
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Connection task ended abnormally");
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// The connection task: every lifecycle callback runs here.
async fn run_connection(
    url: Url,
    join: String,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: oneshot::Receiver<()>,
    shared: Arc<Shared>,
    generation: u64,
) {
    let stream = tokio::select! {
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!(server = %url, error = %e, "Failed to open room connection");
                shared.finish(generation);
                return;
            }
        },
        _ = &mut shutdown_rx => {
            tracing::debug!(server = %url, "Connection attempt cancelled");
            shared.finish(generation);
            return;
        }
    };

    let (mut sink, mut source) = stream.split();

    if !shared.mark_connected(generation) {
        let _ = sink.close().await;
        shared.finish(generation);
        return;
    }
    tracing::info!(server = %url, "Room connection open");

    if let Err(e) = sink.send(Message::Text(join)).await {
        tracing::warn!(error = %e, "Failed to send join envelope");
        shared.finish(generation);
        return;
    }
    tracing::debug!("Sent join envelope");

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                if let Err(e) = sink.close().await {
                    tracing::debug!(error = %e, "Error while closing room connection");
                }
                break;
            }

            Some(payload) = outbound_rx.recv() => {
                if let Err(e) = sink.send(Message::Text(payload)).await {
                    tracing::warn!(error = %e, "Failed to send room frame");
                    break;
                }
            }

            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => shared.dispatcher.dispatch_payload(&text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => shared.dispatcher.dispatch_payload(&text),
                    Err(_) => tracing::warn!("Dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Relay closed the connection");
                    // Sends the queued close reply.
                    if let Err(e) = sink.close().await {
                        tracing::debug!(error = %e, "Error while answering close frame");
                    }
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite.
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Room connection error");
                    break;
                }
                None => break,
            }
        }
    }

    shared.finish(generation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ws_addresses() {
        assert!(parse_server_address("ws://localhost:3000/ws").is_ok());
        assert!(parse_server_address("wss://relay.example.com").is_ok());
        assert!(parse_server_address("  ws://127.0.0.1:9000  ").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(matches!(
            parse_server_address("not a url"),
            Err(ClientError::InvalidAddress { .. })
        ));
        assert!(matches!(
            parse_server_address("http://localhost:3000"),
            Err(ClientError::UnsupportedScheme(scheme)) if scheme == "http"
        ));
        assert!(parse_server_address("ws://").is_err());
    }

    #[test]
    fn connect_without_runtime_fails() {
        let manager = ConnectionManager::new(
            RoomIdentity::new("ws://127.0.0.1:1/ws", "room", "alice"),
            Arc::new(EventDispatcher::new()),
        );
        assert!(!manager.connect());
        assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn send_before_connect_is_dropped() {
        let manager = ConnectionManager::new(
            RoomIdentity::new("ws://127.0.0.1:1/ws", "room", "alice"),
            Arc::new(EventDispatcher::new()),
        );
        assert!(!manager.send("{}".to_string()));
    }

    #[test]
    fn close_without_connect_releases_subscriptions() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let _rx = dispatcher.channel();
        let manager = ConnectionManager::new(
            RoomIdentity::new("ws://127.0.0.1:1/ws", "room", "alice"),
            Arc::clone(&dispatcher),
        );

        manager.close();
        manager.close();
        assert_eq!(dispatcher.subscriber_count(), 0);
        assert!(!manager.connect());
    }
}
