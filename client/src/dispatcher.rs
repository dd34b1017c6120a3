//! Typed notifications for room traffic.
//!
//! The dispatcher turns raw inbound frames into [`SyncEvent`]s and fans them
//! out to subscribers. Each notification kind keeps its own subscriber list.
//! Frames that fail to decode are logged and dropped; they never reach a
//! subscriber and never close the connection.
//!
//! Notifications are delivered on the connection task, in arrival order.
//! Hosts that own single-threaded state can take [`EventDispatcher::channel`]
//! instead and drain it from their own context.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reelsync_engine::{codec, ConnectionStatus, SeekTime, SyncEvent};
use tokio::sync::mpsc;

/// A notification handler.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identifies one subscription, for [`EventDispatcher::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Payload of the seek, pause and play notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub user: String,
    pub seek_time: SeekTime,
}

/// Payload of the chat notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatNotice {
    pub user: String,
    pub seek_time: SeekTime,
    pub message: String,
}

/// Every notification, as delivered through [`EventDispatcher::channel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    ConnectionChanged(ConnectionStatus),
    Remote(SyncEvent),
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Subscribers<T> {
    handlers: Mutex<Vec<(SubscriptionId, Handler<T>)>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Subscribers<T> {
    /// Add `handler`, or return its existing id if it is already subscribed.
    fn add(&self, next_id: &AtomicU64, handler: Handler<T>) -> SubscriptionId {
        let mut handlers = lock(&self.handlers);
        if let Some((id, _)) = handlers
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &handler))
        {
            return *id;
        }
        let id = SubscriptionId(next_id.fetch_add(1, Ordering::Relaxed));
        handlers.push((id, handler));
        id
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut handlers = lock(&self.handlers);
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    fn len(&self) -> usize {
        lock(&self.handlers).len()
    }

    fn clear(&self) {
        lock(&self.handlers).clear();
    }

    /// Call every handler outside the lock, so a handler may subscribe or
    /// unsubscribe while it runs.
    fn emit(&self, value: &T) {
        let snapshot: Vec<Handler<T>> = lock(&self.handlers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in snapshot {
            handler(value);
        }
    }
}

/// Per-client registry of room notification subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: AtomicU64,
    connection_changed: Subscribers<ConnectionStatus>,
    seek_to: Subscribers<SyncNotice>,
    pause: Subscribers<SyncNotice>,
    play: Subscribers<SyncNotice>,
    chat: Subscribers<ChatNotice>,
    taps: Mutex<Vec<mpsc::UnboundedSender<RoomEvent>>>,
    /// Held while one notification reaches every subscriber, so a connection
    /// started from a handler cannot overtake the notification that
    /// triggered it.
    delivery: Mutex<()>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_connection_changed(
        &self,
        handler: Handler<ConnectionStatus>,
    ) -> SubscriptionId {
        self.connection_changed.add(&self.next_id, handler)
    }

    pub fn subscribe_seek_to(&self, handler: Handler<SyncNotice>) -> SubscriptionId {
        self.seek_to.add(&self.next_id, handler)
    }

    pub fn subscribe_pause(&self, handler: Handler<SyncNotice>) -> SubscriptionId {
        self.pause.add(&self.next_id, handler)
    }

    pub fn subscribe_play(&self, handler: Handler<SyncNotice>) -> SubscriptionId {
        self.play.add(&self.next_id, handler)
    }

    pub fn subscribe_chat(&self, handler: Handler<ChatNotice>) -> SubscriptionId {
        self.chat.add(&self.next_id, handler)
    }

    /// Remove a subscription. Unknown or already removed ids are ignored.
    ///
    /// Returns whether a subscription was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // Ids are unique across kinds, so at most one list holds it.
        self.connection_changed.remove(id)
            || self.seek_to.remove(id)
            || self.pause.remove(id)
            || self.play.remove(id)
            || self.chat.remove(id)
    }

    /// Receive every notification, in order, through a channel.
    ///
    /// The channel closes when the dispatcher is cleared, which happens once
    /// the owning client has closed.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<RoomEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.taps).push(tx);
        rx
    }

    /// Number of handler subscriptions plus open channels.
    pub fn subscriber_count(&self) -> usize {
        self.connection_changed.len()
            + self.seek_to.len()
            + self.pause.len()
            + self.play.len()
            + self.chat.len()
            + lock(&self.taps).len()
    }

    /// Drop every subscription and close every channel.
    pub fn clear(&self) {
        self.connection_changed.clear();
        self.seek_to.clear();
        self.pause.clear();
        self.play.clear();
        self.chat.clear();
        lock(&self.taps).clear();
        tracing::debug!("Released all room subscriptions");
    }

    pub(crate) fn publish_status(&self, status: ConnectionStatus) {
        let _delivery = lock(&self.delivery);
        self.connection_changed.emit(&status);
        self.forward(RoomEvent::ConnectionChanged(status));
    }

    /// Decode one inbound frame and publish it.
    pub(crate) fn dispatch_payload(&self, payload: &str) {
        match codec::decode(payload) {
            Ok(Some(event)) => self.dispatch_event(event),
            Ok(None) => tracing::trace!("Received keep-alive frame"),
            Err(e) => tracing::warn!(error = %e, "Dropping undecodable room frame"),
        }
    }

    pub(crate) fn dispatch_event(&self, event: SyncEvent) {
        let _delivery = lock(&self.delivery);
        match &event {
            SyncEvent::SeekTo { user, seek_time } => self.seek_to.emit(&SyncNotice {
                user: user.clone(),
                seek_time: seek_time.clone(),
            }),
            SyncEvent::Pause { user, seek_time } => self.pause.emit(&SyncNotice {
                user: user.clone(),
                seek_time: seek_time.clone(),
            }),
            SyncEvent::Play { user, seek_time } => self.play.emit(&SyncNotice {
                user: user.clone(),
                seek_time: seek_time.clone(),
            }),
            SyncEvent::Chat {
                user,
                seek_time,
                message,
            } => self.chat.emit(&ChatNotice {
                user: user.clone(),
                seek_time: seek_time.clone(),
                message: message.clone(),
            }),
        }
        self.forward(RoomEvent::Remote(event));
    }

    fn forward(&self, event: RoomEvent) {
        let mut taps = lock(&self.taps);
        taps.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("connection_changed", &self.connection_changed.len())
            .field("seek_to", &self.seek_to.len())
            .field("pause", &self.pause.len())
            .field("play", &self.play.len())
            .field("chat", &self.chat.len())
            .field("channels", &lock(&self.taps).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>() -> (Handler<T>, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Handler<T> =
            Arc::new(move |value: &T| sink.lock().unwrap().push(value.clone()));
        (handler, seen)
    }

    #[test]
    fn routes_each_kind_to_its_own_list() {
        let dispatcher = EventDispatcher::new();
        let (on_play, plays) = recorder::<SyncNotice>();
        let (on_chat, chats) = recorder::<ChatNotice>();
        dispatcher.subscribe_play(on_play);
        dispatcher.subscribe_chat(on_chat);

        dispatcher.dispatch_payload(r#"{"action":"play","seekTime":"0.25","user":"alice"}"#);
        dispatcher.dispatch_payload(r#"{"action":"pause","seekTime":"0.3","user":"alice"}"#);
        dispatcher.dispatch_payload(
            r#"{"action":"chat","seekTime":"0.3","user":"bob","message":"hey"}"#,
        );

        assert_eq!(
            *plays.lock().unwrap(),
            vec![SyncNotice {
                user: "alice".into(),
                seek_time: SeekTime::new("0.25"),
            }]
        );
        assert_eq!(chats.lock().unwrap().len(), 1);
        assert_eq!(chats.lock().unwrap()[0].message, "hey");
    }

    #[test]
    fn undecodable_frames_are_dropped() {
        let dispatcher = EventDispatcher::new();
        let mut rx = dispatcher.channel();

        for payload in [
            "",
            "not json",
            "{}",
            r#"{"action":"seekTo"}"#,
            r#"{"action":"unknown","user":"a","seekTime":"0"}"#,
        ] {
            dispatcher.dispatch_payload(payload);
        }
        dispatcher.dispatch_payload(r#"{"action":"seekTo","seekTime":"0.5","user":"a"}"#);

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, RoomEvent::Remote(SyncEvent::SeekTo { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_preserves_arrival_order() {
        let dispatcher = EventDispatcher::new();
        let mut rx = dispatcher.channel();

        dispatcher.publish_status(ConnectionStatus::Connected);
        dispatcher.dispatch_payload(r#"{"action":"play","seekTime":"0.1","user":"a"}"#);
        dispatcher.dispatch_payload(r#"{"action":"play","seekTime":"0.1","user":"a"}"#);
        dispatcher.dispatch_payload(r#"{"action":"pause","seekTime":"0.2","user":"b"}"#);
        dispatcher.publish_status(ConnectionStatus::Disconnected);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }

        // Duplicate events are delivered as-is, never merged.
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], RoomEvent::ConnectionChanged(ConnectionStatus::Connected));
        assert!(matches!(&seen[1], RoomEvent::Remote(SyncEvent::Play { .. })));
        assert!(matches!(&seen[2], RoomEvent::Remote(SyncEvent::Play { .. })));
        assert!(matches!(
            &seen[3],
            RoomEvent::Remote(SyncEvent::Pause { user, .. }) if user == "b"
        ));
        assert_eq!(seen[4], RoomEvent::ConnectionChanged(ConnectionStatus::Disconnected));
    }

    #[test]
    fn subscription_is_set_membership() {
        let dispatcher = EventDispatcher::new();
        let (handler, seen) = recorder::<ConnectionStatus>();

        let first = dispatcher.subscribe_connection_changed(Arc::clone(&handler));
        let second = dispatcher.subscribe_connection_changed(Arc::clone(&handler));
        assert_eq!(first, second);
        assert_eq!(dispatcher.subscriber_count(), 1);

        dispatcher.publish_status(ConnectionStatus::Connected);
        assert_eq!(seen.lock().unwrap().len(), 1);

        assert!(dispatcher.unsubscribe(first));
        assert!(!dispatcher.unsubscribe(first));
        dispatcher.publish_status(ConnectionStatus::Disconnected);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn same_handler_on_two_kinds_gets_two_ids() {
        let dispatcher = EventDispatcher::new();
        let (handler, seen) = recorder::<SyncNotice>();

        let on_play = dispatcher.subscribe_play(Arc::clone(&handler));
        let on_pause = dispatcher.subscribe_pause(handler);
        assert_ne!(on_play, on_pause);

        dispatcher.dispatch_payload(r#"{"action":"play","seekTime":"0","user":"a"}"#);
        dispatcher.dispatch_payload(r#"{"action":"pause","seekTime":"0","user":"a"}"#);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let id_slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::default();
        let calls = Arc::new(AtomicU64::new(0));

        let handler: Handler<SyncNotice> = {
            let dispatcher = Arc::clone(&dispatcher);
            let id_slot = Arc::clone(&id_slot);
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &SyncNotice| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *id_slot.lock().unwrap() {
                    dispatcher.unsubscribe(id);
                }
            })
        };
        *id_slot.lock().unwrap() = Some(dispatcher.subscribe_seek_to(handler));

        dispatcher.dispatch_payload(r#"{"action":"seekTo","seekTime":"0","user":"a"}"#);
        dispatcher.dispatch_payload(r#"{"action":"seekTo","seekTime":"0","user":"a"}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_closes_channels() {
        let dispatcher = EventDispatcher::new();
        let (handler, _seen) = recorder::<ChatNotice>();
        dispatcher.subscribe_chat(handler);
        let mut rx = dispatcher.channel();

        dispatcher.clear();
        assert_eq!(dispatcher.subscriber_count(), 0);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
