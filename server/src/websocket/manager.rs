//! Room membership.
//!
//! Tracks joined connections and fans frames out to the other members of a
//! room.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

/// Sender for relayed frames.
pub type MessageSender = mpsc::UnboundedSender<String>;

/// A single joined connection.
#[derive(Debug)]
struct Member {
    room: String,
    user: String,
    joined_at: DateTime<Utc>,
    sender: MessageSender,
}

/// Public view of a room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub user: String,
    pub joined_at: DateTime<Utc>,
}

/// Manages joined connections, grouped by room.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct RoomManager {
    /// All joined connections, keyed by connection ID.
    members: DashMap<String, Member>,
    /// Connection IDs per room, in join order.
    by_room: DashMap<String, Vec<String>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a connection to a room.
    ///
    /// Returns the connection ID. The same user name may join a room more
    /// than once; each connection is a separate member.
    pub fn register(&self, room: String, user: String, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        self.members.insert(
            conn_id.clone(),
            Member {
                room: room.clone(),
                user: user.clone(),
                joined_at: Utc::now(),
                sender,
            },
        );

        self.by_room
            .entry(room.clone())
            .or_default()
            .push(conn_id.clone());

        tracing::info!(conn_id = %conn_id, room = %room, user = %user, "Member joined room");

        conn_id
    }

    /// Remove a connection. Empty rooms are dropped.
    pub fn unregister(&self, conn_id: &str) {
        if let Some((_, member)) = self.members.remove(conn_id) {
            if let Some(mut conn_ids) = self.by_room.get_mut(&member.room) {
                conn_ids.retain(|id| id != conn_id);
                if conn_ids.is_empty() {
                    drop(conn_ids);
                    self.by_room.remove_if(&member.room, |_, ids| ids.is_empty());
                }
            }

            tracing::info!(
                conn_id = %conn_id,
                room = %member.room,
                user = %member.user,
                "Member left room"
            );
        }
    }

    /// Send a frame to every member of the sender's room except the sender.
    ///
    /// Returns the number of members that received it.
    pub fn broadcast_except(&self, sender_conn_id: &str, frame: &str) -> usize {
        let Some(room) = self
            .members
            .get(sender_conn_id)
            .map(|member| member.room.clone())
        else {
            return 0;
        };

        let recipients: Vec<MessageSender> = match self.by_room.get(&room) {
            Some(conn_ids) => conn_ids
                .iter()
                .filter(|id| id.as_str() != sender_conn_id)
                .filter_map(|id| self.members.get(id).map(|member| member.sender.clone()))
                .collect(),
            None => Vec::new(),
        };

        let sent_count = recipients
            .iter()
            .filter(|sender| sender.send(frame.to_string()).is_ok())
            .count();

        tracing::debug!(
            sender = %sender_conn_id,
            room = %room,
            recipients = sent_count,
            "Relayed frame to room"
        );

        sent_count
    }

    /// Members of a room, in join order.
    pub fn members(&self, room: &str) -> Vec<MemberInfo> {
        let Some(conn_ids) = self.by_room.get(room) else {
            return Vec::new();
        };
        conn_ids
            .iter()
            .filter_map(|id| {
                self.members.get(id).map(|member| MemberInfo {
                    user: member.user.clone(),
                    joined_at: member.joined_at,
                })
            })
            .collect()
    }

    /// Number of joined connections across all rooms.
    pub fn connection_count(&self) -> usize {
        self.members.len()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.by_room.len()
    }
}
