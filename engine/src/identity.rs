//! Room identity: where to connect, which room, and under what name.

use crate::error::IdentityError;
use crate::UserName;

/// The `(server, room, user)` triple a client joins with.
///
/// Immutable once built. A blank field never produces an error at
/// construction; it simply makes the identity incomplete, and an incomplete
/// identity never connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    server: String,
    room: String,
    user: UserName,
}

impl RoomIdentity {
    pub fn new(
        server: impl Into<String>,
        room: impl Into<String>,
        user: impl Into<UserName>,
    ) -> Self {
        Self {
            server: server.into(),
            room: room.into(),
            user: user.into(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Check that no field is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.server.trim().is_empty() {
            return Err(IdentityError::EmptyField("server"));
        }
        if self.room.trim().is_empty() {
            return Err(IdentityError::EmptyField("room"));
        }
        if self.user.trim().is_empty() {
            return Err(IdentityError::EmptyField("user"));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// The handshake sent once the connection opens.
    pub fn join_envelope(&self) -> JoinEnvelope {
        JoinEnvelope {
            room: self.room.clone(),
            user: self.user.clone(),
        }
    }
}

/// First frame on every connection: which room to join and as whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEnvelope {
    pub room: String,
    pub user: UserName,
}
