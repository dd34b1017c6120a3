//! WebSocket rooms.
//!
//! A connection joins exactly one room with its first frame. Every later
//! frame is stamped with the sender's name and fanned out to the other
//! members of that room.

mod manager;
mod protocol;

pub use manager::{MemberInfo, MessageSender, RoomManager};
pub use protocol::{parse_join, relay_frame};
