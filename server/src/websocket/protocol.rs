//! Frame handling for the relay.
//!
//! The relay does not interpret actions. It only needs the join handshake
//! and the guarantee that a relayed frame is a JSON object carrying the
//! sender's name.

use reelsync_engine::{codec, DecodeError, JoinEnvelope};
use serde_json::Value;

/// Parse a join handshake. Blank room or user names are rejected.
pub fn parse_join(text: &str) -> Result<JoinEnvelope, DecodeError> {
    let join = codec::decode_join(text)?;
    if join.room.trim().is_empty() {
        return Err(DecodeError::MissingField("room"));
    }
    if join.user.trim().is_empty() {
        return Err(DecodeError::MissingField("user"));
    }
    Ok(join)
}

/// Stamp a client frame with the sender's name.
///
/// Any `user` the client put in the frame is overwritten. Frames that are
/// not JSON objects are rejected.
pub fn relay_frame(text: &str, user: &str) -> Result<String, DecodeError> {
    let mut fields = codec::parse_object(text)?;
    fields.insert("user".to_string(), Value::String(user.to_string()));
    Ok(Value::Object(fields).to_string())
}
