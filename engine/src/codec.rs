//! Wire codec for room traffic.
//!
//! Every frame is a single flat JSON object. Outbound actions carry an
//! `action` key plus `seekTime` (and `message` for chat); the relay adds a
//! `user` key before fanning them out. The join handshake is the only frame
//! without an `action`.
//!
//! ```text
//! {"room": "movie-night", "user": "alice"}
//! {"action": "play", "seekTime": "0.25"}
//! {"action": "play", "seekTime": "0.25", "user": "alice"}   // as relayed
//! ```

use crate::error::{DecodeError, Result};
use crate::{ActionKind, JoinEnvelope, OutboundAction, SeekTime, SyncEvent};
use serde_json::{json, Map, Value};

/// Encode the join handshake.
pub fn encode_join(join: &JoinEnvelope) -> String {
    json!({
        "room": join.room,
        "user": join.user,
    })
    .to_string()
}

/// Encode an action as this client sends it (no `user` field).
pub fn encode_action(action: &OutboundAction) -> String {
    let mut fields = Map::new();
    fields.insert("action".into(), action.kind().as_str().into());
    fields.insert("seekTime".into(), action.seek_time().as_str().into());
    if let OutboundAction::Chat { message, .. } = action {
        fields.insert("message".into(), message.as_str().into());
    }
    Value::Object(fields).to_string()
}

/// Encode an event in its relayed form, `user` included.
pub fn encode_event(event: &SyncEvent) -> String {
    let mut fields = Map::new();
    fields.insert("action".into(), event.kind().as_str().into());
    fields.insert("user".into(), event.user().into());
    fields.insert("seekTime".into(), event.seek_time().as_str().into());
    if let Some(message) = event.message() {
        fields.insert("message".into(), message.into());
    }
    Value::Object(fields).to_string()
}

/// Decode a relayed frame.
///
/// Returns `Ok(None)` for an empty or whitespace-only payload, which relays
/// use as a keep-alive.
pub fn decode(payload: &str) -> Result<Option<SyncEvent>> {
    if payload.trim().is_empty() {
        return Ok(None);
    }

    let fields = parse_object(payload)?;

    let kind: ActionKind = required_str(&fields, "action")?.parse()?;
    let user = required_str(&fields, "user")?.to_string();
    let seek_time = seek_time_field(&fields)?;

    let event = match kind {
        ActionKind::SeekTo => SyncEvent::SeekTo { user, seek_time },
        ActionKind::Pause => SyncEvent::Pause { user, seek_time },
        ActionKind::Play => SyncEvent::Play { user, seek_time },
        ActionKind::Chat => SyncEvent::Chat {
            user,
            seek_time,
            message: required_str(&fields, "message")?.to_string(),
        },
    };

    Ok(Some(event))
}

/// Decode a join handshake, as the relay receives it.
pub fn decode_join(payload: &str) -> Result<JoinEnvelope> {
    let fields = parse_object(payload)?;
    Ok(JoinEnvelope {
        room: required_str(&fields, "room")?.to_string(),
        user: required_str(&fields, "user")?.to_string(),
    })
}

/// Parse a payload into a JSON object.
pub fn parse_object(payload: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(DecodeError::Malformed(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(DecodeError::Malformed(e.to_string())),
    }
}

fn required_str<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a str> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(name)),
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(DecodeError::Malformed(format!(
            "field `{name}` must be a string, got {}",
            json_type(other)
        ))),
    }
}

/// `seekTime` is a string on the wire, but a bare number is tolerated.
fn seek_time_field(fields: &Map<String, Value>) -> Result<SeekTime> {
    let seek_time = match fields.get("seekTime") {
        None | Some(Value::Null) => return Err(DecodeError::MissingField("seekTime")),
        Some(Value::String(raw)) => SeekTime::new(raw.as_str()),
        Some(Value::Number(raw)) => SeekTime::new(raw.to_string()),
        Some(other) => {
            return Err(DecodeError::Malformed(format!(
                "field `seekTime` must be a string, got {}",
                json_type(other)
            )))
        }
    };
    seek_time.fraction()?;
    Ok(seek_time)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
