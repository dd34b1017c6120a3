//! Edge case tests for reelsync-engine
//!
//! These tests cover boundary conditions and hostile inputs on the wire.

use reelsync_engine::{
    codec, DecodeError, OutboundAction, Outbound, Player, PlayerError, ReconcileOptions,
    Reconciler, RemoteApplied, SeekTime, SyncEvent,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

fn relayed(action: OutboundAction, user: &str) -> String {
    codec::encode_event(&action.attributed_to(user))
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn malformed_payloads_never_panic() {
    let payloads = [
        "",
        "not json",
        "{}",
        r#"{"action":"seekTo"}"#,
        r#"{"action":"unknown","user":"a","seekTime":"0"}"#,
        "null",
        "42",
        r#""play""#,
        r#"{"action":null,"user":"a","seekTime":"0"}"#,
        r#"{"action":["play"],"user":"a","seekTime":"0"}"#,
        r#"{"action":"play","user":"a","seekTime":{"value":0}}"#,
        "{\"action\":\"play\"",
        "\u{feff}",
    ];

    for payload in payloads {
        match codec::decode(payload) {
            Ok(None) | Err(_) => {}
            Ok(Some(event)) => panic!("{payload:?} decoded to {event:?}"),
        }
    }
}

#[test]
fn documented_rejections() {
    assert_eq!(codec::decode(""), Ok(None));
    assert!(matches!(
        codec::decode("not json"),
        Err(DecodeError::Malformed(_))
    ));
    assert_eq!(codec::decode("{}"), Err(DecodeError::MissingField("action")));
    assert!(matches!(
        codec::decode(r#"{"action":"seekTo"}"#),
        Err(DecodeError::MissingField(_))
    ));
    assert_eq!(
        codec::decode(r#"{"action":"unknown","user":"a","seekTime":"0"}"#),
        Err(DecodeError::UnknownAction("unknown".into()))
    );
}

#[test]
fn extra_fields_are_ignored() {
    let payload = r#"{"action":"pause","seekTime":"0.4","user":"bob","room":"x","ts":17}"#;
    let event = codec::decode(payload).unwrap().unwrap();
    assert_eq!(
        event,
        SyncEvent::Pause {
            user: "bob".into(),
            seek_time: SeekTime::new("0.4"),
        }
    );
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_chat_round_trips() {
    let messages = [
        "日本語テスト",
        "Привет мир",
        "مرحبا بالعالم",
        "🎉🚀💯",
        "Ω≈ç√∫",
        "Hello\nWorld\tTab",
        "Null\0Test",
        "",
    ];

    for message in messages {
        let event = OutboundAction::chat("0.5", message).attributed_to("ユーザー");
        assert_eq!(
            codec::decode(&codec::encode_event(&event)),
            Ok(Some(event)),
            "failed for {message:?}"
        );
    }
}

#[test]
fn empty_chat_is_allowed_on_the_wire() {
    let wire = codec::encode_action(&OutboundAction::chat("0", ""));
    let value: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(value, json!({"action": "chat", "seekTime": "0", "message": ""}));
}

#[test]
fn very_long_chat_message() {
    let message = "x".repeat(1024 * 1024);
    let wire = relayed(OutboundAction::chat("0.1", message.clone()), "alice");
    let event = codec::decode(&wire).unwrap().unwrap();
    assert_eq!(event.message().map(str::len), Some(message.len()));
}

// ============================================================================
// Numeric Edge Cases
// ============================================================================

#[test]
fn boundary_seek_times_keep_their_text() {
    for raw in ["0.0", "1.0", "0", "1", "0.333333333333", "1e-3", "-0.5", "2.5"] {
        let wire = relayed(OutboundAction::seek_to(raw), "alice");
        let event = codec::decode(&wire).unwrap().unwrap();
        assert_eq!(event.seek_time().as_str(), raw);
    }
}

#[test]
fn non_numeric_seek_times_are_rejected() {
    for raw in ["", "abc", "NaN", "infinity", "0,5"] {
        let wire = relayed(OutboundAction::play(raw), "alice");
        assert_eq!(
            codec::decode(&wire),
            Err(DecodeError::InvalidSeekTime(raw.into())),
            "accepted {raw:?}"
        );
    }
}

// ============================================================================
// Room Scenario
// ============================================================================

struct StubPlayer {
    position: f64,
    playing: bool,
}

impl Player for StubPlayer {
    fn position(&self) -> f64 {
        self.position
    }
    fn set_position(&mut self, fraction: f64) {
        self.position = fraction;
    }
    fn length(&self) -> Duration {
        Duration::from_secs(2 * 3600)
    }
    fn is_playing(&self) -> bool {
        self.playing
    }
    fn play(&mut self) {
        self.playing = true;
    }
    fn pause(&mut self) {
        self.playing = false;
    }
    fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }
    fn load_media(&mut self, _path: &Path) -> Result<(), PlayerError> {
        Ok(())
    }
}

/// Stands in for the relay: records wire frames instead of sending them.
#[derive(Default)]
struct WireRecorder {
    frames: RefCell<Vec<String>>,
}

impl Outbound for WireRecorder {
    fn send(&self, action: OutboundAction) {
        self.frames.borrow_mut().push(codec::encode_action(&action));
    }
}

#[test]
fn alice_plays_and_bob_follows_without_echo() {
    let alice_wire = WireRecorder::default();
    let bob_wire = WireRecorder::default();

    let mut alice = Reconciler::new(
        StubPlayer {
            position: 0.25,
            playing: false,
        },
        ReconcileOptions::default(),
    );
    alice.join(&alice_wire);

    let mut bob = Reconciler::new(
        StubPlayer {
            position: 0.0,
            playing: false,
        },
        ReconcileOptions::default(),
    );
    bob.join(&bob_wire);

    alice.play();

    // The relay adds the sender's name before fanning out.
    let frames = alice_wire.frames.borrow();
    assert_eq!(frames.len(), 1);
    let mut fields = codec::parse_object(&frames[0]).unwrap();
    fields.insert("user".into(), "alice".into());
    let relayed = Value::Object(fields).to_string();

    let event = codec::decode(&relayed).unwrap().unwrap();
    assert_eq!(event.user(), "alice");
    assert_eq!(event.seek_time().as_str(), "0.25");

    let applied = bob.apply_remote(&event).unwrap();
    assert!(matches!(applied, RemoteApplied::Playback { .. }));
    assert!(bob.player().is_playing());
    assert_eq!(bob.player().position(), 0.25);

    assert!(bob_wire.frames.borrow().is_empty());
    assert_eq!(alice_wire.frames.borrow().len(), 1);
    assert!(alice.player().is_playing());
}
