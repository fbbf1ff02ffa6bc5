//! Room event fan-out.
//!
//! Every state change the service commits is announced as a
//! [`RoomEvent`]. Delivery is best-effort: the room has already moved
//! on by the time an event is published, and a client that misses one
//! can always re-fetch the snapshot. Publishing therefore cannot fail
//! and never blocks a room lock.
//!
//! # Why best-effort?
//!
//! The store is the single source of truth; events are hints that it
//! changed. If delivery were load-bearing, a flaky pub/sub provider
//! could wedge a game even though the room committed fine. So
//! `publish` returns nothing, and implementations swallow their own
//! failures:
//! - A real pub/sub fan-out in production
//! - [`TracingBroadcaster`] to watch the stream in logs
//! - [`NullBroadcaster`] (or a recording fake) in tests

use serde::Serialize;
use tracing::info;

use twolies_core::{ChatMessage, Player, Room, RoomId};

/// An announcement about a room, tagged for the wire as
/// `{"event": "round-result", ...}` with camelCase payload fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    RoomUpdate {
        room: Room,
    },
    PlayerJoined {
        player: Player,
        room: Room,
    },
    ChatMessage {
        message: ChatMessage,
    },
    GameStarted {
        room: Room,
    },
    RoundStarted {
        room: Room,
    },
    /// The reveal for a resolved round.
    RoundResult {
        room: Room,
        guess: Option<usize>,
        is_correct: bool,
        timed_out: bool,
        correct_answer: usize,
        correct_statement: String,
    },
    GameFinished {
        room: Room,
    },
    PlayerLeft {
        room: Room,
        player_name: String,
    },
    RoomRestart {
        room: Room,
    },
}

impl RoomEvent {
    /// The wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::RoomUpdate { .. } => "room-update",
            RoomEvent::PlayerJoined { .. } => "player-joined",
            RoomEvent::ChatMessage { .. } => "chat-message",
            RoomEvent::GameStarted { .. } => "game-started",
            RoomEvent::RoundStarted { .. } => "round-started",
            RoomEvent::RoundResult { .. } => "round-result",
            RoomEvent::GameFinished { .. } => "game-finished",
            RoomEvent::PlayerLeft { .. } => "player-left",
            RoomEvent::RoomRestart { .. } => "room-restart",
        }
    }
}

/// Delivers room events to whoever is listening.
pub trait Broadcaster: Send + Sync + 'static {
    async fn publish(&self, room_id: &RoomId, event: RoomEvent);
}

/// Discards every event. For tests and offline use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    async fn publish(&self, _room_id: &RoomId, _event: RoomEvent) {}
}

/// Logs each event as structured JSON instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBroadcaster;

impl Broadcaster for TracingBroadcaster {
    async fn publish(&self, room_id: &RoomId, event: RoomEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                info!(room_id = %room_id, event = event.name(), %payload, "broadcast");
            }
            Err(err) => {
                info!(room_id = %room_id, event = event.name(), %err, "broadcast (unserializable)");
            }
        }
    }
}
