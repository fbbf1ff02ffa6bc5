//! The session data model: rooms, players, and their pre-generated rounds.
//!
//! Everything here is plain data. The phase transitions that mutate a
//! [`Room`] live in [`crate::machine`]; this module only defines the
//! shapes, the identifier newtypes, and a few read-only helpers.

use std::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Total rounds in a match: two players × five pre-generated rounds each.
pub const MAX_ROUNDS: u32 = 10;

/// Pre-generated rounds each player brings to the match.
pub const ROUNDS_PER_PLAYER: usize = 5;

/// How long the guesser has before the round can be timed out.
pub const GUESS_TIMER_MS: u64 = 30_000;

/// Statement slots per round: one truth, two lies.
pub const STATEMENTS_PER_ROUND: usize = 3;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for a game room.
///
/// Newly created rooms get a short uppercase code that players can read
/// out loud to each other; anything unique works as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Generates a 6-character uppercase room code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code: String = rng
            .sample_iter(Alphanumeric)
            .take(6)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect();
        Self(code)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque identifier for a player within a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Generates a 7-character lowercase player id.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id: String = rng
            .sample_iter(Alphanumeric)
            .take(7)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Coarse session stage.
///
/// ```text
/// Waiting → Generating → Ready → Playing → Finished
///              ↑                              │
///              └─────────── (restart) ────────┘
/// ```
///
/// - **Waiting**: room exists, fewer than two players.
/// - **Generating**: both players joined; each is submitting truths and
///   reviewing their generated rounds.
/// - **Ready**: both players have five rounds; waiting on the host.
/// - **Playing**: the 10-round match is running.
/// - **Finished**: all rounds revealed; a restart goes back to Generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Waiting,
    Generating,
    Ready,
    Playing,
    Finished,
}

impl GamePhase {
    /// Returns `true` if new players may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting | Self::Generating)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Generating => write!(f, "generating"),
            Self::Ready => write!(f, "ready"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Fine-grained state within [`GamePhase::Playing`]: the guesser is
/// either actively guessing or both players are reviewing the reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Playing,
    Intermission,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Intermission => write!(f, "intermission"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerRound
// ---------------------------------------------------------------------------

/// One (truth + two lies) triple belonging to a player.
///
/// Invariants once generated: `statements.len() == 3`,
/// `statements[truth_index] == truth`, and the two lies occupy the
/// remaining slots in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRound {
    /// The player-supplied true statement.
    pub truth: String,
    /// First generated false statement.
    pub lie1: String,
    /// Second generated false statement.
    pub lie2: String,
    /// The three statements as displayed to the guesser.
    pub statements: [String; STATEMENTS_PER_ROUND],
    /// Which slot holds the truth (0–2).
    pub truth_index: usize,
    /// The recorded guess, if one was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guess: Option<usize>,
    /// Whether the recorded guess hit the truth. `Some(false)` on timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guessed_correctly: Option<bool>,
    /// Whether this round's truth has been revealed.
    #[serde(default)]
    pub revealed: bool,
    /// Whether the round ended by timer instead of a guess.
    #[serde(default)]
    pub timed_out: bool,
}

impl PlayerRound {
    /// Returns `true` if a guess or a timeout has already resolved
    /// this round.
    pub fn is_resolved(&self) -> bool {
        self.revealed
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One of the (at most two) members of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    /// Display name, unique within the room. Rejoining with the same
    /// name returns this record instead of creating a new player.
    pub name: String,
    /// Whether the player has produced their five rounds.
    pub has_generated: bool,
    /// Generation complete and the player may be counted toward Ready.
    pub ready: bool,
    /// The player has acknowledged their own generated rounds.
    pub review_complete: bool,
    /// Exactly [`ROUNDS_PER_PLAYER`] entries once generated; empty before.
    #[serde(default)]
    pub rounds: Vec<PlayerRound>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            has_generated: false,
            ready: false,
            review_complete: false,
            rounds: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One game session shared by up to two players.
///
/// A `Room` is only ever mutated through the transition methods in
/// [`crate::machine`]; transports and stores treat it as an opaque
/// value that they load, transform, and write back atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    /// Join order is fixed and drives turn parity.
    pub players: Vec<Player>,
    /// The player allowed to start/restart. Always a current member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<PlayerId>,
    pub game_phase: GamePhase,
    pub round_phase: RoundPhase,
    /// Global round number, 1–[`MAX_ROUNDS`] while playing.
    pub current_round: u32,
    pub max_rounds: u32,
    /// Whose statements are on display this round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerId>,
    /// Who is guessing this round. Never equal to `current_player`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_guesser: Option<PlayerId>,
    pub started: bool,
    /// Epoch milliseconds when the active guess timer began.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_start: Option<u64>,
    /// Guess timer length in milliseconds.
    pub timer_duration: u64,
    /// Players who confirmed they are ready to leave the intermission.
    pub players_ready: Vec<PlayerId>,
}

impl Room {
    /// Creates an empty room in the `waiting` phase.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            players: Vec::new(),
            host_id: None,
            game_phase: GamePhase::Waiting,
            round_phase: RoundPhase::Playing,
            current_round: 1,
            max_rounds: MAX_ROUNDS,
            current_player: None,
            current_guesser: None,
            started: false,
            timer_start: None,
            timer_duration: GUESS_TIMER_MS,
            players_ready: Vec::new(),
        }
    }

    /// Looks up a member by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    /// Looks up a member by display name (the rejoin key).
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub(crate) fn player_by_name_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    /// Returns `true` if the given player is the host.
    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.host_id.as_ref() == Some(id)
    }

    /// Returns `true` if every current member has generated their rounds.
    pub fn all_generated(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.has_generated)
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// One entry in a room's append-only chat log.
///
/// Chat has no coupling to the game state machine; the log lives and
/// dies with the room (eviction discards it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub player_id: PlayerId,
    pub player_name: String,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub is_system: bool,
}
