//! Game rules for Two Truths and a Lie — Reversed: a two-player party
//! game where each round shows one true statement among two generated
//! lies, and the opponent has 30 seconds to find the truth.
//!
//! This crate is the pure rules layer: plain data plus synchronous
//! transition methods on [`Room`]. No I/O, no locking, no clocks: the
//! caller supplies timestamps and an RNG, which keeps every rule
//! deterministic under test. Storage and the async service surface live
//! in the companion crates.
//!
//! # Key types
//!
//! - [`Room`] — full session state, with one method per player action
//! - [`Player`] / [`PlayerRound`] — a member and their five rounds
//! - [`GamePhase`] / [`RoundPhase`] — the two-level phase machine
//! - [`RevealOutcome`] — what a resolved round looked like
//! - [`GameError`] — every way a request can be rejected

mod error;
mod model;

pub mod assign;
pub mod evaluate;
pub mod machine;
pub mod turns;

pub use error::GameError;
pub use evaluate::RevealOutcome;
pub use machine::{AdvanceOutcome, JoinOutcome};
pub use model::{
    ChatMessage, GamePhase, Player, PlayerId, PlayerRound, Room, RoomId, RoundPhase,
    GUESS_TIMER_MS, MAX_ROUNDS, ROUNDS_PER_PLAYER, STATEMENTS_PER_ROUND,
};
pub use turns::TurnAssignment;
