//! # twolies
//!
//! Session service for Two Truths and a Lie — Reversed: each player
//! submits five true statements, a generator invents two lies per
//! truth, and over ten alternating rounds the opponent has 30 seconds
//! to pick the truth out of the three.
//!
//! The crate wires the pure rules layer (`twolies-core`) and the locked
//! in-memory store (`twolies-store`) behind [`PartyService`], with three
//! pluggable seams:
//!
//! - [`LieGenerator`] — produces the two lies per truth (an LLM in
//!   production, a canned list in tests)
//! - [`Broadcaster`] — best-effort fan-out of [`RoomEvent`]s
//! - [`Clock`] — epoch-millisecond time source, swappable under test

#![allow(async_fn_in_trait)]

mod broadcast;
mod clock;
mod error;
mod generate;
mod service;

pub use broadcast::{Broadcaster, NullBroadcaster, RoomEvent, TracingBroadcaster};
pub use clock::{Clock, SystemClock};
pub use error::{ErrorKind, PartyError};
pub use generate::{GenerateError, LieGenerator, LiePair, validate_lies};
pub use service::{GuessResponse, JoinResponse, PartyService};

pub use twolies_core::{
    AdvanceOutcome, ChatMessage, GameError, GamePhase, Player, PlayerId, PlayerRound,
    RevealOutcome, Room, RoomId, RoundPhase, GUESS_TIMER_MS, MAX_ROUNDS, ROUNDS_PER_PLAYER,
    STATEMENTS_PER_ROUND,
};
pub use twolies_store::{RoomRepository, StoreConfig, StoreError};
