//! Error types for the game rules layer.

/// A rejected room operation.
///
/// Every variant is a request-level failure: the room the operation ran
/// against is left exactly as it was. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The room already has two players.
    #[error("room is full")]
    RoomFull,

    /// No member with this id or name.
    #[error("player {0} not found in room")]
    PlayerNotFound(String),

    /// The caller is not the host.
    #[error("only the host can do this")]
    NotHost,

    /// The caller is not the current guesser.
    #[error("not this player's turn to guess")]
    NotGuesser,

    /// No generated round exists where one was expected.
    #[error("no active round")]
    RoundNotFound,

    /// A guess or timeout was already recorded for this round.
    #[error("round already resolved")]
    RoundAlreadyResolved,

    /// The 30-second guess window has closed.
    #[error("guess timer expired")]
    TimerExpired,

    /// The operation is not valid in the room's current phase.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// Malformed input (wrong truth count, out-of-range index, ...).
    #[error("invalid input: {0}")]
    Validation(String),
}
