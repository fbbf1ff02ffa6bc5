//! The service-level error and its coarse classification.

use twolies_core::{GameError, RoomId};
use twolies_store::StoreError;

use crate::generate::GenerateError;

/// Any way a service call can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartyError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl From<StoreError> for PartyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(id) => PartyError::RoomNotFound(id),
            StoreError::Game(game) => PartyError::Game(game),
        }
    }
}

/// Coarse category for mapping onto a transport's status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The room, player, or round does not exist.
    NotFound,
    /// The operation is not allowed in the session's current state.
    InvalidState,
    /// The request itself is malformed.
    Validation,
    /// The lie-generation provider failed.
    ExternalService,
}

impl PartyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PartyError::RoomNotFound(_) => ErrorKind::NotFound,
            PartyError::Game(GameError::PlayerNotFound(_)) => ErrorKind::NotFound,
            PartyError::Game(GameError::RoundNotFound) => ErrorKind::NotFound,
            PartyError::Game(GameError::Validation(_)) => ErrorKind::Validation,
            PartyError::Game(_) => ErrorKind::InvalidState,
            PartyError::Generate(_) => ErrorKind::ExternalService,
        }
    }
}
