use twolies_core::{GameError, RoomId};

/// A failed repository operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No live room with this id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room rejected the mutation; its state is unchanged.
    #[error(transparent)]
    Game(#[from] GameError),
}
