//! Error types for the lobby and room layers.
//!
//! The `Display` text of these errors is what clients see in `error`
//! banners, so it is written for players.

use cantstop_game::GameError;
use cantstop_protocol::RoomId;

/// Errors from lobby-wide operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The server already has its maximum number of connected users.
    #[error("the server is full")]
    TooManyUsers,

    /// The server already has its maximum number of open rooms.
    #[error("too many rooms are open, try again later")]
    TooManyRooms,

    #[error("username {0} is already taken")]
    UsernameTaken(String),

    /// Empty, or longer than the configured limit.
    #[error("username must be between 1 and {0} characters")]
    UsernameInvalid(usize),

    /// The code isn't a well-formed room code.
    #[error("invalid room ID")]
    InvalidRoomId,

    #[error("room {0} not found")]
    RoomNotFound(RoomId),
}

/// Errors from room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("the room is full")]
    TooManyUsersInRoom,

    /// The room was closed (its host left) while the request was in flight.
    #[error("the room is closed")]
    Closed,

    #[error("only the host can do that")]
    NotHost,

    #[error("not all players are ready")]
    NotAllReady,

    #[error("at least {0} players are needed to start")]
    NotEnoughPlayers(usize),

    #[error("a game is already in progress")]
    SessionActive,

    #[error("no game is in progress")]
    NoSession,

    #[error(transparent)]
    Game(#[from] GameError),
}
