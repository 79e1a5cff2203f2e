//! Unified error type for the server.

use cantstop_lobby::{LobbyError, RoomError};
use cantstop_protocol::ProtocolError;
use cantstop_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert errors from
/// the lower crates automatically.
#[derive(Debug, thiserror::Error)]
pub enum CantStopError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The lobby refused a request (server full, no such room).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A room refused a request.
    #[error(transparent)]
    Room(#[from] RoomError),
}
