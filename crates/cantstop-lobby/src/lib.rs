//! Lobby, rooms, and per-connection sessions for the Can't Stop server.
//!
//! # Key types
//!
//! - [`Lobby`]: registry of connected users and open rooms
//! - [`Room`]: pre-game roster, plus the relay to a running game
//! - [`User`]: one connection's state machine ([`UserStatus`])
//! - [`session`]: turns client messages into lobby, room, and game calls

mod config;
mod error;
mod lobby;
mod relay;
mod room;
pub mod session;
mod user;

pub use config::LobbyConfig;
pub use error::{LobbyError, RoomError};
pub use lobby::Lobby;
pub use room::Room;
pub use user::{User, UserId, UserStatus};
