//! Wire protocol for the Can't Stop server.
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the typed
//!   `{"type", "body"}` frames clients and server exchange.
//! - **Body types** ([`RoomId`], [`RollOption`], [`Space`],
//!   [`BlockedPath`]): values carried inside those frames.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, typed messages out.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Lobby / Room / Game
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{ClientMessage, Envelope, ServerMessage};
pub use types::{BlockedPath, ROOM_ID_ALPHABET, ROOM_ID_LEN, RollOption, RoomId, Space};
