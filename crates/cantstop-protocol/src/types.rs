//! Value types that appear inside message bodies.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Room identifiers
// ---------------------------------------------------------------------------

/// Characters a room code may contain. Visually ambiguous letters
/// (`I`, `O`) are left out so codes can be read aloud.
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ1234567890";

/// Number of characters in a room code.
pub const ROOM_ID_LEN: usize = 8;

/// The code players type to join a room, e.g. `"K7QW2M9X"`.
///
/// Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns `true` if the code has the right length and only uses
    /// characters from [`ROOM_ID_ALPHABET`].
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ROOM_ID_LEN
            && self.0.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Roll result
// ---------------------------------------------------------------------------

/// One way of grouping the rolled dice, together with the moves it
/// allows.
///
/// `grouping` holds the dice values of each group (e.g. `[[3, 4], [1, 6]]`),
/// `actions` the legal moves, each an ordered list of path indices. An
/// empty `actions` means this grouping allows nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOption {
    pub grouping: Vec<Vec<u8>>,
    pub actions: Vec<Vec<usize>>,
}

// ---------------------------------------------------------------------------
// Gameboard
// ---------------------------------------------------------------------------

/// A single space on a path.
///
/// `colors` are the indices (in turn order) of the players whose marker
/// sits here. `has_temp` is set when the active player's uncommitted
/// progress covers this space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub colors: Vec<usize>,
    pub has_temp: bool,
}

/// A path permanently claimed by the player with index `color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPath {
    pub path: usize,
    pub color: usize,
}
