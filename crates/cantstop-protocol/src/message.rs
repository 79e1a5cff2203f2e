//! Typed messages exchanged with clients.
//!
//! Every frame is `{"type": ..., "body": {...}}`. Outbound messages are
//! plain adjacently tagged enums. Inbound frames are first read into a
//! loose [`Envelope`] and then validated into a [`ClientMessage`], so an
//! unknown `type`, a missing field, or a wrongly typed field is rejected
//! at the boundary and never reaches the lobby or the game.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{BlockedPath, ProtocolError, RollOption, RoomId, Space};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// The untyped shape of an inbound frame.
///
/// `body` may be absent or `null` for messages that carry nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// A validated message from a client.
///
/// The sender's username is never part of the payload (except when
/// claiming one); the session attaches it from connection identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "body",
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    try_from = "Envelope"
)]
pub enum ClientMessage {
    /// Claim a display name.
    Username { username: String },
    /// Create a new room and become its host.
    PrepNew,
    /// Join an existing room by code.
    PrepJoin { room_id: RoomId },
    /// Leave the current room.
    PrepLeave,
    /// Host picks a rule variant.
    Ruleset { ruleset: usize },
    PrepReady,
    PrepUnready,
    /// Host starts the game.
    Start,
    /// Active player rolls for the first move of a turn.
    Roll,
    /// Active player picks one of the offered actions.
    Act { action: Vec<usize> },
    /// Active player continues (re-roll) or stops (commit). The choice
    /// may be omitted only to acknowledge a failed roll.
    Confirm {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        will_continue: Option<bool>,
    },
    /// Leave a finished game.
    Exit,
}

#[derive(Deserialize)]
struct UsernameBody {
    username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepJoinBody {
    room_id: RoomId,
}

#[derive(Deserialize)]
struct RulesetBody {
    ruleset: usize,
}

#[derive(Deserialize)]
struct ActBody {
    action: Vec<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmBody {
    #[serde(default)]
    will_continue: Option<bool>,
}

fn body<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(ProtocolError::Decode)
}

impl TryFrom<Envelope> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let value = match envelope.body {
            serde_json::Value::Null => {
                serde_json::Value::Object(serde_json::Map::new())
            }
            other => other,
        };

        let msg = match envelope.kind.as_str() {
            "username" => {
                let b: UsernameBody = body(value)?;
                Self::Username { username: b.username }
            }
            "prepNew" => Self::PrepNew,
            "prepJoin" => {
                let b: PrepJoinBody = body(value)?;
                Self::PrepJoin { room_id: b.room_id }
            }
            "prepLeave" => Self::PrepLeave,
            "ruleset" => {
                let b: RulesetBody = body(value)?;
                Self::Ruleset { ruleset: b.ruleset }
            }
            "prepReady" => Self::PrepReady,
            "prepUnready" => Self::PrepUnready,
            "start" => Self::Start,
            "roll" => Self::Roll,
            "act" => {
                let b: ActBody = body(value)?;
                Self::Act { action: b.action }
            }
            "confirm" => {
                let b: ConfirmBody = body(value)?;
                Self::Confirm { will_continue: b.will_continue }
            }
            "exit" => Self::Exit,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown message type {other:?}"
                )));
            }
        };
        Ok(msg)
    }
}

impl ClientMessage {
    /// The wire name of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Username { .. } => "username",
            Self::PrepNew => "prepNew",
            Self::PrepJoin { .. } => "prepJoin",
            Self::PrepLeave => "prepLeave",
            Self::Ruleset { .. } => "ruleset",
            Self::PrepReady => "prepReady",
            Self::PrepUnready => "prepUnready",
            Self::Start => "start",
            Self::Roll => "roll",
            Self::Act { .. } => "act",
            Self::Confirm { .. } => "confirm",
            Self::Exit => "exit",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A message from the server to one client.
///
/// Body-less messages are written as empty struct variants so they
/// serialize with `"body": {}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "body",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Username prompt, or a rejection when `error` is set.
    Username {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Idle screen: named, but not in a room.
    Prep {},
    /// Room snapshot for one recipient.
    PrepUpdate {
        room_id: RoomId,
        is_hosting: bool,
        /// For the host: whether every other member is ready.
        is_ready: bool,
        usernames: Vec<String>,
        ruleset: usize,
    },
    /// Non-fatal error banner.
    Error { error: String },
    /// Game began; `usernames` are in turn order.
    Start {
        usernames: Vec<String>,
        path_lengths: Vec<i8>,
    },
    TurnCount { turn_count: u32 },
    MoveCount { move_count: u32 },
    Player {
        username: String,
        is_playing: bool,
        score: usize,
    },
    /// Prompt the active player to roll.
    Roll {},
    /// Outcome of a roll and the actions it allows.
    #[serde(rename = "result")]
    RollResult {
        points: Vec<u8>,
        options: Vec<RollOption>,
        failed: bool,
    },
    /// Prompt the active player to continue or stop.
    Confirm {},
    Gameboard {
        gameboard: Vec<Vec<Space>>,
        blocked_paths: Vec<BlockedPath>,
    },
    Winner { winner: String },
    /// Human-readable game announcement.
    Log { content: String },
    /// Acknowledges that the recipient left a finished game.
    Exit {},
    /// The game session is over.
    Terminate {},
}

impl ServerMessage {
    /// Shorthand for an [`ServerMessage::Error`] banner.
    pub fn error(error: impl Into<String>) -> Self {
        Self::Error { error: error.into() }
    }

    /// Shorthand for a [`ServerMessage::Log`] announcement.
    pub fn log(content: impl Into<String>) -> Self {
        Self::Log { content: content.into() }
    }
}
