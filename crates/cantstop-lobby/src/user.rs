//! One connected client.
//!
//! A [`User`] lives exactly as long as its connection. The lobby keeps
//! the owning `Arc`; rooms only hold `Weak` references. Its state is
//! behind a per-user `RwLock` because both the connection's read loop
//! and a room's game relay update it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cantstop_protocol::ServerMessage;
use tokio::sync::{RwLock, mpsc};

use crate::Room;

/// Counter for generating unique user IDs.
static NEXT_USER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for a connected user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(u64);

impl UserId {
    fn next() -> Self {
        Self(NEXT_USER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Where a user is in the connection lifecycle.
///
/// ```text
/// Free ──join──→ InPrep ──start──→ InGameNotPlaying ⇄ InGameRolling
///   ↑              ↑  │                   ↑               │
///   └────leave─────┘  │                   └── InGameChoosing ←┘
///                     └──────── game over ───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    /// Connected, not in a room. May or may not have a username yet.
    Free,
    /// In a room, no game running.
    InPrep,
    /// In a game, waiting for another player.
    InGameNotPlaying,
    /// In a game, expected to roll.
    InGameRolling,
    /// In a game, expected to pick an action or confirm.
    InGameChoosing,
}

impl UserStatus {
    pub fn is_in_game(self) -> bool {
        matches!(
            self,
            Self::InGameNotPlaying | Self::InGameRolling | Self::InGameChoosing
        )
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct UserState {
    status: UserStatus,
    username: Option<String>,
    room: Option<Arc<Room>>,
}

/// A connected client.
pub struct User {
    id: UserId,
    outbound: mpsc::Sender<ServerMessage>,
    state: RwLock<UserState>,
}

impl User {
    /// Creates a user whose messages go to `outbound`.
    pub fn new(outbound: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id: UserId::next(),
            outbound,
            state: RwLock::new(UserState {
                status: UserStatus::Free,
                username: None,
                room: None,
            }),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub async fn status(&self) -> UserStatus {
        self.state.read().await.status
    }

    pub async fn username(&self) -> Option<String> {
        self.state.read().await.username.clone()
    }

    /// The room this user is in, if any.
    pub async fn room(&self) -> Option<Arc<Room>> {
        self.state.read().await.room.clone()
    }

    pub(crate) async fn set_username(&self, username: String) {
        self.state.write().await.username = Some(username);
    }

    /// Enters `room` in the pre-game state.
    pub(crate) async fn enter_room(&self, room: Arc<Room>) {
        let mut state = self.state.write().await;
        state.room = Some(room);
        state.status = UserStatus::InPrep;
    }

    /// Leaves whatever room the user is in and becomes `Free`.
    pub(crate) async fn leave_room(&self) -> Option<Arc<Room>> {
        let mut state = self.state.write().await;
        state.status = UserStatus::Free;
        state.room.take()
    }

    /// Moves from `from` to `to`, but only while the user is still in
    /// `room` and currently in a status `from` accepts.
    ///
    /// The room's relay runs concurrently with the user's own actions, so
    /// a stale update (the user already left) must not land.
    pub(crate) async fn transition_in(
        &self,
        room: &Room,
        from: impl Fn(UserStatus) -> bool,
        to: UserStatus,
    ) -> bool {
        let mut state = self.state.write().await;
        let here = state
            .room
            .as_ref()
            .is_some_and(|r| std::ptr::eq(Arc::as_ptr(r), room));
        if here && from(state.status) {
            state.status = to;
            true
        } else {
            false
        }
    }

    /// Queues a message for this user's connection.
    ///
    /// Waits while the queue is full. A closed queue means the
    /// connection is going away; the message is dropped.
    pub async fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).await.is_err() {
            tracing::warn!(user = %self.id, "outbound queue closed, dropping message");
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User").field("id", &self.id).finish_non_exhaustive()
    }
}
