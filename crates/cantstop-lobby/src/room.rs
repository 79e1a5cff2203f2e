//! Room membership: the pre-game roster, readiness, and rule choice.
//!
//! The roster lives behind a `RwLock`. Mutations take the write lock,
//! snapshots for broadcasting take the read lock, and no lock is ever
//! held while a message is queued to a member. The game-session half
//! of the room lives in `relay.rs`.

use std::sync::{Arc, Weak};

use cantstop_game::{GameInput, RuleSet};
use cantstop_protocol::{RoomId, ServerMessage};
use tokio::sync::{RwLock, mpsc};

use crate::{LobbyConfig, RoomError, User};

/// One entry in a room's roster.
pub(crate) struct RoomPlayer {
    pub(crate) username: String,
    pub(crate) user: Weak<User>,
    pub(crate) is_ready: bool,
    pub(crate) is_in_game: bool,
}

pub(crate) struct RoomInner {
    /// Join order. `players[0]` is the host.
    pub(crate) players: Vec<RoomPlayer>,
    pub(crate) ruleset: usize,
    pub(crate) closed: bool,
    /// Inbound channel of the running game, if any.
    pub(crate) to_game: Option<mpsc::Sender<GameInput>>,
}

/// A group of users who play together.
pub struct Room {
    id: RoomId,
    pub(crate) max_players: usize,
    pub(crate) min_players: usize,
    pub(crate) channel_size: usize,
    pub(crate) inner: RwLock<RoomInner>,
}

impl Room {
    /// Creates an empty room with the limits from `config`.
    pub fn new(id: RoomId, config: &LobbyConfig) -> Self {
        Self {
            id,
            max_players: config.max_users_per_room,
            min_players: config.min_players_to_start,
            channel_size: config.game_channel_size,
            inner: RwLock::new(RoomInner {
                players: Vec::new(),
                ruleset: 0,
                closed: false,
                to_game: None,
            }),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Appends `user` to the roster and tells every member.
    ///
    /// The first player added becomes the host.
    pub async fn add_player(
        &self,
        username: &str,
        user: &Arc<User>,
    ) -> Result<(), RoomError> {
        {
            let mut inner = self.inner.write().await;
            if inner.closed {
                return Err(RoomError::Closed);
            }
            if inner.to_game.is_some() {
                return Err(RoomError::SessionActive);
            }
            if inner.players.len() >= self.max_players {
                return Err(RoomError::TooManyUsersInRoom);
            }
            inner.players.push(RoomPlayer {
                username: username.to_string(),
                user: Arc::downgrade(user),
                is_ready: false,
                is_in_game: false,
            });
            tracing::info!(room = %self.id, %username, players = inner.players.len(), "player joined room");
        }
        self.broadcast_prep_update().await;
        Ok(())
    }

    /// Removes `username` from the roster and returns how many members
    /// remain.
    pub async fn remove_player(&self, username: &str) -> usize {
        let remaining = {
            let mut inner = self.inner.write().await;
            match inner.players.iter().position(|p| p.username == username) {
                Some(index) => {
                    inner.players.remove(index);
                    tracing::info!(room = %self.id, %username, "player left room");
                }
                None => {
                    tracing::warn!(room = %self.id, %username, "remove_player: not in room");
                }
            }
            inner.players.len()
        };
        self.broadcast_prep_update().await;
        remaining
    }

    /// Sets a member's readiness flag.
    pub async fn set_ready(&self, username: &str, is_ready: bool) {
        {
            let mut inner = self.inner.write().await;
            match inner.players.iter_mut().find(|p| p.username == username) {
                Some(player) => player.is_ready = is_ready,
                None => {
                    tracing::warn!(room = %self.id, %username, "set_ready: not in room");
                    return;
                }
            }
        }
        self.broadcast_prep_update().await;
    }

    /// Host picks the rule variant for the next game.
    pub async fn set_ruleset(
        &self,
        requester: &str,
        ruleset: usize,
    ) -> Result<(), RoomError> {
        RuleSet::get(ruleset)?;
        {
            let mut inner = self.inner.write().await;
            if !is_host(&inner, requester) {
                return Err(RoomError::NotHost);
            }
            inner.ruleset = ruleset;
        }
        tracing::debug!(room = %self.id, ruleset, "ruleset changed");
        self.broadcast_prep_update().await;
        Ok(())
    }

    pub async fn ruleset(&self) -> usize {
        self.inner.read().await.ruleset
    }

    pub async fn is_host(&self, username: &str) -> bool {
        is_host(&*self.inner.read().await, username)
    }

    /// Usernames in join order.
    pub async fn usernames(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .players
            .iter()
            .map(|p| p.username.clone())
            .collect()
    }

    pub async fn player_count(&self) -> usize {
        self.inner.read().await.players.len()
    }

    /// Sends every member not in a game a snapshot of the room.
    ///
    /// The host's `is_ready` reports whether all other members are ready,
    /// which is what decides whether the host may start.
    pub async fn broadcast_prep_update(&self) {
        let updates: Vec<(Arc<User>, ServerMessage)> = {
            let inner = self.inner.read().await;
            let usernames: Vec<String> =
                inner.players.iter().map(|p| p.username.clone()).collect();
            let others_ready = inner.players.iter().skip(1).all(|p| p.is_ready);

            inner
                .players
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.is_in_game)
                .filter_map(|(index, p)| {
                    let user = p.user.upgrade()?;
                    let is_hosting = index == 0;
                    let message = ServerMessage::PrepUpdate {
                        room_id: self.id.clone(),
                        is_hosting,
                        is_ready: if is_hosting { others_ready } else { p.is_ready },
                        usernames: usernames.clone(),
                        ruleset: inner.ruleset,
                    };
                    Some((user, message))
                })
                .collect()
        };

        for (user, message) in updates {
            user.send(message).await;
        }
    }

    /// Marks the room closed and empties its roster.
    ///
    /// Returns the members that were still connected. A running game
    /// loses its inbound channel, which makes the actor terminate.
    pub async fn close(&self) -> Vec<Arc<User>> {
        let mut inner = self.inner.write().await;
        inner.closed = true;
        inner.to_game = None;
        let players = std::mem::take(&mut inner.players);
        tracing::info!(room = %self.id, players = players.len(), "room closed");
        players.into_iter().filter_map(|p| p.user.upgrade()).collect()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.read().await.closed
    }
}

pub(crate) fn is_host(inner: &RoomInner, username: &str) -> bool {
    inner.players.first().is_some_and(|p| p.username == username)
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room").field("id", &self.id).finish_non_exhaustive()
    }
}
