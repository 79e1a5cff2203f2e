//! Room game-session relay.
//!
//! Starting a game spawns a game actor plus one relay task. The relay
//! drains the actor's output, keeps each member's [`UserStatus`] in step
//! with whose turn it is, and fans messages out to members. Client input
//! goes the other way through [`Room::forward_to_game`].

use std::sync::Arc;

use cantstop_game::{GameCommand, GameInput, GameOutput, spawn_game};
use cantstop_protocol::ServerMessage;
use tokio::sync::mpsc;

use crate::room::is_host;
use crate::{Room, RoomError, User, UserStatus};

impl Room {
    /// Starts a game on behalf of `requester`.
    ///
    /// The requester must be the host, the room must have enough members,
    /// and every other member must be ready. All checks and the switch to
    /// in-game happen under one write lock, so two racing starts cannot
    /// both succeed.
    pub async fn start_game(self: &Arc<Self>, requester: &str) -> Result<(), RoomError> {
        let (users, from_game) = {
            let mut inner = self.inner.write().await;
            if inner.closed {
                return Err(RoomError::Closed);
            }
            if inner.to_game.is_some() {
                return Err(RoomError::SessionActive);
            }
            if !is_host(&inner, requester) {
                return Err(RoomError::NotHost);
            }
            if inner.players.len() < self.min_players {
                return Err(RoomError::NotEnoughPlayers(self.min_players));
            }
            if !inner.players.iter().skip(1).all(|p| p.is_ready) {
                return Err(RoomError::NotAllReady);
            }

            let usernames = inner.players.iter().map(|p| p.username.clone()).collect();
            let handle = spawn_game(
                self.id().as_str(),
                inner.ruleset,
                usernames,
                self.channel_size,
            )?;
            inner.to_game = Some(handle.to_game);

            for player in &mut inner.players {
                player.is_in_game = true;
                player.is_ready = false;
            }
            let users: Vec<Arc<User>> =
                inner.players.iter().filter_map(|p| p.user.upgrade()).collect();
            (users, handle.from_game)
        };

        for user in &users {
            user.transition_in(self, |s| s == UserStatus::InPrep, UserStatus::InGameNotPlaying)
                .await;
        }

        tracing::info!(room = %self.id(), players = users.len(), "game started");
        tokio::spawn(relay(Arc::clone(self), from_game));
        Ok(())
    }

    /// Hands a player's in-game request to the running game.
    ///
    /// Waits while the game's inbound channel is full.
    pub async fn forward_to_game(
        &self,
        username: &str,
        command: GameCommand,
    ) -> Result<(), RoomError> {
        let to_game = self
            .inner
            .read()
            .await
            .to_game
            .clone()
            .ok_or(RoomError::NoSession)?;

        to_game
            .send(GameInput {
                username: username.to_string(),
                command,
            })
            .await
            .map_err(|_| RoomError::NoSession)
    }

    pub async fn has_session(&self) -> bool {
        self.inner.read().await.to_game.is_some()
    }

    /// Sends `message` to one member, or to every current member when
    /// `target` is `None`.
    async fn deliver(&self, target: Option<&str>, message: ServerMessage) {
        let recipients: Vec<Arc<User>> = {
            let inner = self.inner.read().await;
            inner
                .players
                .iter()
                .filter(|p| target.is_none_or(|username| p.username == username))
                .filter_map(|p| p.user.upgrade())
                .collect()
        };

        if recipients.is_empty() {
            if let Some(username) = target {
                tracing::debug!(room = %self.id(), %username, "relay target not in room");
            }
            return;
        }

        for user in recipients {
            user.send(message.clone()).await;
        }
    }

    async fn set_game_status(&self, username: &str, status: UserStatus) {
        if let Some(user) = self.member(username).await {
            user.transition_in(self, UserStatus::is_in_game, status).await;
        }
    }

    /// Returns a player who exited a finished game to the room screen.
    ///
    /// The user's status changes before the roster flag, so anyone who
    /// sees the resulting prep update also sees the user out of the game.
    async fn finish_player(&self, username: &str) {
        let user = self.member(username).await;
        if let Some(user) = &user {
            user.transition_in(self, UserStatus::is_in_game, UserStatus::InPrep)
                .await;
        }
        {
            let mut inner = self.inner.write().await;
            if let Some(player) = inner.players.iter_mut().find(|p| p.username == username) {
                player.is_in_game = false;
            }
        }
        self.broadcast_prep_update().await;
    }

    /// Puts every member back into the pre-game state.
    async fn end_session(&self) {
        let users: Vec<Arc<User>> = {
            let inner = self.inner.read().await;
            inner.players.iter().filter_map(|p| p.user.upgrade()).collect()
        };
        for user in &users {
            user.transition_in(self, UserStatus::is_in_game, UserStatus::InPrep)
                .await;
        }

        {
            let mut inner = self.inner.write().await;
            inner.to_game = None;
            for player in &mut inner.players {
                player.is_in_game = false;
                player.is_ready = false;
            }
        }
        self.broadcast_prep_update().await;
    }

    async fn member(&self, username: &str) -> Option<Arc<User>> {
        let inner = self.inner.read().await;
        inner
            .players
            .iter()
            .find(|p| p.username == username)
            .and_then(|p| p.user.upgrade())
    }
}

async fn relay(room: Arc<Room>, mut from_game: mpsc::Receiver<GameOutput>) {
    tracing::info!(room = %room.id(), "game relay started");
    let mut active: Option<String> = None;

    while let Some(GameOutput { target, message }) = from_game.recv().await {
        if matches!(message, ServerMessage::Terminate {}) {
            room.deliver(None, message).await;
            break;
        }
        if matches!(message, ServerMessage::Exit {}) {
            if let Some(username) = target.as_deref() {
                room.deliver(Some(username), message).await;
                room.finish_player(username).await;
            }
            continue;
        }

        match &message {
            ServerMessage::Player {
                username,
                is_playing,
                ..
            } => {
                let status = if *is_playing {
                    UserStatus::InGameRolling
                } else {
                    UserStatus::InGameNotPlaying
                };
                room.set_game_status(username, status).await;
                active = is_playing.then(|| username.clone());
            }
            ServerMessage::RollResult { .. } => {
                if let Some(username) = &active {
                    room.set_game_status(username, UserStatus::InGameChoosing)
                        .await;
                }
            }
            _ => {}
        }

        room.deliver(target.as_deref(), message).await;
    }

    room.end_session().await;
    tracing::info!(room = %room.id(), "game relay stopped");
}
