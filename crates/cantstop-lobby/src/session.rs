//! Per-connection message dispatch.
//!
//! Each client message is checked against the sender's [`UserStatus`]
//! before anything happens. A message that doesn't fit the current
//! status is logged and dropped without telling the client. Lobby and
//! room failures come back as an `error` banner followed by the screen
//! the user is still on.

use std::sync::Arc;

use cantstop_game::GameCommand;
use cantstop_protocol::{ClientMessage, RoomId, ServerMessage};
use tokio::sync::mpsc;

use crate::{Lobby, LobbyError, Room, User, UserStatus};

/// Banner shown to members of a room whose host left.
pub const HOST_LEFT: &str = "the host has left the room";

/// Registers a new connection and prompts it for a username.
pub async fn connect(
    lobby: &Lobby,
    outbound: mpsc::Sender<ServerMessage>,
) -> Result<Arc<User>, LobbyError> {
    let user = lobby.create_user(outbound).await?;
    user.send(ServerMessage::Username { error: None }).await;
    Ok(user)
}

/// Applies one message from `user`.
pub async fn handle_message(lobby: &Lobby, user: &Arc<User>, msg: ClientMessage) {
    let status = user.status().await;
    let kind = msg.kind();

    match msg {
        ClientMessage::Username { username } if status == UserStatus::Free => {
            handle_username(lobby, user, &username).await;
        }
        ClientMessage::PrepNew if status == UserStatus::Free => {
            handle_prep_new(lobby, user).await;
        }
        ClientMessage::PrepJoin { room_id } if status == UserStatus::Free => {
            handle_prep_join(lobby, user, room_id).await;
        }
        ClientMessage::PrepLeave if status == UserStatus::InPrep => {
            handle_prep_leave(lobby, user).await;
        }
        ClientMessage::Ruleset { ruleset } if status == UserStatus::InPrep => {
            let Some((room, username)) = membership(user).await else {
                return;
            };
            if let Err(e) = room.set_ruleset(&username, ruleset).await {
                tracing::debug!(user = %user.id(), ruleset, error = %e, "ruleset rejected");
            }
        }
        ClientMessage::PrepReady if status == UserStatus::InPrep => {
            set_ready(user, true).await;
        }
        ClientMessage::PrepUnready if status == UserStatus::InPrep => {
            set_ready(user, false).await;
        }
        ClientMessage::Start if status == UserStatus::InPrep => {
            handle_start(user).await;
        }
        ClientMessage::Roll if status == UserStatus::InGameRolling => {
            forward(user, GameCommand::Roll).await;
        }
        ClientMessage::Act { action } if status == UserStatus::InGameChoosing => {
            forward(user, GameCommand::Act { action }).await;
        }
        ClientMessage::Confirm { will_continue }
            if status == UserStatus::InGameChoosing =>
        {
            forward(user, GameCommand::Confirm { will_continue }).await;
        }
        ClientMessage::Exit if status.is_in_game() => {
            forward(user, GameCommand::Exit).await;
        }
        _ => {
            tracing::debug!(user = %user.id(), %status, kind, "message not valid in current state, dropping");
        }
    }
}

/// Cleans up after a lost connection.
///
/// A running game is told the player exited. A host takes their room
/// down with them; anyone else just leaves the roster. Finally the user
/// is removed from the lobby.
pub async fn disconnect(lobby: &Lobby, user: &Arc<User>) {
    let status = user.status().await;
    let username = user.username().await;

    if let (Some(room), Some(username)) = (user.room().await, username) {
        if status.is_in_game() {
            if let Err(e) = room.forward_to_game(&username, GameCommand::Exit).await {
                tracing::debug!(user = %user.id(), error = %e, "no game to notify");
            }
        }
        user.leave_room().await;
        if room.is_host(&username).await {
            close_room(lobby, &room).await;
        } else if room.remove_player(&username).await == 0 {
            lobby.delete_room(room.id()).await;
        }
    }

    lobby.delete_user(user).await;
    tracing::info!(user = %user.id(), "user disconnected");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_username(lobby: &Lobby, user: &User, requested: &str) {
    match lobby.claim_username(user, requested).await {
        Ok(_) => user.send(ServerMessage::Prep {}).await,
        Err(e) => {
            tracing::debug!(user = %user.id(), error = %e, "username rejected");
            user.send(ServerMessage::Username {
                error: Some(e.to_string()),
            })
            .await;
        }
    }
}

async fn handle_prep_new(lobby: &Lobby, user: &Arc<User>) {
    let Some(username) = free_with_name(user).await else {
        return;
    };
    let room = match lobby.new_room().await {
        Ok(room) => room,
        Err(e) => return reject(user, e).await,
    };
    enter(lobby, user, &username, room).await;
}

async fn handle_prep_join(lobby: &Lobby, user: &Arc<User>, room_id: RoomId) {
    let Some(username) = free_with_name(user).await else {
        return;
    };
    if !room_id.is_well_formed() {
        return reject(user, LobbyError::InvalidRoomId).await;
    }
    let Some(room) = lobby.find_room_by_id(&room_id).await else {
        return reject(user, LobbyError::RoomNotFound(room_id)).await;
    };
    enter(lobby, user, &username, room).await;
}

async fn handle_prep_leave(lobby: &Lobby, user: &Arc<User>) {
    let Some((room, username)) = membership(user).await else {
        return;
    };
    user.leave_room().await;
    if room.is_host(&username).await {
        close_room(lobby, &room).await;
    } else if room.remove_player(&username).await == 0 {
        lobby.delete_room(room.id()).await;
    }
    user.send(ServerMessage::Prep {}).await;
}

async fn set_ready(user: &User, is_ready: bool) {
    if let Some((room, username)) = membership(user).await {
        room.set_ready(&username, is_ready).await;
    }
}

async fn handle_start(user: &Arc<User>) {
    let Some((room, username)) = membership(user).await else {
        return;
    };
    if let Err(e) = room.start_game(&username).await {
        tracing::debug!(user = %user.id(), room = %room.id(), error = %e, "start rejected");
        user.send(ServerMessage::error(e.to_string())).await;
        room.broadcast_prep_update().await;
    }
}

async fn forward(user: &User, command: GameCommand) {
    let Some((room, username)) = membership(user).await else {
        return;
    };
    if let Err(e) = room.forward_to_game(&username, command).await {
        tracing::debug!(user = %user.id(), error = %e, "could not forward to game");
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Puts `user` into `room`, undoing the move if the room refuses.
async fn enter(lobby: &Lobby, user: &Arc<User>, username: &str, room: Arc<Room>) {
    user.enter_room(Arc::clone(&room)).await;
    if let Err(e) = room.add_player(username, user).await {
        user.leave_room().await;
        if room.player_count().await == 0 {
            lobby.delete_room(room.id()).await;
        }
        tracing::debug!(user = %user.id(), room = %room.id(), error = %e, "join rejected");
        user.send(ServerMessage::error(e.to_string())).await;
        user.send(ServerMessage::Prep {}).await;
    }
}

/// Tears down a room whose host left and sends everyone else back to
/// the idle screen.
async fn close_room(lobby: &Lobby, room: &Room) {
    lobby.delete_room(room.id()).await;
    for member in room.close().await {
        if member.leave_room().await.is_none() {
            continue;
        }
        member.send(ServerMessage::error(HOST_LEFT)).await;
        member.send(ServerMessage::Prep {}).await;
    }
}

async fn reject(user: &User, error: LobbyError) {
    tracing::debug!(user = %user.id(), error = %error, "request rejected");
    user.send(ServerMessage::error(error.to_string())).await;
    user.send(ServerMessage::Prep {}).await;
}

/// The user's name, if they have one and are not in a room.
async fn free_with_name(user: &User) -> Option<String> {
    if user.room().await.is_some() {
        tracing::debug!(user = %user.id(), "already in a room");
        return None;
    }
    let username = user.username().await;
    if username.is_none() {
        tracing::debug!(user = %user.id(), "no username yet");
    }
    username
}

/// The user's room and name, if they are in one.
async fn membership(user: &User) -> Option<(Arc<Room>, String)> {
    let room = user.room().await?;
    let username = user.username().await?;
    Some((room, username))
}
