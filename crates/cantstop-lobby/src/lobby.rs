//! Lobby: the registry of connected users and open rooms.

use std::collections::HashMap;
use std::sync::Arc;

use cantstop_protocol::{ROOM_ID_ALPHABET, ROOM_ID_LEN, RoomId, ServerMessage};
use rand::Rng;
use tokio::sync::{Mutex, mpsc};

use crate::{LobbyConfig, LobbyError, Room, User, UserId};

struct LobbyInner {
    users: Vec<Arc<User>>,
    /// Claimed usernames, so a name can't be taken twice.
    usernames: HashMap<String, UserId>,
    rooms: HashMap<RoomId, Arc<Room>>,
}

/// Everyone connected and every open room.
///
/// One mutex covers all collections. It is held only while a collection
/// changes, never while a message is queued to a user.
pub struct Lobby {
    config: LobbyConfig,
    inner: Mutex<LobbyInner>,
}

impl Lobby {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(LobbyInner {
                users: Vec::new(),
                usernames: HashMap::new(),
                rooms: HashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Registers a new, unnamed user whose messages go to `outbound`.
    pub async fn create_user(
        &self,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<Arc<User>, LobbyError> {
        let mut inner = self.inner.lock().await;
        if inner.users.len() >= self.config.max_users {
            return Err(LobbyError::TooManyUsers);
        }
        let user = Arc::new(User::new(outbound));
        inner.users.push(Arc::clone(&user));
        tracing::info!(user = %user.id(), users = inner.users.len(), "user created");
        Ok(user)
    }

    /// Gives `user` the name `requested`, trimmed of surrounding
    /// whitespace. A name the user already had is released.
    pub async fn claim_username(
        &self,
        user: &User,
        requested: &str,
    ) -> Result<String, LobbyError> {
        let username = requested.trim();
        let len = username.chars().count();
        if len == 0 || len > self.config.max_username_len {
            return Err(LobbyError::UsernameInvalid(self.config.max_username_len));
        }

        {
            let mut inner = self.inner.lock().await;
            match inner.usernames.get(username) {
                Some(&owner) if owner == user.id() => return Ok(username.to_string()),
                Some(_) => return Err(LobbyError::UsernameTaken(username.to_string())),
                None => {}
            }
            inner.usernames.retain(|_, owner| *owner != user.id());
            inner.usernames.insert(username.to_string(), user.id());
        }

        user.set_username(username.to_string()).await;
        tracing::info!(user = %user.id(), %username, "username claimed");
        Ok(username.to_string())
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<Arc<User>> {
        let inner = self.inner.lock().await;
        let id = *inner.usernames.get(username)?;
        inner.users.iter().find(|u| u.id() == id).cloned()
    }

    /// Forgets `user` and releases its name. Removing a user twice only
    /// logs a warning.
    pub async fn delete_user(&self, user: &User) {
        let mut inner = self.inner.lock().await;
        match inner.users.iter().position(|u| u.id() == user.id()) {
            Some(index) => {
                inner.users.swap_remove(index);
                inner.usernames.retain(|_, owner| *owner != user.id());
                tracing::info!(user = %user.id(), users = inner.users.len(), "user deleted");
            }
            None => {
                tracing::warn!(user = %user.id(), "delete_user: user not found");
            }
        }
    }

    pub async fn user_count(&self) -> usize {
        self.inner.lock().await.users.len()
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    /// Opens a room under a fresh code.
    pub async fn new_room(&self) -> Result<Arc<Room>, LobbyError> {
        let mut inner = self.inner.lock().await;
        if inner.rooms.len() >= self.config.max_rooms {
            return Err(LobbyError::TooManyRooms);
        }

        let id = loop {
            let candidate = random_room_id();
            if !inner.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Arc::new(Room::new(id.clone(), &self.config));
        inner.rooms.insert(id.clone(), Arc::clone(&room));
        tracing::info!(room = %id, rooms = inner.rooms.len(), "room created");
        Ok(room)
    }

    pub async fn find_room_by_id(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.inner.lock().await.rooms.get(id).cloned()
    }

    pub async fn delete_room(&self, id: &RoomId) {
        let mut inner = self.inner.lock().await;
        if inner.rooms.remove(id).is_some() {
            tracing::info!(room = %id, rooms = inner.rooms.len(), "room deleted");
        } else {
            tracing::warn!(room = %id, "delete_room: room not found");
        }
    }

    pub async fn room_count(&self) -> usize {
        self.inner.lock().await.rooms.len()
    }
}

fn random_room_id() -> RoomId {
    let mut rng = rand::rng();
    let code = (0..ROOM_ID_LEN)
        .map(|_| {
            let index = rng.random_range(0..ROOM_ID_ALPHABET.len());
            char::from(ROOM_ID_ALPHABET[index])
        })
        .collect();
    RoomId(code)
}
