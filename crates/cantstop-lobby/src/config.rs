//! Lobby limits and queue sizes.

use serde::{Deserialize, Serialize};

/// Capacity limits enforced at the boundary, plus channel sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Connected users across the whole server.
    pub max_users: usize,

    /// Open rooms across the whole server.
    pub max_rooms: usize,

    /// Members per room, host included.
    pub max_users_per_room: usize,

    /// Longest accepted username, in characters.
    pub max_username_len: usize,

    /// Members needed before the host may start.
    pub min_players_to_start: usize,

    /// Capacity of each user's outbound message queue.
    pub outbound_queue_size: usize,

    /// Capacity of each game actor's inbound and outbound channels.
    pub game_channel_size: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_users: 10,
            max_rooms: 20,
            max_users_per_room: 5,
            max_username_len: 20,
            min_players_to_start: 2,
            outbound_queue_size: 64,
            game_channel_size: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lobby_config_default() {
        let config = LobbyConfig::default();
        assert_eq!(config.max_users, 10);
        assert_eq!(config.max_rooms, 20);
        assert_eq!(config.max_users_per_room, 5);
        assert_eq!(config.max_username_len, 20);
        assert_eq!(config.min_players_to_start, 2);
    }

    #[test]
    fn test_lobby_config_partial_json_keeps_defaults() {
        let config: LobbyConfig =
            serde_json::from_str(r#"{"max_rooms": 2}"#).unwrap();
        assert_eq!(config.max_rooms, 2);
        assert_eq!(config.max_users, 10);
    }
}
