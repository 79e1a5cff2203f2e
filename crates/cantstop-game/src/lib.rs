//! Can't Stop rules engine.
//!
//! - [`RuleSet`]: registry of immutable game variants.
//! - [`Player`] and [`Board`]: progress records and legal-move logic.
//! - [`Dice`]: where rolls come from.
//! - [`spawn_game`]: runs one session as an isolated actor task, driven
//!   through a [`GameHandle`].

mod actor;
mod board;
mod dice;
mod error;
mod player;
mod ruleset;

pub use actor::{
    GameCommand, GameHandle, GameInput, GameLimits, GameOutput, MAX_MOVE_COUNT,
    MAX_TURN_COUNT, spawn_game, spawn_game_with,
};
pub use board::Board;
pub use dice::{Dice, RandomDice};
pub use error::GameError;
pub use player::Player;
pub use ruleset::{ActionStrategy, DISABLED_PATH, RuleSet};
