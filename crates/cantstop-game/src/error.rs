//! Error types for the game layer.

/// Errors that can occur when starting or running a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No rule variant is registered under this index.
    #[error("rule set {0} not found")]
    RuleSetNotFound(usize),

    /// A game needs at least one player.
    #[error("cannot start a game without players")]
    NoPlayers,

    /// The outbound channel's receiver is gone, so nobody is listening
    /// to the game any more.
    #[error("game relay closed")]
    RelayClosed,
}
