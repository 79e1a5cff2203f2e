//! Board state and legal-move computation.
//!
//! The board owns every [`Player`] of a session and knows whose turn it
//! is. It answers the rules questions the game actor asks: which paths
//! are blocked, which actions a roll allows, and what the board looks
//! like to clients.

use cantstop_protocol::{BlockedPath, RollOption, Space};

use crate::{Player, RuleSet};

#[derive(Debug)]
pub struct Board {
    rules: &'static RuleSet,
    players: Vec<Player>,
    playing: usize,
}

impl Board {
    /// Creates a board with players seated in the given order.
    pub fn new(rules: &'static RuleSet, usernames: &[String]) -> Self {
        let players = usernames
            .iter()
            .map(|name| Player::new(name.as_str(), rules.path_lengths))
            .collect();
        Self {
            rules,
            players,
            playing: 0,
        }
    }

    pub fn rules(&self) -> &'static RuleSet {
        self.rules
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn usernames(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|p| p.username().to_string())
            .collect()
    }

    pub fn playing(&self) -> usize {
        self.playing
    }

    pub fn set_playing(&mut self, index: usize) {
        self.playing = index;
    }

    pub fn active(&self) -> &Player {
        &self.players[self.playing]
    }

    pub fn active_mut(&mut self) -> &mut Player {
        &mut self.players[self.playing]
    }

    pub fn player_mut(&mut self, username: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.username() == username)
    }

    pub fn all_left(&self) -> bool {
        self.players.iter().all(Player::has_left)
    }

    /// Index of the player who owns `path`, if anyone completed it.
    pub fn completed_by(&self, path: usize) -> Option<usize> {
        self.players.iter().position(|p| p.has_completed(path))
    }

    /// Whether the active player may take one more step on `path`.
    ///
    /// The path must exist and be unclaimed. A path already carrying
    /// uncommitted progress accepts steps up to the remaining distance;
    /// a fresh path needs a free temporary slot.
    pub fn is_valid_path(&self, path: usize) -> bool {
        if !self.rules.is_enabled(path) || self.completed_by(path).is_some()
        {
            return false;
        }
        let active = self.active();
        match active.temp(path) {
            Some(steps) => active.progress(path) > steps,
            None => active.temp_paths() < self.rules.num_temp_paths,
        }
    }

    /// Whether `action` can be applied step by step from the current state.
    ///
    /// Each step is checked after the previous ones are applied; every
    /// applied step is rolled back before returning.
    pub fn is_valid_action(&mut self, action: &[usize]) -> bool {
        let mut applied = 0;
        let mut valid = true;
        for &path in action {
            if !self.is_valid_path(path) {
                valid = false;
                break;
            }
            self.active_mut().advance(path);
            applied += 1;
        }
        for &path in action[..applied].iter().rev() {
            self.active_mut().retreat(path);
        }
        valid && !action.is_empty()
    }

    /// Computes the options a roll gives the active player.
    ///
    /// Returns one [`RollOption`] per partition and whether the roll is
    /// a forced failure (no partition allows anything).
    pub fn options(&mut self, points: &[u8]) -> (Vec<RollOption>, bool) {
        let rules = self.rules;
        let options: Vec<RollOption> = rules
            .groupings(points)
            .into_iter()
            .map(|grouping| {
                let actions = rules
                    .strategy
                    .actions(&grouping, |action| self.is_valid_action(action));
                RollOption { grouping, actions }
            })
            .collect();
        let failed = options.iter().all(|o| o.actions.is_empty());
        (options, failed)
    }

    /// Applies an already validated action to the active player's temp.
    pub fn apply(&mut self, action: &[usize]) {
        for &path in action {
            self.active_mut().advance(path);
        }
    }

    /// Renders every path as its list of spaces.
    ///
    /// Each player's permanent marker sits `length - progress - 1` spaces
    /// in; the active player's uncommitted steps are drawn on the spaces
    /// right after their marker.
    pub fn gameboard(&self) -> Vec<Vec<Space>> {
        let lengths = self.rules.path_lengths;
        let mut board: Vec<Vec<Space>> = lengths
            .iter()
            .map(|&len| vec![Space::default(); usize::try_from(len).unwrap_or(0)])
            .collect();

        for (color, player) in self.players.iter().enumerate() {
            for (path, spaces) in board.iter_mut().enumerate() {
                if let Some(space) = marker(lengths, player, path)
                    .and_then(|j| spaces.get_mut(j))
                {
                    space.colors.push(color);
                }
            }
        }

        let active = self.active();
        for (path, steps) in active.temps() {
            let Some(spaces) = board.get_mut(path) else {
                continue;
            };
            let start = (lengths[path] - active.progress(path)) as usize;
            for space in spaces.iter_mut().skip(start).take(steps as usize) {
                space.colors.push(self.playing);
                space.has_temp = true;
            }
        }
        board
    }

    /// Lists completed paths with their owner.
    pub fn blocked_paths(&self) -> Vec<BlockedPath> {
        (0..self.rules.path_lengths.len())
            .filter(|&path| self.rules.is_enabled(path))
            .filter_map(|path| {
                self.completed_by(path)
                    .map(|color| BlockedPath { path, color })
            })
            .collect()
    }
}

/// Space index of a player's permanent marker, or `None` before they
/// have moved on that path.
fn marker(lengths: &[i8], player: &Player, path: usize) -> Option<usize> {
    let len = *lengths.get(path)?;
    if len < 0 {
        return None;
    }
    usize::try_from(len - player.progress(path) - 1).ok()
}
