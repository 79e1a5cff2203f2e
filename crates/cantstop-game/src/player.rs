//! Per-player progress record.

use std::collections::BTreeMap;

use crate::ruleset::DISABLED_PATH;

/// One player's position in a game.
///
/// `progress[path]` is the remaining distance on that path; zero means
/// the player completed it. `temp` holds this turn's uncommitted steps.
#[derive(Debug, Clone)]
pub struct Player {
    username: String,
    progress: Vec<i8>,
    temp: BTreeMap<usize, i8>,
    total_moves: u32,
    left: bool,
}

impl Player {
    pub fn new(username: impl Into<String>, path_lengths: &[i8]) -> Self {
        Self {
            username: username.into(),
            progress: path_lengths.to_vec(),
            temp: BTreeMap::new(),
            total_moves: 0,
            left: false,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Remaining distance on `path`, or [`DISABLED_PATH`] if it doesn't exist.
    pub fn progress(&self, path: usize) -> i8 {
        self.progress.get(path).copied().unwrap_or(DISABLED_PATH)
    }

    /// Uncommitted steps on `path`, if any.
    pub fn temp(&self, path: usize) -> Option<i8> {
        self.temp.get(&path).copied()
    }

    /// Number of distinct paths with uncommitted progress.
    pub fn temp_paths(&self) -> usize {
        self.temp.len()
    }

    /// Iterates `(path, steps)` over uncommitted progress.
    pub fn temps(&self) -> impl Iterator<Item = (usize, i8)> + '_ {
        self.temp.iter().map(|(&path, &steps)| (path, steps))
    }

    pub fn has_completed(&self, path: usize) -> bool {
        self.progress(path) == 0
    }

    /// Adds one uncommitted step on `path`.
    pub fn advance(&mut self, path: usize) {
        *self.temp.entry(path).or_insert(0) += 1;
    }

    /// Takes back one uncommitted step on `path`.
    pub fn retreat(&mut self, path: usize) {
        if let Some(steps) = self.temp.get_mut(&path) {
            *steps -= 1;
            if *steps <= 0 {
                self.temp.remove(&path);
            }
        }
    }

    /// Makes uncommitted progress permanent.
    pub fn commit(&mut self) {
        for (path, steps) in std::mem::take(&mut self.temp) {
            if let Some(remaining) = self.progress.get_mut(path) {
                *remaining -= steps;
            }
        }
    }

    /// Throws away uncommitted progress.
    pub fn discard(&mut self) {
        self.temp.clear();
    }

    pub fn add_moves(&mut self, moves: u32) {
        self.total_moves += moves;
    }

    pub fn total_moves(&self) -> u32 {
        self.total_moves
    }

    /// Number of completed paths.
    pub fn score(&self) -> usize {
        self.progress.iter().filter(|&&p| p == 0).count()
    }

    pub fn has_left(&self) -> bool {
        self.left
    }

    pub fn leave(&mut self) {
        self.left = true;
    }
}
