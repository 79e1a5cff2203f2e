//! Sources of dice rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces one roll: a value in `1..=faces` for each die.
///
/// The game actor owns its dice and borrows them across awaits, so
/// implementations must be `Send + Sync`.
pub trait Dice: Send + Sync + 'static {
    fn roll(&mut self, faces: &[u8]) -> Vec<u8>;
}

/// Uniform server-side dice.
#[derive(Debug)]
pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Seeds from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl Dice for RandomDice {
    fn roll(&mut self, faces: &[u8]) -> Vec<u8> {
        faces
            .iter()
            .map(|&f| self.rng.random_range(1..=f.max(1)))
            .collect()
    }
}
