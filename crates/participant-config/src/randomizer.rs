//! Traffic-order randomization.
//!
//! Each participant gets an independent shuffle of the traffic levels for
//! every block. Unseeded runs draw from the thread RNG, so traffic orders
//! differ between runs; a seed makes the whole study reproducible.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::assignment::TrafficLevel;

/// Source of traffic permutations.
pub struct TrafficRandomizer {
    rng: Box<dyn RngCore>,
    seed: Option<u64>,
}

impl TrafficRandomizer {
    /// Create a randomizer; `None` uses fresh entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng: Box<dyn RngCore> = match seed {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None => Box::new(rand::rng()),
        };
        Self { rng, seed }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// One uniformly random permutation of all traffic levels.
    pub fn shuffle_levels(&mut self) -> Vec<TrafficLevel> {
        let mut levels = TrafficLevel::ALL.to_vec();
        levels.shuffle(&mut self.rng);
        levels
    }

    /// `slots` independent permutations, one per block.
    pub fn traffic_order(&mut self, slots: usize) -> Vec<Vec<TrafficLevel>> {
        (0..slots).map(|_| self.shuffle_levels()).collect()
    }
}

impl Default for TrafficRandomizer {
    fn default() -> Self {
        Self::new(None)
    }
}
