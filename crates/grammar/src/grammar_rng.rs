//! Deterministic derivation RNG resource.
//!
//! Wraps `ChaCha8Rng` for cross-platform deterministic randomness. Every
//! stochastic draw in a derivation (rule selection and production
//! geometry) should come from one `GrammarRng` stream so that identical
//! seeds reproduce identical scenes.

use bevy::prelude::Resource;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Default seed used when no explicit seed is provided.
const DEFAULT_SEED: u64 = 42;

/// Deterministic RNG for all derivation randomness.
///
/// Drivers take `ResMut<GrammarRng>` (or own one directly) and pass
/// `rng.0` wherever the engine wants `&mut impl Rng`.
#[derive(Resource)]
pub struct GrammarRng(pub ChaCha8Rng);

impl Default for GrammarRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl GrammarRng {
    /// Create a new `GrammarRng` seeded from the given `u64` value.
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}
