//! Seeded random sources
//!
//! Every component that needs randomness owns its own generator, seeded at
//! construction. Nothing in the crate touches a process-global RNG.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::types::EntityId;

pub type SimRng = ChaCha8Rng;

/// Generator for a fixed seed
pub fn seeded(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Derive an independent stream for one agent's component
///
/// `salt` separates streams owned by the same agent (brain vs relationships).
pub fn derive_seed(base: u64, owner: EntityId, salt: u64) -> u64 {
    base ^ (u64::from(owner.0).wrapping_mul(0x9E37_79B9_7F4A_7C15)) ^ salt.rotate_left(32)
}

/// Normal sample with mean 0 via Box-Muller
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f32) -> f32 {
    // u1 in (0, 1] so ln never sees zero
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = rng.gen::<f32>();
    let radius = (-2.0 * u1.ln()).sqrt();
    radius * (std::f32::consts::TAU * u2).cos() * sigma
}
