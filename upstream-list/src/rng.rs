//! Randomness collaborator, abstracted the way `droute`'s `ConnInitiator`
//! abstracts connection setup: a narrow trait with one production
//! implementation and one deterministic mock for tests.

use rand::Rng;

/// Source of randomness needed by random selection, jitter, and the
/// probabilistic error-reset in address reconciliation.
pub trait UpstreamRng: Send + Sync {
    /// Uniform float in `[0, 1)`.
    fn uniform01(&self) -> f64;
    /// Uniform integer in `[0, bound)`. Returns `0` when `bound == 0`,
    /// matching the guard in the original random-range collaborator.
    fn uniform_range(&self, bound: u64) -> u64;
}

/// Symmetric jitter in `[-spread, spread)`, used for revive and lazy-resolve
/// timer scheduling.
pub(crate) fn jitter(rng: &dyn UpstreamRng, spread: f64) -> f64 {
    (rng.uniform01() * 2.0 - 1.0) * spread
}

/// Production RNG backed by the thread-local generator from the `rand` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRng;

impl UpstreamRng for SystemRng {
    fn uniform01(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn uniform_range(&self, bound: u64) -> u64 {
        if bound == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..bound)
        }
    }
}
