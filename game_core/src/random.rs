use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the randomness a round needs.
///
/// Everything random in the game (base colors, the differing block, the
/// perturbation factor) is drawn through this trait so a game can be replayed
/// from a seed, or driven by an exact script in tests.
pub trait RandomSource: Send {
    /// Uniform draw from `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer from `[0, bound)`. `bound` must be nonzero.
    fn below(&mut self, bound: u32) -> u32 {
        ((self.unit() * bound as f64) as u32).min(bound.saturating_sub(1))
    }

    /// Uniform draw from `[low, high)`.
    fn between(&mut self, low: f64, high: f64) -> f64 {
        low + self.unit() * (high - low)
    }

    /// Either 1 or -1, with equal odds.
    fn sign(&mut self) -> f64 {
        if self.below(2) == 0 {
            -1.0
        } else {
            1.0
        }
    }
}

/// Adapts any [rand::Rng] into a [RandomSource].
#[derive(Debug)]
pub struct RngSource<R>(R);

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        RngSource(rng)
    }
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        RngSource(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn below(&mut self, bound: u32) -> u32 {
        self.0.gen_range(0..bound.max(1))
    }
}

/// Replays a fixed list of unit draws, then repeats `fallback` forever.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    script: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = f64>>(script: I) -> Self {
        ScriptedSource {
            script: script.into_iter().collect(),
            fallback: 0.5,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// The unit draw that makes [RandomSource::below] pick `value` out of `bound`.
    pub fn picking(value: u32, bound: u32) -> f64 {
        (value as f64 + 0.5) / bound as f64
    }
}

impl RandomSource for ScriptedSource {
    fn unit(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}
