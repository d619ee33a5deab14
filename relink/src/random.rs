//! Random number generation provider abstraction.
//!
//! Retry jitter must stay testable, so randomness is injected rather
//! than pulled from an unseeded global: production uses the thread-local
//! RNG, tests use [`SeededRandomProvider`] for reproducible schedules.

use rand::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Provider trait for the randomness the link consumes.
pub trait RandomProvider: Clone {
    /// Generate a random f64 between 0.0 and 1.0.
    fn random_ratio(&self) -> f64;
}

/// Production random provider using the thread-local RNG.
#[derive(Clone, Default)]
pub struct TokioRandomProvider;

impl TokioRandomProvider {
    /// Create a new production random provider.
    pub fn new() -> Self {
        Self
    }
}

thread_local! {
    static RNG: RefCell<rand::rngs::ThreadRng> = RefCell::new(rand::rng());
}

impl RandomProvider for TokioRandomProvider {
    fn random_ratio(&self) -> f64 {
        RNG.with(|rng| rng.borrow_mut().random())
    }
}

/// Deterministic random provider seeded at construction.
#[derive(Clone)]
pub struct SeededRandomProvider {
    rng: Rc<RefCell<StdRng>>,
}

impl SeededRandomProvider {
    /// Create a provider producing the sequence determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rc::new(RefCell::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl RandomProvider for SeededRandomProvider {
    fn random_ratio(&self) -> f64 {
        self.rng.borrow_mut().random()
    }
}
