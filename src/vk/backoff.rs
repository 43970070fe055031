//! Capped exponential backoff with jitter for the poll loop.

use std::time::Duration;

use rand::Rng;

/// Retry delay generator: `base * 2^attempt` with ±`jitter`, never above `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
    attempt: u32,
}

impl Backoff {
    /// `jitter` is a fraction in `0.0..=1.0` applied symmetrically.
    #[must_use]
    pub fn new(base: Duration, max: Duration, jitter: f64) -> Self {
        Self { base, max, jitter: jitter.clamp(0.0, 1.0), attempt: 0 }
    }

    /// Delay before the next retry; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.ceiling();
        self.attempt = self.attempt.saturating_add(1);

        if self.jitter <= 0.0 {
            return delay;
        }
        let factor = rand::rng().random_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        delay.mul_f64(factor).min(self.max)
    }

    /// Un-jittered delay for the current attempt.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        let shift = self.attempt.min(31);
        self.base.saturating_mul(1u32 << shift).min(self.max)
    }

    /// Call after a successful round.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;
