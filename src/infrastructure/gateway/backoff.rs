//! Reconnect backoff policy

use std::time::Duration;

use rand::Rng;

/// Capped exponential backoff with jitter. Reset once a session reaches
/// ready so a later outage starts from the base delay again.
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Next delay: `min(cap, base * 2^attempt)`, jittered into the upper
    /// half of the window.
    pub fn next_delay(&mut self) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let cap_ms = self.cap.as_millis() as u64;
        let full_ms = base_ms
            .saturating_mul(1u64 << self.attempt.min(20))
            .min(cap_ms)
            .max(1);
        self.attempt = self.attempt.saturating_add(1);

        let ms = rand::thread_rng().gen_range(full_ms / 2..=full_ms);
        Duration::from_millis(ms)
    }
}
