//! Manual token-bucket rate limiter gating provider invocation.
//!
//! One bucket per provider tier (primary/fallback/reflection). Exhaustion is
//! treated by the cascade the same as a provider timeout: it advances to the
//! next tier rather than queuing, since a queued wait could blow the
//! per-message latency budget.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// `capacity` tokens, refilled at `refill_per_sec` tokens/second.
    #[must_use]
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Attempt to take one token. Returns `false` if the bucket is empty.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let elapsed = state.last_refill.elapsed();
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        state.last_refill = Instant::now();

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// A limiter with no effective cap, for providers without a configured
/// rate (or in tests).
#[must_use]
pub fn unlimited() -> TokenBucket {
    TokenBucket::new(u32::MAX, f64::from(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_then_refills() {
        let bucket = TokenBucket::new(2, 100.0);
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        std::thread::sleep(Duration::from_millis(20));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn unlimited_never_exhausts() {
        let bucket = unlimited();
        for _ in 0..1000 {
            assert!(bucket.try_acquire());
        }
    }
}
