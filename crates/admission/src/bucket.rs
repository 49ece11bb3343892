//! Token bucket

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use contracts::RateLimitConfig;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with lazy refill
///
/// Starts full. Every check first credits `elapsed * rate` tokens (capped at
/// `burst`), then takes one token if available. The state lock is held only
/// for that arithmetic, so tokens are never lost or spent twice.
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_start(config, Instant::now())
    }

    /// Full bucket whose refill clock starts at `now`
    pub fn with_start(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: config.burst as f64,
                last_refill: now,
            }),
            config,
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Take one token if available
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// `allow` against an explicit clock reading
    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state, now);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens available at `now` (refills, takes nothing)
    pub fn available_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state, now);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        // Readings older than the last refill credit nothing.
        let elapsed = now.saturating_duration_since(state.last_refill);
        if elapsed.is_zero() {
            return;
        }
        let credited = elapsed.as_secs_f64() * self.config.rate_per_sec;
        state.tokens = (state.tokens + credited).min(self.config.burst as f64);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_two_per_second_burst_two() {
        let start = Instant::now();
        let bucket = TokenBucket::with_start(RateLimitConfig::new(2.0, 2), start);
        let results: Vec<bool> = (0..3).map(|_| bucket.allow_at(start)).collect();
        assert_eq!(results, vec![true, true, false]);
    }

    #[test]
    fn test_burst_then_refill_after_idle_second() {
        let start = Instant::now();
        let bucket = TokenBucket::with_start(RateLimitConfig::new(1000.0, 5000), start);

        for _ in 0..5000 {
            assert!(bucket.allow_at(start));
        }
        assert!(!bucket.allow_at(start));

        let later = start + Duration::from_secs(1);
        let available = bucket.available_at(later);
        assert!((available - 1000.0).abs() < 1e-6, "got {available}");
    }

    #[test]
    fn test_refill_capped_at_burst() {
        let start = Instant::now();
        let bucket = TokenBucket::with_start(RateLimitConfig::new(100.0, 10), start);
        assert!(bucket.allow_at(start));
        let available = bucket.available_at(start + Duration::from_secs(60));
        assert_eq!(available, 10.0);
    }

    #[test]
    fn test_stale_clock_reading_credits_nothing() {
        let start = Instant::now();
        let bucket =
            TokenBucket::with_start(RateLimitConfig::new(1.0, 1), start + Duration::from_secs(5));
        assert!(bucket.allow_at(start + Duration::from_secs(5)));
        assert!(!bucket.allow_at(start));
    }

    #[test]
    fn test_concurrent_allows_spend_each_token_once() {
        // Negligible refill over the test's lifetime.
        let bucket = Arc::new(TokenBucket::new(RateLimitConfig::new(0.001, 500)));
        let granted = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let bucket = Arc::clone(&bucket);
                let granted = Arc::clone(&granted);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if bucket.allow() {
                            granted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(granted.load(Ordering::Relaxed), 500);
    }
}
