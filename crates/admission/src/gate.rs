//! AdmissionGate - the shared, swappable bucket

use std::sync::{Arc, PoisonError, RwLock};

use contracts::RateLimitConfig;
use tracing::info;

use crate::bucket::TokenBucket;

/// Process-wide admission gate
///
/// `reconfigure` swaps in a fresh bucket; a request racing the swap may be
/// checked against either bucket.
#[derive(Debug)]
pub struct AdmissionGate {
    bucket: RwLock<Arc<TokenBucket>>,
}

impl AdmissionGate {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            bucket: RwLock::new(Arc::new(TokenBucket::new(config))),
        }
    }

    /// Whether the request may proceed
    pub fn allow(&self) -> bool {
        self.current().allow()
    }

    /// Replace the bucket (starts full)
    pub fn reconfigure(&self, config: RateLimitConfig) {
        let fresh = Arc::new(TokenBucket::new(config));
        *self.bucket.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        info!(
            rate_per_sec = config.rate_per_sec,
            burst = config.burst,
            "Admission gate reconfigured"
        );
    }

    pub fn config(&self) -> RateLimitConfig {
        self.current().config()
    }

    fn current(&self) -> Arc<TokenBucket> {
        Arc::clone(&self.bucket.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconfigure_replaces_bucket() {
        let gate = AdmissionGate::new(RateLimitConfig::new(0.001, 1));
        assert!(gate.allow());
        assert!(!gate.allow());

        gate.reconfigure(RateLimitConfig::new(0.001, 3));
        assert_eq!(gate.config().burst, 3);
        assert!(gate.allow());
        assert!(gate.allow());
        assert!(gate.allow());
        assert!(!gate.allow());
    }
}
