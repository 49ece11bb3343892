//! Dispatcher counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::DispatchSnapshot;

/// Counters for a single dispatcher
///
/// `pending` tracks payloads accepted into the queue and not yet written;
/// the rest only ever grow.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pending: AtomicUsize,
    written_count: AtomicU64,
    failure_count: AtomicU64,
    overflow_count: AtomicU64,
    overflow_failure_count: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn inc_pending(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrement pending, returning the new value
    pub(crate) fn dec_pending(&self) -> usize {
        self.pending.fetch_sub(1, Ordering::AcqRel).saturating_sub(1)
    }

    pub fn written_count(&self) -> u64 {
        self.written_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_written(&self) {
        self.written_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_overflow(&self) {
        self.overflow_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn overflow_failure_count(&self) -> u64 {
        self.overflow_failure_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_overflow_failure(&self) {
        self.overflow_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            pending: self.pending(),
            written_count: self.written_count(),
            failure_count: self.failure_count(),
            overflow_count: self.overflow_count(),
            overflow_failure_count: self.overflow_failure_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_round_trip() {
        let metrics = DispatchMetrics::new();
        metrics.inc_pending();
        metrics.inc_pending();
        assert_eq!(metrics.pending(), 2);
        assert_eq!(metrics.dec_pending(), 1);
        assert_eq!(metrics.dec_pending(), 0);
    }

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = DispatchMetrics::new();
        metrics.inc_written();
        metrics.inc_overflow();
        metrics.inc_overflow();
        metrics.inc_failure();
        let snap = metrics.snapshot();
        assert_eq!(snap.written_count, 1);
        assert_eq!(snap.overflow_count, 2);
        assert_eq!(snap.failure_count, 1);
        assert_eq!(snap.overflow_failure_count, 0);
    }
}
