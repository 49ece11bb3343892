//! Dispatcher statistics shared between the dispatcher and telemetry crates.

use serde::Serialize;

/// Point-in-time view of one dispatcher's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSnapshot {
    /// Payloads accepted into the queue but not yet written
    pub pending: usize,
    /// Payloads written to the primary sink
    pub written_count: u64,
    /// Primary sink write failures
    pub failure_count: u64,
    /// Payloads routed to the overflow sink
    pub overflow_count: u64,
    /// Overflow sink write failures
    pub overflow_failure_count: u64,
}
