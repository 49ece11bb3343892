//! Sink traits - Dispatcher output interface
//!
//! A dispatcher writes to two sinks: the primary sink, driven by its single
//! consumer task, and the overflow sink, called inline on the producer's
//! thread when the queue cannot take a payload.

use crate::{ContractError, DispatchPayload, OverflowReason};

/// Primary output trait
///
/// All primary sink implementations must implement this trait.
#[trait_variant::make(DispatchSink: Send)]
pub trait LocalDispatchSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one payload
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, payload: &DispatchPayload) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;
}

/// Synchronous fallback output
///
/// Shared between all producers of one dispatcher, so it takes `&self`.
/// Implementations must keep a single call bounded (one local write).
pub trait OverflowSink: Send + Sync {
    /// Append one payload, tagged with the reason it bypassed the queue
    fn write_overflow(
        &self,
        payload: &DispatchPayload,
        reason: OverflowReason,
    ) -> Result<(), ContractError>;
}
