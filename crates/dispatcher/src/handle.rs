//! DispatchHandle - producer side of a dispatcher

use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{error, warn};

use contracts::{DispatchPayload, DispatchSnapshot, OverflowReason, OverflowSink};

use crate::metrics::DispatchMetrics;

/// State shared between producers, the worker and `drain`
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) metrics: DispatchMetrics,
    idle: Notify,
    overflow: Arc<dyn OverflowSink>,
}

impl Shared {
    pub(crate) fn new(name: String, overflow: Arc<dyn OverflowSink>) -> Self {
        Self {
            name,
            metrics: DispatchMetrics::new(),
            idle: Notify::new(),
            overflow,
        }
    }

    /// Mark one accepted payload as done
    pub(crate) fn complete_one(&self) {
        if self.metrics.dec_pending() == 0 {
            self.idle.notify_waiters();
        }
    }

    /// Resolve once no accepted payload is left unwritten
    pub(crate) async fn wait_idle(&self) {
        loop {
            // Registered before the check so a wakeup in between is not missed.
            let notified = self.idle.notified();
            if self.metrics.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn write_overflow(&self, payload: DispatchPayload, reason: OverflowReason) {
        match self.overflow.write_overflow(&payload, reason) {
            Ok(()) => {
                self.metrics.inc_overflow();
                warn!(
                    dispatcher = %self.name,
                    kind = payload.kind.label(),
                    reason = %reason,
                    "Payload routed to overflow sink"
                );
            }
            Err(e) => {
                self.metrics.inc_overflow_failure();
                error!(
                    dispatcher = %self.name,
                    kind = payload.kind.label(),
                    reason = %reason,
                    error = %e,
                    "Overflow write failed, payload lost"
                );
            }
        }
    }
}

/// Cloneable handle used by request handlers to submit payloads
///
/// Handles stay valid after the dispatcher is drained; late submissions go
/// straight to the overflow sink tagged `CLOSED`.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<DispatchPayload>,
    shared: Arc<Shared>,
}

impl DispatchHandle {
    pub(crate) fn new(tx: mpsc::Sender<DispatchPayload>, shared: Arc<Shared>) -> Self {
        Self { tx, shared }
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Dispatcher name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current counters
    pub fn snapshot(&self) -> DispatchSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Submit a payload (non-blocking, never fails)
    ///
    /// Enqueues when there is room; otherwise the payload is written
    /// synchronously to the overflow sink on the caller's task.
    pub fn submit(&self, payload: DispatchPayload) {
        // Counted before the send so the worker can never complete it first.
        self.shared.metrics.inc_pending();
        match self.tx.try_send(payload) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(payload)) => {
                self.shared.complete_one();
                self.shared.write_overflow(payload, OverflowReason::QueueFull);
            }
            Err(mpsc::error::TrySendError::Closed(payload)) => {
                self.shared.complete_one();
                self.shared.write_overflow(payload, OverflowReason::Closed);
            }
        }
    }
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("name", &self.shared.name)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
