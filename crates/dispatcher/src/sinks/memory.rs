//! MemorySink - in-process capture for tests and embedding

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::{ContractError, DispatchPayload, DispatchSink, OverflowReason, OverflowSink};

type Overflowed = Vec<(OverflowReason, DispatchPayload)>;

/// Shared capture buffers
///
/// Acts as the overflow sink directly; `sink()` builds a primary sink that
/// writes into the same capture.
#[derive(Clone, Default)]
pub struct MemoryCapture {
    written: Arc<Mutex<Vec<DispatchPayload>>>,
    overflowed: Arc<Mutex<Overflowed>>,
}

impl MemoryCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary sink feeding this capture
    pub fn sink(&self, name: impl Into<String>) -> MemorySink {
        MemorySink {
            name: name.into(),
            capture: self.clone(),
            delay: None,
            fail_on: None,
        }
    }

    /// Payloads written by the primary sink, in write order
    pub fn written(&self) -> Vec<DispatchPayload> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Payloads that took the overflow path
    pub fn overflowed(&self) -> Overflowed {
        self.overflowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OverflowSink for MemoryCapture {
    fn write_overflow(
        &self,
        payload: &DispatchPayload,
        reason: OverflowReason,
    ) -> Result<(), ContractError> {
        self.overflowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((reason, payload.clone()));
        Ok(())
    }
}

/// Primary sink with optional latency and failure injection
pub struct MemorySink {
    name: String,
    capture: MemoryCapture,
    delay: Option<Duration>,
    fail_on: Option<String>,
}

impl MemorySink {
    /// Sleep before every write
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail writes whose context equals `context`
    pub fn fail_on(mut self, context: impl Into<String>) -> Self {
        self.fail_on = Some(context.into());
        self
    }
}

impl DispatchSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, payload: &DispatchPayload) -> Result<(), ContractError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.as_deref() == Some(payload.context.as_str()) {
            return Err(ContractError::sink_write(&self.name, "injected failure"));
        }
        self.capture
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
