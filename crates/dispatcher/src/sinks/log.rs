//! LogSink - routes payload lines into tracing

use contracts::{ContractError, DispatchPayload, DispatchSink, OverflowReason, OverflowSink};
use tracing::{info, instrument, warn};

/// Sink that emits each payload as a tracing event
///
/// Serves as both primary and overflow sink; overflow lines are logged at
/// WARN with the overflow tag.
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DispatchSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, payload),
        fields(sink = %self.name, kind = payload.kind.label())
    )]
    async fn write(&mut self, payload: &DispatchPayload) -> Result<(), ContractError> {
        info!(sink = %self.name, line = %payload.render(), "dispatch");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

impl OverflowSink for LogSink {
    fn write_overflow(
        &self,
        payload: &DispatchPayload,
        reason: OverflowReason,
    ) -> Result<(), ContractError> {
        warn!(
            sink = %self.name,
            tag = reason.tag(),
            line = %payload.render(),
            "dispatch overflow"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("audit");
        let payload = DispatchPayload::audit("CREATE", Some(1), "name=Ada");
        assert!(sink.write(&payload).await.is_ok());
        assert!(sink
            .write_overflow(&payload, OverflowReason::QueueFull)
            .is_ok());
        assert_eq!(DispatchSink::name(&sink), "audit");
    }
}
