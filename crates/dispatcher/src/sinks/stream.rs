//! StreamSink - process stdout / stderr

use std::io::Write as _;

use contracts::{ContractError, DispatchPayload, DispatchSink, OverflowReason, OverflowSink};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Which process stream to append to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTarget {
    Stdout,
    Stderr,
}

/// Primary sink writing `[NAME] <line>` to a process stream
pub struct StreamSink {
    name: String,
    prefix: String,
    target: StreamTarget,
    out: Box<dyn AsyncWrite + Send + Unpin>,
}

impl StreamSink {
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name.into(), StreamTarget::Stdout)
    }

    pub fn stderr(name: impl Into<String>) -> Self {
        Self::new(name.into(), StreamTarget::Stderr)
    }

    fn new(name: String, target: StreamTarget) -> Self {
        let out: Box<dyn AsyncWrite + Send + Unpin> = match target {
            StreamTarget::Stdout => Box::new(tokio::io::stdout()),
            StreamTarget::Stderr => Box::new(tokio::io::stderr()),
        };
        Self {
            prefix: format!("[{}]", name.to_uppercase()),
            name,
            target,
            out,
        }
    }

    /// Synchronous overflow writer for the same stream
    pub fn overflow(&self) -> StreamOverflowSink {
        StreamOverflowSink {
            prefix: self.prefix.clone(),
            target: self.target,
        }
    }
}

impl DispatchSink for StreamSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, payload: &DispatchPayload) -> Result<(), ContractError> {
        let line = format!("{} {}\n", self.prefix, payload.render());
        self.out
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        self.out.flush().await?;
        Ok(())
    }
}

/// Overflow writer: `[NAME][OVERFLOW] <line>` on the same stream
#[derive(Debug, Clone)]
pub struct StreamOverflowSink {
    prefix: String,
    target: StreamTarget,
}

impl StreamOverflowSink {
    fn format_line(&self, payload: &DispatchPayload, reason: OverflowReason) -> String {
        format!("{}[{}] {}", self.prefix, reason.tag(), payload.render())
    }
}

impl OverflowSink for StreamOverflowSink {
    fn write_overflow(
        &self,
        payload: &DispatchPayload,
        reason: OverflowReason,
    ) -> Result<(), ContractError> {
        let line = self.format_line(payload, reason);
        match self.target {
            StreamTarget::Stdout => writeln!(std::io::stdout().lock(), "{line}")?,
            StreamTarget::Stderr => writeln!(std::io::stderr().lock(), "{line}")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_line_is_tagged() {
        let sink = StreamSink::stderr("errors");
        let overflow = sink.overflow();
        let payload = DispatchPayload::error("rate_limit", None, "Rate limit exceeded");
        let line = overflow.format_line(&payload, OverflowReason::QueueFull);
        assert!(line.starts_with("[ERRORS][OVERFLOW] operation=rate_limit | error=<nil>"));

        let closed = overflow.format_line(&payload, OverflowReason::Closed);
        assert!(closed.starts_with("[ERRORS][CLOSED] "));
    }

    #[tokio::test]
    async fn test_stdout_write() {
        let mut sink = StreamSink::stdout("audit");
        let payload = DispatchPayload::audit("LIST_USERS", None, "count=0");
        assert!(sink.write(&payload).await.is_ok());
        assert!(sink.flush().await.is_ok());
    }
}
