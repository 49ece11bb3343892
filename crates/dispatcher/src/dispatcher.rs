//! Dispatcher - single consumer task per queue, plus the drain protocol

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    DispatchPayload, DispatchSink, DispatchSnapshot, OverflowSink, SinkConfig, SinkType,
};

use crate::error::DispatcherError;
use crate::handle::{DispatchHandle, Shared};
use crate::sinks::{FileSink, LogSink, StreamSink};

/// Outcome of a `drain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Dispatcher name
    pub dispatcher: String,
    /// True when every accepted payload was written before the deadline
    pub completed: bool,
    /// Payloads still unwritten when the worker stopped (lost on timeout)
    pub pending: usize,
    /// Total payloads written to the primary sink
    pub written: u64,
    /// Time spent draining
    pub elapsed: Duration,
}

/// A running dispatcher: bounded queue, one worker, overflow fallback
pub struct Dispatcher {
    handle: DispatchHandle,
    close_tx: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Spawn the worker task
    ///
    /// `capacity` below 1 is raised to 1.
    pub fn spawn<S: DispatchSink + Send + 'static>(
        sink: S,
        overflow: Arc<dyn OverflowSink>,
        capacity: usize,
    ) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        let shared = Arc::new(Shared::new(name, overflow));

        let worker_shared = Arc::clone(&shared);
        let worker = tokio::spawn(async move {
            dispatch_worker(sink, rx, close_rx, worker_shared).await;
        });

        Self {
            handle: DispatchHandle::new(tx, shared),
            close_tx,
            worker,
        }
    }

    /// Dispatcher name
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Producer handle (cheap to clone)
    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Current counters
    pub fn snapshot(&self) -> DispatchSnapshot {
        self.handle.snapshot()
    }

    /// Wait for the queue to empty, then stop the worker
    ///
    /// Bounded by `timeout`; when it expires the worker is aborted and the
    /// unwritten payloads are reported as lost.
    #[instrument(name = "dispatcher_drain", skip(self), fields(dispatcher = %self.name()))]
    pub async fn drain(self, timeout: Duration) -> DrainReport {
        let started = Instant::now();
        let Self {
            handle,
            close_tx,
            mut worker,
        } = self;

        let idle = tokio::time::timeout(timeout, handle.shared().wait_idle())
            .await
            .is_ok();
        if !idle {
            warn!(
                dispatcher = %handle.name(),
                pending = handle.snapshot().pending,
                "Drain deadline reached before queue emptied"
            );
        }

        if close_tx.send(()).is_err() {
            debug!(dispatcher = %handle.name(), "Worker already stopped");
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        let stopped = match tokio::time::timeout(remaining, &mut worker).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(dispatcher = %handle.name(), error = ?e, "Worker task panicked");
                false
            }
            Err(_) => {
                worker.abort();
                false
            }
        };

        let snapshot = handle.snapshot();
        if snapshot.pending > 0 {
            error!(
                dispatcher = %handle.name(),
                lost = snapshot.pending,
                "Dispatcher stopped with unwritten payloads"
            );
        }

        let report = DrainReport {
            dispatcher: handle.name().to_string(),
            completed: idle && stopped && snapshot.pending == 0,
            pending: snapshot.pending,
            written: snapshot.written_count,
            elapsed: started.elapsed(),
        };
        info!(
            dispatcher = %report.dispatcher,
            completed = report.completed,
            written = report.written,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Dispatcher drained"
        );
        report
    }
}

/// Create a dispatcher from configuration
#[instrument(
    name = "dispatcher_create",
    skip(config),
    fields(dispatcher = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_dispatcher(config: &SinkConfig) -> Result<Dispatcher, DispatcherError> {
    let capacity = config.queue_capacity;
    let dispatcher = match config.sink_type {
        SinkType::Log => {
            let overflow = Arc::new(LogSink::new(&config.name));
            Dispatcher::spawn(LogSink::new(&config.name), overflow, capacity)
        }
        SinkType::Stdout => {
            let sink = StreamSink::stdout(&config.name);
            let overflow = Arc::new(sink.overflow());
            Dispatcher::spawn(sink, overflow, capacity)
        }
        SinkType::Stderr => {
            let sink = StreamSink::stderr(&config.name);
            let overflow = Arc::new(sink.overflow());
            Dispatcher::spawn(sink, overflow, capacity)
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            let overflow = sink
                .overflow()
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Dispatcher::spawn(sink, Arc::new(overflow), capacity)
        }
    };
    debug!(dispatcher = %config.name, capacity, "Dispatcher started");
    Ok(dispatcher)
}

/// Worker task that consumes payloads in FIFO order
#[instrument(
    name = "dispatch_worker_loop",
    skip(sink, rx, close_rx, shared),
    fields(dispatcher = %shared.name)
)]
async fn dispatch_worker<S: DispatchSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<DispatchPayload>,
    mut close_rx: oneshot::Receiver<()>,
    shared: Arc<Shared>,
) {
    debug!("Dispatch worker started");

    loop {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some(payload) => write_payload(&mut sink, &payload, &shared).await,
                None => break,
            },
            // Also fires when the Dispatcher is dropped without draining.
            _ = &mut close_rx => {
                rx.close();
                while let Some(payload) = rx.recv().await {
                    write_payload(&mut sink, &payload, &shared).await;
                }
                break;
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "Flush failed on shutdown");
    }

    debug!("Dispatch worker stopped");
}

async fn write_payload<S: DispatchSink>(sink: &mut S, payload: &DispatchPayload, shared: &Shared) {
    match sink.write(payload).await {
        Ok(()) => shared.metrics.inc_written(),
        Err(e) => {
            shared.metrics.inc_failure();
            error!(
                dispatcher = %shared.name,
                kind = payload.kind.label(),
                error = %e,
                "Primary sink write failed"
            );
        }
    }
    shared.complete_one();
}
