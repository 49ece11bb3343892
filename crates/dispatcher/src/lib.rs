//! # Dispatcher
//!
//! 异步副作用分发模块。
//!
//! 负责：
//! - 非阻塞 `submit`，队列满时同步写入 overflow sink
//! - 每个实例一个消费任务，按 FIFO 写入主 sink
//! - 有界 `drain`，关闭时排空队列

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DispatchPayload, DispatchSink, DispatchSnapshot, OverflowSink};
pub use dispatcher::{create_dispatcher, DrainReport, Dispatcher};
pub use error::DispatcherError;
pub use handle::DispatchHandle;
pub use metrics::DispatchMetrics;
pub use sinks::{
    FileOverflowSink, FileSink, LogSink, MemoryCapture, MemorySink, StreamOverflowSink,
    StreamSink,
};
