//! Sink implementations
//!
//! Each sink appends one rendered line per payload. Every primary sink has a
//! matching synchronous overflow writer for the queue-full path.

mod file;
mod log;
mod memory;
mod stream;

pub use self::file::{FileOverflowSink, FileSink};
pub use self::log::LogSink;
pub use self::memory::{MemoryCapture, MemorySink};
pub use self::stream::{StreamOverflowSink, StreamSink};
