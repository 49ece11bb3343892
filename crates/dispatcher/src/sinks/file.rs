//! FileSink - append-only log file

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use contracts::{ContractError, DispatchPayload, DispatchSink, OverflowReason, OverflowSink};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Sink that appends one line per payload to a file
///
/// Parent directories are created on open.
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open (or create) the file in append mode
    pub async fn open(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        debug!(path = %path.display(), "FileSink opened");
        Ok(Self {
            name: name.into(),
            path,
            file,
        })
    }

    /// Create from params map (requires `path`)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let path = params.get("path").ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file sink requires a 'path' parameter",
            )
        })?;
        Self::open(name, path).await
    }

    /// Open a second, synchronous append handle for overflow lines
    pub fn overflow(&self) -> std::io::Result<FileOverflowSink> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(FileOverflowSink {
            name: self.name.clone(),
            file: Mutex::new(file),
        })
    }
}

impl DispatchSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_write", skip(self, payload), fields(sink = %self.name))]
    async fn write(&mut self, payload: &DispatchPayload) -> Result<(), ContractError> {
        let mut line = payload.render();
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        self.file
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}

/// Overflow writer: `[OVERFLOW] <line>` appended to the same file
pub struct FileOverflowSink {
    name: String,
    file: Mutex<std::fs::File>,
}

impl OverflowSink for FileOverflowSink {
    fn write_overflow(
        &self,
        payload: &DispatchPayload,
        reason: OverflowReason,
    ) -> Result<(), ContractError> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "[{}] {}", reason.tag(), payload.render())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}
