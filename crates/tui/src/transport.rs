//! Live-mode transport that re-reads a run-model file when it changes.

use std::path::PathBuf;
use std::time::SystemTime;

use rf_timeline_core::{RunModel, Transport, TransportError};

/// Polls a JSON file written by the model interpreter.
///
/// A change is detected from the file's modification time and length. A
/// file that fails to parse (typically caught mid-write) is retried on the
/// next poll.
#[derive(Debug)]
pub struct FileTransport {
    path: PathBuf,
    seen: Option<(Option<SystemTime>, u64)>,
}

impl FileTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: None,
        }
    }

    /// Treat the file's current state as already loaded.
    pub fn mark_seen(&mut self) -> Result<(), TransportError> {
        self.seen = Some(self.stamp()?);
        Ok(())
    }

    fn stamp(&self) -> Result<(Option<SystemTime>, u64), TransportError> {
        let meta = std::fs::metadata(&self.path)?;
        Ok((meta.modified().ok(), meta.len()))
    }
}

impl Transport for FileTransport {
    fn poll(&mut self) -> Result<Option<RunModel>, TransportError> {
        let stamp = self.stamp()?;
        if self.seen == Some(stamp) {
            return Ok(None);
        }
        let data = std::fs::read(&self.path)?;
        let model = RunModel::from_json(&data)?;
        tracing::debug!(path = %self.path.display(), bytes = data.len(), "run model reloaded");
        self.seen = Some(stamp);
        Ok(Some(model))
    }
}
