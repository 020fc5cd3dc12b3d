//! Hand-off of failure artifacts to a reporting system.

use crate::result::SnapshotResult;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Content type of every artifact this crate produces
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// One file offered to a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File on disk
    pub path: PathBuf,
    /// Display name ("Diff Image", ...)
    pub name: String,
    /// MIME type
    pub content_type: String,
}

impl Attachment {
    /// PNG attachment
    #[must_use]
    pub fn png(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content_type: PNG_CONTENT_TYPE.to_string(),
        }
    }
}

/// Receives artifact files after a failed comparison
pub trait ReportSink: Send + Sync {
    /// Attach one file
    ///
    /// # Errors
    ///
    /// Implementations return an error if the attachment cannot be recorded.
    fn attach(&self, attachment: &Attachment) -> SnapshotResult<()>;
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn attach(&self, _attachment: &Attachment) -> SnapshotResult<()> {
        Ok(())
    }
}

/// Sink that keeps attachments in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    attachments: Mutex<Vec<Attachment>>,
}

impl CollectingSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attachments received so far
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReportSink for CollectingSink {
    fn attach(&self, attachment: &Attachment) -> SnapshotResult<()> {
        self.attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attachment.clone());
        Ok(())
    }
}

/// Sink that appends one JSON object per attachment to a manifest file
#[derive(Debug, Clone)]
pub struct ManifestSink {
    path: PathBuf,
}

impl ManifestSink {
    /// Manifest at `path`; created on first attachment
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manifest location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for ManifestSink {
    fn attach(&self, attachment: &Attachment) -> SnapshotResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(attachment)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.attach(&Attachment::png("a.png", "Diff Image")).unwrap();
        sink.attach(&Attachment::png("b.png", "Actual Image")).unwrap();

        let names: Vec<_> = sink.attachments().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["Diff Image", "Actual Image"]);
    }

    #[test]
    fn test_collecting_sink_survives_poisoned_lock() {
        let sink = std::sync::Arc::new(CollectingSink::new());
        let holder = std::sync::Arc::clone(&sink);
        let _ = std::thread::spawn(move || {
            let _guard = holder.attachments.lock().unwrap();
            panic!("panic while holding the lock");
        })
        .join();
        assert!(sink.attachments.is_poisoned());

        sink.attach(&Attachment::png("a.png", "Diff Image")).unwrap();
        assert_eq!(sink.attachments().len(), 1);
    }

    #[test]
    fn test_manifest_sink_appends_json_lines() {
        let temp = TempDir::new().unwrap();
        let sink = ManifestSink::new(temp.path().join("reports").join("attachments.jsonl"));

        sink.attach(&Attachment::png("x/Diff.png", "Diff Image"))
            .unwrap();
        sink.attach(&Attachment::png("x/Actual.png", "Actual Image"))
            .unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let parsed: Vec<Attachment> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].content_type, "image/png");
        assert_eq!(parsed[1].path, PathBuf::from("x/Actual.png"));
    }

    #[test]
    fn test_null_sink_accepts() {
        assert!(NullSink.attach(&Attachment::png("a.png", "x")).is_ok());
    }
}
