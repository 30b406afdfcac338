//! Status artifact consumed by an external preview host.

use crate::ports::WritePort;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::debug;
use vizbuild_types::StatusRecord;

/// Writes `<drop>/status` after every build attempt.
#[derive(Clone)]
pub struct StatusPublisher {
    path: Utf8PathBuf,
    plugin_id: String,
    writer: Arc<dyn WritePort>,
}

impl std::fmt::Debug for StatusPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPublisher")
            .field("path", &self.path)
            .field("plugin_id", &self.plugin_id)
            .finish_non_exhaustive()
    }
}

impl StatusPublisher {
    /// `plugin_id` is the namespace override when given, else the declared
    /// GUID.
    pub fn new(path: Utf8PathBuf, plugin_id: impl Into<String>, writer: Arc<dyn WritePort>) -> Self {
        Self {
            path,
            plugin_id: plugin_id.into(),
            writer,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub async fn publish_ready(&self) -> anyhow::Result<StatusRecord> {
        let timestamp_millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let record = StatusRecord::Ready {
            timestamp_millis,
            plugin_id: self.plugin_id.clone(),
        };
        self.write(&record).await?;
        Ok(record)
    }

    pub async fn publish_failed(&self) -> anyhow::Result<()> {
        self.write(&StatusRecord::Failed).await
    }

    async fn write(&self, record: &StatusRecord) -> anyhow::Result<()> {
        self.writer
            .write_file(&self.path, record.to_artifact().as_bytes())
            .await
            .with_context(|| format!("update status {}", self.path))?;
        debug!(path = %self.path, ready = record.is_ready(), "status updated");
        Ok(())
    }

    /// Reads the current artifact. `Ok(None)` when it does not exist yet or
    /// is not a recognizable record.
    pub async fn read(&self) -> anyhow::Result<Option<StatusRecord>> {
        match fs_err::tokio::read_to_string(&self.path).await {
            Ok(text) => Ok(StatusRecord::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context(format!("read status {}", self.path))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsWritePort;
    use tempfile::TempDir;

    fn publisher(temp: &TempDir) -> StatusPublisher {
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        StatusPublisher::new(
            root.join(".tmp/drop/status"),
            "statusVisual",
            Arc::new(FsWritePort),
        )
    }

    #[tokio::test]
    async fn ready_writes_timestamp_and_id() {
        let temp = TempDir::new().expect("temp dir");
        let status = publisher(&temp);
        let written = status.publish_ready().await.expect("publish");

        let raw = std::fs::read_to_string(status.path()).expect("read");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].parse::<u64>().expect("millis") > 0);
        assert_eq!(lines[1], "statusVisual");
        assert_eq!(status.read().await.expect("read"), Some(written));
    }

    #[tokio::test]
    async fn failure_writes_marker() {
        let temp = TempDir::new().expect("temp dir");
        let status = publisher(&temp);
        status.publish_ready().await.expect("publish");
        status.publish_failed().await.expect("publish");

        assert_eq!(std::fs::read_to_string(status.path()).expect("read"), "error");
        assert_eq!(status.read().await.expect("read"), Some(StatusRecord::Failed));
    }

    #[tokio::test]
    async fn read_before_first_build_is_none() {
        let temp = TempDir::new().expect("temp dir");
        assert_eq!(publisher(&temp).read().await.expect("read"), None);
    }
}
