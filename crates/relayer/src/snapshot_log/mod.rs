//! Append-only JSON Lines log of snapshots.
//!
//! A single writer task owns the path; [`AppendLog::append`] only serializes the
//! record and hands the finished line over a channel, so callers never wait on
//! disk and lines never interleave. Each line reopens the path in append mode,
//! so a removed or rotated file is recreated on the next write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle for appending records. Cloning shares the same writer task.
#[derive(Debug, Clone)]
pub struct AppendLog {
    tx: mpsc::UnboundedSender<String>,
}

impl AppendLog {
    /// Start the writer task for `path`. No I/O happens until the first append.
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_lines(path.as_ref().to_path_buf(), rx));
        (Self { tx }, handle)
    }

    /// Queue `record` as one line. Failures are logged, never returned.
    pub fn append<T: Serialize>(&self, record: &T) {
        let mut line = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("snapshot log: serialize failed: {}", e);
                return;
            }
        };
        line.push('\n');
        if self.tx.send(line).is_err() {
            tracing::error!("snapshot log: writer stopped, record dropped");
        }
    }
}

async fn write_lines(path: PathBuf, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = append_line(&path, &line).await {
            tracing::error!(path = %path.display(), "snapshot log write failed: {:#}", e);
        }
    }
}

async fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("open snapshot log {}", path.display()))?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
