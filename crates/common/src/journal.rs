//! Append-only text logs
//!
//! Each line is `[timestamp] message`. Used for worker arrivals and system
//! events on command nodes, and for the standby's archive.

use crate::error::Result;
use chrono::Utc;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only log file shared by a node's handlers
#[derive(Debug)]
pub struct EventLog {
    file: Mutex<File>,
}

impl EventLog {
    /// Open (or create) the log at `path` in append mode
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path).await?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one timestamped line
    pub async fn append(&self, message: &str) -> Result<()> {
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), message);
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
