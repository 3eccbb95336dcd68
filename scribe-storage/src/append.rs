//! Best-effort JSONL appending
//!
//! Writes are the only shared-resource surface in the system: many exchanges
//! may target the same destination file concurrently, so appends to one path
//! are serialized through a per-destination lock while appends to different
//! paths proceed in parallel.

use crate::error::StorageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{trace, warn};

/// Append one JSON value as a JSONL line.
///
/// Appends are best-effort: implementations report failures out-of-band as a
/// warning log naming the destination and cause, and never surface them to
/// the caller. A broken log destination must not disturb the traffic being
/// observed.
#[async_trait]
pub trait LineAppender: Send + Sync {
    /// Append `payload` as one line at `path`, creating parent storage on
    /// demand.
    async fn append(&self, path: &Path, payload: &Value);
}

/// File-backed JSONL appender.
#[derive(Debug, Default, Clone)]
pub struct JsonlAppender {
    // One async lock per destination; the map itself is only held long
    // enough to fetch or create an entry.
    locks: Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>,
}

impl JsonlAppender {
    /// Create a new appender.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn write_line(&self, path: &Path, payload: &Value) -> StorageResult<()> {
        let mut line = serde_json::to_vec(payload)?;
        line.push(b'\n');

        let lock = self.lock_for(path);
        let _guard = lock.lock().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl LineAppender for JsonlAppender {
    async fn append(&self, path: &Path, payload: &Value) {
        trace!("Appending JSONL record to {:?}", path);
        if let Err(error) = self.write_line(path, payload).await {
            warn!("Failed to write JSONL to {:?}: {}", path, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn appends_single_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        let appender = JsonlAppender::new();

        appender.append(&path, &json!({"key": "value"})).await;

        assert_eq!(read_lines(&path), vec![json!({"key": "value"})]);
    }

    #[tokio::test]
    async fn appends_preserve_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        let appender = JsonlAppender::new();

        let payloads = [
            json!({"id": 1, "name": "first"}),
            json!({"id": 2, "name": "second"}),
            json!({"id": 3, "name": "third"}),
        ];
        for payload in &payloads {
            appender.append(&path, payload).await;
        }

        assert_eq!(read_lines(&path), payloads);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subdir").join("nested").join("test.jsonl");
        let appender = JsonlAppender::new();

        appender.append(&path, &json!({"key": "value"})).await;

        assert!(path.exists());
        assert_eq!(read_lines(&path), vec![json!({"key": "value"})]);
    }

    #[tokio::test]
    async fn round_trips_unicode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        let appender = JsonlAppender::new();
        let payload = json!({"message": "Hello 世界", "emoji": "🌟"});

        appender.append(&path, &payload).await;

        assert_eq!(read_lines(&path), vec![payload]);
    }

    #[traced_test]
    #[tokio::test]
    async fn warns_instead_of_failing_on_io_error() {
        let dir = TempDir::new().unwrap();
        // A file where a parent directory should be makes create_dir_all fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"occupied").unwrap();
        let path = blocker.join("test.jsonl");
        let appender = JsonlAppender::new();

        appender.append(&path, &json!({"key": "value"})).await;

        assert!(logs_contain("Failed to write JSONL"));
    }

    #[tokio::test]
    async fn concurrent_appends_to_one_destination_stay_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.jsonl");
        let appender = JsonlAppender::new();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let appender = appender.clone();
                let path = path.clone();
                tokio::spawn(async move {
                    appender
                        .append(&path, &json!({"task": i, "padding": "x".repeat(256)}))
                        .await;
                })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 8);
        for line in lines {
            assert!(line.get("task").is_some());
        }
    }
}
