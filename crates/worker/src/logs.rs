//! Per-task diagnostic log storage.
//!
//! Written once by the sandbox when a run finishes, read any number of
//! times by task queries. Logs are ordered lists of text lines.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use folio_core::types::TaskId;
use tokio::sync::RwLock;

/// First line of every task log.
pub const LOG_HEADER: &str = "SOLVER EXECUTION LOG:";

#[derive(Debug, thiserror::Error)]
pub enum LogStoreError {
    #[error("no log recorded for task {0}")]
    Missing(TaskId),

    #[error("log storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait TaskLogStore: Send + Sync {
    /// Store the log for `task_id`, replacing any previous one.
    async fn write(&self, task_id: TaskId, lines: &[String]) -> Result<(), LogStoreError>;

    /// Read the log for `task_id` in its original line order.
    async fn read(&self, task_id: TaskId) -> Result<Vec<String>, LogStoreError>;
}

/// Build the stored log from a solver's stderr: the header, then each line.
pub fn log_lines(stderr: &str) -> Vec<String> {
    std::iter::once(LOG_HEADER.to_string())
        .chain(stderr.lines().map(str::to_string))
        .collect()
}

/// One `task_{id}.log` file per task under a base directory.
pub struct FileLogStore {
    dir: PathBuf,
}

impl FileLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, task_id: TaskId) -> PathBuf {
        self.dir.join(format!("task_{task_id}.log"))
    }
}

#[async_trait]
impl TaskLogStore for FileLogStore {
    async fn write(&self, task_id: TaskId, lines: &[String]) -> Result<(), LogStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut contents = lines.join("\n");
        contents.push('\n');
        tokio::fs::write(self.path_for(task_id), contents).await?;
        Ok(())
    }

    async fn read(&self, task_id: TaskId) -> Result<Vec<String>, LogStoreError> {
        match tokio::fs::read_to_string(self.path_for(task_id)).await {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LogStoreError::Missing(task_id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local log store. Used in tests and when no log directory is
/// configured.
#[derive(Default)]
pub struct InMemoryLogStore {
    logs: RwLock<HashMap<TaskId, Vec<String>>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskLogStore for InMemoryLogStore {
    async fn write(&self, task_id: TaskId, lines: &[String]) -> Result<(), LogStoreError> {
        self.logs.write().await.insert(task_id, lines.to_vec());
        Ok(())
    }

    async fn read(&self, task_id: TaskId) -> Result<Vec<String>, LogStoreError> {
        self.logs
            .read()
            .await
            .get(&task_id)
            .cloned()
            .ok_or(LogStoreError::Missing(task_id))
    }
}
