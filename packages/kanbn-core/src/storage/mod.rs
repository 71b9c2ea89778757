pub mod local;

use std::path::PathBuf;

use crate::types::{Board, TaskDetail};

/// Operations a host shell calls on one open board.
/// Implementations: LocalStorage (filesystem).
pub trait BoardStorage: Send + Sync {
    /// Read and parse the board index, with card previews.
    fn load_board(&self) -> Result<Board, StorageError>;

    /// Read and parse one task file.
    fn get_task(&self, task_id: &str) -> Result<TaskDetail, StorageError>;

    /// Create a task file and link it at the end of `column`. Returns the new id.
    fn create_task(&self, title: &str, column: &str) -> Result<String, StorageError>;

    /// Rewrite a task file from `detail`; keeps the index title in sync.
    fn update_task(&self, task_id: &str, detail: TaskDetail) -> Result<(), StorageError>;

    /// Remove a task file and its index entry.
    fn delete_task(&self, task_id: &str) -> Result<(), StorageError>;

    /// Move a task to the end of another column.
    fn move_task(&self, task_id: &str, from: &str, to: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Board index not found at {0}")]
    BoardIndexNotFound(PathBuf),

    #[error("Board already exists: {0}")]
    BoardAlreadyExists(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Invalid board name {0:?}: use letters, numbers, spaces, hyphens and underscores")]
    InvalidBoardName(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task with ID {0} already exists")]
    DuplicateTaskId(String),

    #[error("Task title {0:?} does not produce a usable ID")]
    InvalidTaskTitle(String),

    #[error("Task file not found: {0}")]
    TaskFileMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
