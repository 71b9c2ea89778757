/// Local filesystem storage for one board.
///
/// Every operation is a full read-modify-write of `index.md` and/or one
/// task file. Nothing is cached between calls, so a `LocalStorage` is just
/// a pair of paths and cheap to build per request. Concurrent writers race
/// and the last save wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::LayoutConfig;
use crate::parser;
use crate::paths::slugify;
use crate::task_parser;
use crate::types::*;
use super::{BoardStorage, StorageError};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// The `.kanbn` directory holding `index.md` and `tasks/`.
    storage_dir: PathBuf,
    layout: LayoutConfig,
}

impl LocalStorage {
    pub fn new(storage_dir: &Path) -> Self {
        Self::with_layout(storage_dir, LayoutConfig::default())
    }

    pub fn with_layout(storage_dir: &Path, layout: LayoutConfig) -> Self {
        Self {
            storage_dir: storage_dir.to_path_buf(),
            layout,
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.storage_dir.join(&self.layout.index_file)
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.storage_dir.join(&self.layout.tasks_dir)
    }

    /// Resolve the file behind a task id, e.g. to open it in an editor.
    pub fn task_path(&self, task_id: &str) -> Result<PathBuf, StorageError> {
        let board = self.read_index(false)?;
        board
            .find_task(task_id)
            .map(|t| t.path.clone())
            .ok_or_else(|| StorageError::TaskNotFound(task_id.to_string()))
    }

    /// Load a task, append a comment dated now, and save it.
    pub fn add_comment(&self, task_id: &str, author: &str, text: &str) -> Result<(), StorageError> {
        let mut detail = self.get_task(task_id)?;
        detail.add_comment(author, text);
        self.update_task(task_id, detail)
    }

    /// Serialize `board` and replace `index.md` with it.
    pub fn write_index(&self, board: &Board) -> Result<(), StorageError> {
        let markdown = parser::generate_index(board, &self.storage_dir);
        Self::atomic_write(&self.index_path(), &markdown)?;
        Ok(())
    }

    /// Parse `index.md`. Mutations skip the card previews since they are
    /// never written back.
    fn read_index(&self, with_previews: bool) -> Result<Board, StorageError> {
        let index_path = self.index_path();
        if !index_path.exists() {
            return Err(StorageError::BoardIndexNotFound(index_path));
        }
        let content = fs::read_to_string(&index_path)?;
        let preview_chars = if with_previews { self.layout.preview_chars } else { 0 };
        Ok(parser::parse_index(&content, &self.storage_dir, preview_chars))
    }

    /// Existing file behind a task id, or the matching error.
    fn existing_task_file(&self, board: &Board, task_id: &str) -> Result<PathBuf, StorageError> {
        let task = board
            .find_task(task_id)
            .ok_or_else(|| StorageError::TaskNotFound(task_id.to_string()))?;
        if !task.path.exists() {
            return Err(StorageError::TaskFileMissing(task.path.clone()));
        }
        Ok(task.path.clone())
    }

    /// Write to .tmp, fsync, rename, fsync directory. The .tmp file is
    /// removed again if any step fails.
    /// Refuses to write empty content over a non-empty file.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if content.trim().is_empty() {
            if let Ok(existing) = fs::read_to_string(path) {
                if !existing.trim().is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Refusing to overwrite non-empty file with empty content",
                    ));
                }
            }
        }

        let tmp_path = path.with_extension("kanbn.tmp");
        let result = Self::write_and_rename(&tmp_path, path, content);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn write_and_rename(tmp_path: &Path, path: &Path, content: &str) -> Result<(), std::io::Error> {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl BoardStorage for LocalStorage {
    fn load_board(&self) -> Result<Board, StorageError> {
        self.read_index(true)
    }

    fn get_task(&self, task_id: &str) -> Result<TaskDetail, StorageError> {
        let board = self.read_index(false)?;
        let path = self.existing_task_file(&board, task_id)?;
        let content = fs::read_to_string(&path)?;
        Ok(task_parser::parse_task(&content))
    }

    fn create_task(&self, title: &str, column: &str) -> Result<String, StorageError> {
        let mut board = self.read_index(false)?;
        let col_index = board
            .column_index(column)
            .ok_or_else(|| StorageError::ColumnNotFound(column.to_string()))?;

        let id = slugify(title);
        if id.is_empty() {
            return Err(StorageError::InvalidTaskTitle(title.to_string()));
        }

        let tasks_dir = self.tasks_dir();
        let path = tasks_dir.join(format!("{}.md", id));
        if path.exists() || board.locate_task(&id).is_some() {
            return Err(StorageError::DuplicateTaskId(id));
        }

        fs::create_dir_all(&tasks_dir)?;
        Self::atomic_write(&path, &format!("# {}\n\n", title))?;

        board.columns[col_index].tasks.push(TaskRef {
            id: id.clone(),
            title: title.to_string(),
            description: String::new(),
            column: column.to_string(),
            path,
        });
        self.write_index(&board)?;

        log::info!("[kanbn.storage.task] Created task {} in column {}", id, column);
        Ok(id)
    }

    fn update_task(&self, task_id: &str, mut detail: TaskDetail) -> Result<(), StorageError> {
        let mut board = self.read_index(false)?;
        let path = self.existing_task_file(&board, task_id)?;

        let content = task_parser::generate_task(&mut detail, Utc::now());
        Self::atomic_write(&path, &content)?;

        // Keep the index link text in step with the task title.
        if let Some((ci, ti)) = board.locate_task(task_id) {
            let task = &mut board.columns[ci].tasks[ti];
            if !detail.title.is_empty() && detail.title != task.title {
                task.title = detail.title.clone();
                self.write_index(&board)?;
            }
        }

        log::debug!("[kanbn.storage.task] Updated task {}", task_id);
        Ok(())
    }

    fn delete_task(&self, task_id: &str) -> Result<(), StorageError> {
        let mut board = self.read_index(false)?;
        let (ci, ti) = board
            .locate_task(task_id)
            .ok_or_else(|| StorageError::TaskNotFound(task_id.to_string()))?;

        let task = board.columns[ci].tasks.remove(ti);
        match fs::remove_file(&task.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[kanbn.storage.task] Task file {:?} already gone", task.path);
            }
            Err(e) => return Err(e.into()),
        }

        self.write_index(&board)?;
        log::info!("[kanbn.storage.task] Deleted task {}", task_id);
        Ok(())
    }

    fn move_task(&self, task_id: &str, from: &str, to: &str) -> Result<(), StorageError> {
        let mut board = self.read_index(false)?;
        let from_index = board
            .column_index(from)
            .ok_or_else(|| StorageError::ColumnNotFound(from.to_string()))?;
        let to_index = board
            .column_index(to)
            .ok_or_else(|| StorageError::ColumnNotFound(to.to_string()))?;
        let position = board.columns[from_index]
            .position_of(task_id)
            .ok_or_else(|| StorageError::TaskNotFound(task_id.to_string()))?;

        let mut task = board.columns[from_index].tasks.remove(position);
        task.column = to.to_string();
        board.columns[to_index].tasks.push(task);

        self.write_index(&board)?;
        log::info!("[kanbn.storage.task] Moved task {} from {} to {}", task_id, from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_INDEX: &str = "\
---
startedColumns:
  - 'In Progress'
completedColumns:
  - 'Done'
---

# Test Board

## Backlog

- [Buy groceries](tasks/buy-groceries.md)
- [Walk the dog](tasks/walk-the-dog.md)

## In Progress

## Done

- [Laundry](tasks/laundry.md)
";

    fn setup() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage_dir = dir.path().join(".kanbn");
        let tasks = storage_dir.join("tasks");
        fs::create_dir_all(&tasks).unwrap();
        fs::write(storage_dir.join("index.md"), TEST_INDEX).unwrap();
        fs::write(tasks.join("buy-groceries.md"), "# Buy groceries\n\nMilk and eggs\n").unwrap();
        fs::write(tasks.join("walk-the-dog.md"), "# Walk the dog\n\n").unwrap();
        fs::write(tasks.join("laundry.md"), "# Laundry\n\n").unwrap();
        let storage = LocalStorage::new(&storage_dir);
        (dir, storage)
    }

    #[test]
    fn test_load_board_with_previews() {
        let (_dir, storage) = setup();
        let board = storage.load_board().unwrap();
        assert_eq!(board.title, "Test Board");
        assert_eq!(board.columns.len(), 3);
        assert_eq!(board.columns[0].tasks[0].description, "Milk and eggs");
        assert_eq!(board.columns[0].tasks[0].path, storage.tasks_dir().join("buy-groceries.md"));
    }

    #[test]
    fn test_missing_index() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(matches!(storage.load_board(), Err(StorageError::BoardIndexNotFound(_))));
    }

    #[test]
    fn test_move_task_appends_to_target() {
        let (_dir, storage) = setup();
        storage.move_task("buy-groceries", "Backlog", "Done").unwrap();

        let board = storage.load_board().unwrap();
        assert_eq!(board.task_count(), 3);
        assert!(board.columns[0].position_of("buy-groceries").is_none());
        let done = board.column("Done").unwrap();
        assert_eq!(done.tasks.last().map(|t| t.id.as_str()), Some("buy-groceries"));
        assert_eq!(done.tasks.last().map(|t| t.column.as_str()), Some("Done"));
    }

    #[test]
    fn test_move_within_same_column_goes_to_bottom() {
        let (_dir, storage) = setup();
        storage.move_task("buy-groceries", "Backlog", "Backlog").unwrap();
        let board = storage.load_board().unwrap();
        let ids: Vec<&str> = board.columns[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["walk-the-dog", "buy-groceries"]);
    }

    #[test]
    fn test_move_errors_leave_index_untouched() {
        let (_dir, storage) = setup();
        let before = fs::read_to_string(storage.index_path()).unwrap();

        assert!(matches!(
            storage.move_task("buy-groceries", "Backlog", "Nowhere"),
            Err(StorageError::ColumnNotFound(c)) if c == "Nowhere"
        ));
        assert!(matches!(
            storage.move_task("laundry", "Backlog", "Done"),
            Err(StorageError::TaskNotFound(_))
        ));
        assert_eq!(fs::read_to_string(storage.index_path()).unwrap(), before);
    }

    #[test]
    fn test_create_task() {
        let (_dir, storage) = setup();
        let id = storage.create_task("My New Task!!", "In Progress").unwrap();
        assert_eq!(id, "my-new-task");

        let file = storage.tasks_dir().join("my-new-task.md");
        assert_eq!(fs::read_to_string(&file).unwrap(), "# My New Task!!\n\n");

        let index = fs::read_to_string(storage.index_path()).unwrap();
        assert!(index.contains("## In Progress\n\n- [My New Task!!](tasks/my-new-task.md)\n"));

        assert!(matches!(
            storage.create_task("My New Task!!", "Backlog"),
            Err(StorageError::DuplicateTaskId(id)) if id == "my-new-task"
        ));
    }

    #[test]
    fn test_create_task_makes_tasks_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.md"), "# B\n\n## Todo\n\n").unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.create_task("First", "Todo").unwrap();
        assert!(storage.tasks_dir().join("first.md").exists());
    }

    #[test]
    fn test_create_task_errors() {
        let (_dir, storage) = setup();
        assert!(matches!(
            storage.create_task("x", "Nowhere"),
            Err(StorageError::ColumnNotFound(_))
        ));
        assert!(matches!(
            storage.create_task("?!", "Backlog"),
            Err(StorageError::InvalidTaskTitle(_))
        ));
    }

    #[test]
    fn test_delete_task() {
        let (_dir, storage) = setup();
        let file = storage.tasks_dir().join("laundry.md");
        storage.delete_task("laundry").unwrap();

        assert!(!file.exists());
        let board = storage.load_board().unwrap();
        assert!(board.find_task("laundry").is_none());
        assert!(matches!(storage.delete_task("laundry"), Err(StorageError::TaskNotFound(_))));
    }

    #[test]
    fn test_delete_task_tolerates_missing_file() {
        let (_dir, storage) = setup();
        fs::remove_file(storage.tasks_dir().join("walk-the-dog.md")).unwrap();
        storage.delete_task("walk-the-dog").unwrap();
        assert!(storage.load_board().unwrap().find_task("walk-the-dog").is_none());
    }

    #[test]
    fn test_get_task_errors() {
        let (_dir, storage) = setup();
        assert!(matches!(storage.get_task("nope"), Err(StorageError::TaskNotFound(_))));
        fs::remove_file(storage.tasks_dir().join("laundry.md")).unwrap();
        assert!(matches!(storage.get_task("laundry"), Err(StorageError::TaskFileMissing(_))));
    }

    #[test]
    fn test_update_task_errors() {
        let (_dir, storage) = setup();
        let detail = storage.get_task("laundry").unwrap();
        assert!(matches!(
            storage.update_task("nope", detail.clone()),
            Err(StorageError::TaskNotFound(_))
        ));

        let file = storage.tasks_dir().join("laundry.md");
        fs::remove_file(&file).unwrap();
        assert!(matches!(
            storage.update_task("laundry", detail),
            Err(StorageError::TaskFileMissing(_))
        ));
        assert!(!file.exists());
    }

    #[test]
    fn test_title_with_link_survives_reload() {
        let (_dir, storage) = setup();
        let id = storage.create_task("See [docs](x)", "Backlog").unwrap();
        assert_eq!(id, "see-docs-x");

        let board = storage.load_board().unwrap();
        let task = board.find_task("see-docs-x").unwrap();
        assert_eq!(task.title, "See [docs](x)");
        assert_eq!(task.path, storage.tasks_dir().join("see-docs-x.md"));
        assert!(board.find_task("x").is_none());
        assert_eq!(storage.get_task("see-docs-x").unwrap().title, "See [docs](x)");
    }

    #[test]
    fn test_failed_write_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        // Renaming a file over a directory fails after the .tmp is written.
        let target = dir.path().join("index.md");
        fs::create_dir_all(target.join("occupied")).unwrap();

        assert!(LocalStorage::atomic_write(&target, "# B\n").is_err());
        assert!(!dir.path().join("index.kanbn.tmp").exists());
    }

    #[test]
    fn test_update_task_renames_index_entry() {
        let (_dir, storage) = setup();
        let mut detail = storage.get_task("walk-the-dog").unwrap();
        detail.title = "Walk the dog twice".to_string();
        detail.description = "Morning and evening".to_string();
        storage.update_task("walk-the-dog", detail).unwrap();

        let reloaded = storage.get_task("walk-the-dog").unwrap();
        assert_eq!(reloaded.title, "Walk the dog twice");
        assert!(reloaded.meta_str("created").is_some());
        assert!(reloaded.meta_str("updated").is_some());

        let board = storage.load_board().unwrap();
        let task = board.find_task("walk-the-dog").unwrap();
        assert_eq!(task.title, "Walk the dog twice");
        assert_eq!(task.description, "Morning and evening");
    }

    #[test]
    fn test_add_comment_roundtrip() {
        let (_dir, storage) = setup();
        storage.add_comment("laundry", "Ann", "Looks good").unwrap();

        let detail = storage.get_task("laundry").unwrap();
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].author, "Ann");
        assert_eq!(detail.comments[0].text, "Looks good");
        assert!(chrono::DateTime::parse_from_rfc3339(&detail.comments[0].date).is_ok());
    }

    #[test]
    fn test_task_path() {
        let (_dir, storage) = setup();
        assert_eq!(
            storage.task_path("laundry").unwrap(),
            storage.tasks_dir().join("laundry.md")
        );
        assert!(storage.task_path("nope").is_err());
    }
}
