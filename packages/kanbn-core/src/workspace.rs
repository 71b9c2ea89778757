/// Board-level operations for a workspace root.
///
/// A `Workspace` is the host-owned session object: it knows where boards
/// live and hands out a `LocalStorage` for whichever board the host has
/// open. It holds no board state of its own.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LayoutConfig;
use crate::paths::BoardPaths;
use crate::storage::local::LocalStorage;
use crate::storage::StorageError;
use crate::types::Board;

#[derive(Debug, Clone)]
pub struct Workspace {
    paths: BoardPaths,
}

impl Workspace {
    pub fn new(root: &Path) -> Self {
        Self::with_config(root, LayoutConfig::default())
    }

    pub fn with_config(root: &Path, layout: LayoutConfig) -> Self {
        Self {
            paths: BoardPaths::new(root, layout),
        }
    }

    pub fn boards_root(&self) -> PathBuf {
        self.paths.boards_root()
    }

    /// Names of all board directories, sorted. Empty if the boards root
    /// does not exist yet.
    pub fn list_boards(&self) -> Result<Vec<String>, StorageError> {
        let root = self.paths.boards_root();
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// The first board in sorted order, if any.
    pub fn find_first_board(&self) -> Result<Option<String>, StorageError> {
        Ok(self.list_boards()?.into_iter().next())
    }

    /// Scaffold a board directory with the default three-column index.
    pub fn create_board(&self, name: &str) -> Result<LocalStorage, StorageError> {
        if !is_valid_board_name(name) {
            return Err(StorageError::InvalidBoardName(name.to_string()));
        }
        let board_dir = self.paths.board_dir(name);
        if board_dir.exists() {
            return Err(StorageError::BoardAlreadyExists(name.to_string()));
        }

        let storage_dir = self.paths.storage_dir(name);
        fs::create_dir_all(storage_dir.join(&self.paths.layout().tasks_dir))?;

        let storage = self.storage_for(name);
        storage.write_index(&Board::scaffold(name))?;

        log::info!("[kanbn.workspace] Created board {:?} at {:?}", name, board_dir);
        Ok(storage)
    }

    /// Recursively remove a board directory.
    pub fn delete_board(&self, name: &str) -> Result<(), StorageError> {
        let board_dir = self.paths.board_dir(name);
        if !is_contained_board_name(name) || !board_dir.is_dir() {
            return Err(StorageError::BoardNotFound(name.to_string()));
        }
        fs::remove_dir_all(&board_dir)?;
        log::info!("[kanbn.workspace] Deleted board {:?}", name);
        Ok(())
    }

    /// Storage handle for an existing board.
    pub fn open_board(&self, name: &str) -> Result<LocalStorage, StorageError> {
        if !is_contained_board_name(name) || !self.paths.board_dir(name).is_dir() {
            return Err(StorageError::BoardNotFound(name.to_string()));
        }
        Ok(self.storage_for(name))
    }

    fn storage_for(&self, name: &str) -> LocalStorage {
        LocalStorage::with_layout(&self.paths.storage_dir(name), self.paths.layout().clone())
    }
}

/// Letters, digits, spaces, hyphens and underscores; not blank.
pub fn is_valid_board_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_')
}

/// Names that resolve to a single directory directly under the boards
/// root. Existing boards are looked up with this looser rule, so boards
/// created by hand (e.g. `v1.0`) can still be opened and deleted.
pub fn is_contained_board_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BoardStorage;
    use tempfile::TempDir;

    #[test]
    fn test_list_boards_without_root() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(ws.list_boards().unwrap().is_empty());
        assert_eq!(ws.find_first_board().unwrap(), None);
    }

    #[test]
    fn test_create_and_list_boards() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        ws.create_board("Zeta").unwrap();
        ws.create_board("Alpha board").unwrap();
        // Stray files are not boards.
        fs::write(ws.boards_root().join("notes.txt"), "x").unwrap();

        assert_eq!(ws.list_boards().unwrap(), vec!["Alpha board", "Zeta"]);
        assert_eq!(ws.find_first_board().unwrap().as_deref(), Some("Alpha board"));
    }

    #[test]
    fn test_create_board_scaffold() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let storage = ws.create_board("Sprint 1").unwrap();

        assert!(storage.tasks_dir().is_dir());
        let board = storage.load_board().unwrap();
        assert_eq!(board.title, "Sprint 1");
        let names: Vec<&str> = board.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Backlog", "In Progress", "Done"]);
        assert_eq!(board.started_columns, vec!["In Progress"]);
        assert_eq!(board.completed_columns, vec!["Done"]);
    }

    #[test]
    fn test_create_board_errors() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        ws.create_board("Sprint 1").unwrap();
        assert!(matches!(
            ws.create_board("Sprint 1"),
            Err(StorageError::BoardAlreadyExists(_))
        ));
        assert!(matches!(
            ws.create_board("../escape"),
            Err(StorageError::InvalidBoardName(_))
        ));
        assert!(matches!(ws.create_board("   "), Err(StorageError::InvalidBoardName(_))));
    }

    #[test]
    fn test_delete_board() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let storage = ws.create_board("Old").unwrap();
        storage.create_task("Leftover", "Backlog").unwrap();

        ws.delete_board("Old").unwrap();
        assert!(ws.list_boards().unwrap().is_empty());
        assert!(matches!(ws.delete_board("Old"), Err(StorageError::BoardNotFound(_))));
        assert!(matches!(ws.open_board("Old"), Err(StorageError::BoardNotFound(_))));
        // Names that would leave the boards root are never resolved.
        assert!(matches!(ws.delete_board(".."), Err(StorageError::BoardNotFound(_))));
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_hand_made_board_with_dot_in_name() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let storage_dir = ws.boards_root().join("v1.0/.kanbn");
        fs::create_dir_all(&storage_dir).unwrap();
        fs::write(storage_dir.join("index.md"), "# v1.0\n\n## Todo\n\n").unwrap();

        assert_eq!(ws.list_boards().unwrap(), vec!["v1.0"]);
        let storage = ws.open_board("v1.0").unwrap();
        assert_eq!(storage.load_board().unwrap().title, "v1.0");

        ws.delete_board("v1.0").unwrap();
        assert!(ws.list_boards().unwrap().is_empty());
        assert!(matches!(ws.delete_board("a/../.."), Err(StorageError::BoardNotFound(_))));
    }

    #[test]
    fn test_custom_layout() {
        let dir = TempDir::new().unwrap();
        let layout = LayoutConfig {
            boards_dir: "boards".to_string(),
            ..Default::default()
        };
        let ws = Workspace::with_config(dir.path(), layout);
        ws.create_board("B").unwrap();
        assert!(dir.path().join("boards/B/.kanbn/index.md").is_file());
    }

    #[test]
    fn test_board_name_validation() {
        assert!(is_valid_board_name("My Project_Board-2"));
        assert!(!is_valid_board_name(""));
        assert!(!is_valid_board_name("a/b"));
        assert!(!is_valid_board_name("déjà"));
        assert!(is_contained_board_name("v1.0"));
        assert!(!is_contained_board_name(".."));
        assert!(!is_contained_board_name("a\\b"));
    }
}
