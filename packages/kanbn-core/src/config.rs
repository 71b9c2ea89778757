/// Layout configuration shared by the workspace and per-board storage.
/// Defaults match the kanbn on-disk convention; a host may load overrides
/// from a JSON file.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Directory under the workspace root holding one subdirectory per board.
    #[serde(default = "default_boards_dir")]
    pub boards_dir: String,
    /// Directory inside a board holding the index and tasks.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_tasks_dir")]
    pub tasks_dir: String,
    /// Maximum length of a card preview, in characters.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_boards_dir() -> String {
    ".kanbn_boards".to_string()
}

fn default_data_dir() -> String {
    ".kanbn".to_string()
}

fn default_index_file() -> String {
    "index.md".to_string()
}

fn default_tasks_dir() -> String {
    "tasks".to_string()
}

fn default_preview_chars() -> usize {
    100
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            boards_dir: default_boards_dir(),
            data_dir: default_data_dir(),
            index_file: default_index_file(),
            tasks_dir: default_tasks_dir(),
            preview_chars: default_preview_chars(),
        }
    }
}

/// Load config from path. Returns defaults if the file is missing or invalid.
pub fn load_config(path: &Path) -> LayoutConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("[kanbn.config] Failed to parse config {}: {}", path.display(), e);
            LayoutConfig::default()
        }),
        Err(_) => {
            log::info!("[kanbn.config] No config at {}, using defaults", path.display());
            LayoutConfig::default()
        }
    }
}
