use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default title used when an index has no `# ` heading.
pub const DEFAULT_BOARD_TITLE: &str = "Kanban Board";

/// Columns scaffolded into every new board, left to right.
pub const DEFAULT_COLUMNS: &[&str] = &["Backlog", "In Progress", "Done"];
pub const DEFAULT_STARTED_COLUMN: &str = "In Progress";
pub const DEFAULT_COMPLETED_COLUMN: &str = "Done";

/// Reserved front-matter keys stamped on every task save.
pub const META_CREATED: &str = "created";
pub const META_UPDATED: &str = "updated";

/// A task as listed in the board index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    pub title: String,
    /// Card preview taken from the task body. Recomputed on load, never written.
    #[serde(default)]
    pub description: String,
    /// Name of the owning column, derived from placement in the index.
    pub column: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub tasks: Vec<TaskRef>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn position_of(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub title: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub started_columns: Vec<String>,
    #[serde(default)]
    pub completed_columns: Vec<String>,
    /// Front-matter lines the index format does not model, kept verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_front_matter: Vec<String>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            title: DEFAULT_BOARD_TITLE.to_string(),
            columns: Vec::new(),
            started_columns: Vec::new(),
            completed_columns: Vec::new(),
            extra_front_matter: Vec::new(),
        }
    }
}

impl Board {
    /// The layout every freshly created board starts with.
    pub fn scaffold(title: &str) -> Self {
        Self {
            title: title.to_string(),
            columns: DEFAULT_COLUMNS.iter().map(|name| Column::new(*name)).collect(),
            started_columns: vec![DEFAULT_STARTED_COLUMN.to_string()],
            completed_columns: vec![DEFAULT_COMPLETED_COLUMN.to_string()],
            extra_front_matter: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Locate a task anywhere on the board: (column index, position in column).
    pub fn locate_task(&self, task_id: &str) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, col)| col.position_of(task_id).map(|ti| (ci, ti)))
    }

    pub fn find_task(&self, task_id: &str) -> Option<&TaskRef> {
        self.locate_task(task_id)
            .map(|(ci, ti)| &self.columns[ci].tasks[ti])
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// A named link to another task on the same board. `target` is the task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    /// ISO-8601 timestamp as written in the file.
    pub date: String,
    /// Body text; multi-line bodies are joined with `\n`.
    pub text: String,
}

/// Full parsed content of one task file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(default)]
    pub metadata: serde_yaml::Mapping,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl TaskDetail {
    /// Append a comment dated now.
    pub fn add_comment(&mut self, author: &str, text: &str) {
        self.comments.push(Comment {
            author: author.to_string(),
            date: crate::iso_timestamp(chrono::Utc::now()),
            text: text.to_string(),
        });
    }

    /// Read a string value from the front matter.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}
