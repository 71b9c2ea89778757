//! Markdown-as-database engine for kanbn boards.
//!
//! A board lives under `<root>/.kanbn_boards/<name>/.kanbn/` as an `index.md`
//! listing columns and task links, plus one markdown file per task in
//! `tasks/`. The modules here parse those files into models, mutate the
//! models and write them back in the same conventions.

pub mod config;
pub mod frontmatter;
pub mod parser;
pub mod paths;
pub mod storage;
pub mod task_parser;
pub mod types;
pub mod workspace;

pub use storage::local::LocalStorage;
pub use storage::{BoardStorage, StorageError};
pub use types::{Board, Column, Comment, Relation, SubTask, TaskDetail, TaskRef};
pub use workspace::Workspace;

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamp format used for front matter and comments,
/// e.g. `2024-05-01T09:30:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
