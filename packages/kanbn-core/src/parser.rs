/// Line-oriented parser for kanbn board indexes.
///
/// Handles the index format:
///   ---
///   startedColumns:
///     - 'In Progress'
///   completedColumns:
///     - 'Done'
///   ---
///
///   # Board Title
///
///   ## Column Name
///
///   - [Task Title](tasks/task-id.md)
///
/// Serialization rebuilds the file from the model; text outside the
/// recognized structure (apart from extra front-matter lines) is not kept.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::frontmatter;
use crate::paths::{relative_link, task_id_from_link};
use crate::types::{Board, Column, TaskRef};

static TASK_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[(.*)\]\(([^()]*)\)\s*$").unwrap());

const STARTED_KEY: &str = "startedColumns:";
const COMPLETED_KEY: &str = "completedColumns:";

#[derive(Clone, Copy, PartialEq)]
enum FrontMatterList {
    Started,
    Completed,
}

/// Parse index markdown into a board. Task links are resolved against
/// `storage_dir` and each task file is peeked at for a card preview of at
/// most `preview_chars` characters.
pub fn parse_index(content: &str, storage_dir: &Path, preview_chars: usize) -> Board {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<&str> = content.split('\n').collect();

    let mut board = Board::default();
    let body_start = match front_matter_span(&lines) {
        Some((start, end)) => {
            parse_front_matter(&lines[start..end], &mut board);
            end + 1
        }
        None => 0,
    };
    let mut current_column: Option<Column> = None;

    for line in &lines[body_start..] {
        let trimmed = line.trim();

        if let Some(title) = trimmed.strip_prefix("# ") {
            board.title = title.to_string();
            continue;
        }

        if let Some(name) = trimmed.strip_prefix("## ") {
            if let Some(col) = current_column.take() {
                board.columns.push(col);
            }
            current_column = Some(Column::new(name));
            continue;
        }

        if let Some(col) = current_column.as_mut() {
            if let Some(caps) = TASK_LINK_RE.captures(trimmed) {
                let link = &caps[2];
                let path = storage_dir.join(link);
                let description = read_preview(&path, preview_chars);
                col.tasks.push(TaskRef {
                    id: task_id_from_link(link),
                    title: caps[1].to_string(),
                    description,
                    column: col.name.clone(),
                    path,
                });
            }
        }
    }

    if let Some(col) = current_column.take() {
        board.columns.push(col);
    }

    board
}

/// Line range of the front-matter block, excluding its delimiters. The
/// block must open on the first non-blank line and be closed; a stray or
/// unclosed `---` leaves the whole file as body.
fn front_matter_span(lines: &[&str]) -> Option<(usize, usize)> {
    let open = lines.iter().position(|l| !l.trim().is_empty())?;
    if lines[open].trim() != "---" {
        return None;
    }
    match lines[open + 1..].iter().position(|l| l.trim() == "---") {
        Some(offset) => Some((open + 1, open + 1 + offset)),
        None => {
            log::warn!("[kanbn.parser.index] Front matter is not closed, reading it as body");
            None
        }
    }
}

/// Read the `startedColumns` / `completedColumns` lists; keep everything
/// else verbatim in `extra_front_matter`.
fn parse_front_matter(lines: &[&str], board: &mut Board) {
    let mut current: Option<FrontMatterList> = None;

    for line in lines {
        let trimmed = line.trim();

        if trimmed.starts_with(STARTED_KEY) {
            current = Some(FrontMatterList::Started);
            continue;
        }
        if trimmed.starts_with(COMPLETED_KEY) {
            current = Some(FrontMatterList::Completed);
            continue;
        }

        if let (Some(list), Some(item)) = (current, trimmed.strip_prefix('-')) {
            let value = unquote(item.trim());
            let target = match list {
                FrontMatterList::Started => &mut board.started_columns,
                FrontMatterList::Completed => &mut board.completed_columns,
            };
            if !target.contains(&value) {
                target.push(value);
            }
            continue;
        }

        // A new top-level key ends the current list.
        if !line.starts_with([' ', '\t']) && !trimmed.is_empty() {
            current = None;
        }
        if !trimmed.is_empty() {
            board.extra_front_matter.push(line.to_string());
        }
    }
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].replace("''", "'");
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}

/// Card preview for a task file: body text between the first `# ` heading
/// and the next `## ` heading, non-blank lines trimmed and joined with
/// spaces, cut to `max_chars`. Empty on any read failure, and when
/// `max_chars` is zero the file is not opened at all.
pub fn read_preview(path: &Path, max_chars: usize) -> String {
    if max_chars == 0 || !path.exists() {
        return String::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => extract_preview(&content, max_chars),
        Err(e) => {
            log::debug!("[kanbn.parser.preview] Failed to read {:?}: {}", path, e);
            String::new()
        }
    }
}

pub fn extract_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace("\r\n", "\n");
    let body = frontmatter::strip(&content);

    let mut parts: Vec<&str> = Vec::new();
    let mut found_title = false;
    for line in body.lines() {
        if line.starts_with("# ") {
            found_title = true;
            continue;
        }
        if !found_title {
            continue;
        }
        if line.starts_with("## ") {
            break;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ").chars().take(max_chars).collect()
}

/// Generate index markdown from a board. Task paths are written relative
/// to `storage_dir`.
pub fn generate_index(board: &Board, storage_dir: &Path) -> String {
    let mut markdown = String::from("---\n");

    if !board.started_columns.is_empty() {
        markdown.push_str(STARTED_KEY);
        markdown.push('\n');
        for name in &board.started_columns {
            markdown.push_str(&format!("  - '{}'\n", name.replace('\'', "''")));
        }
    }
    if !board.completed_columns.is_empty() {
        markdown.push_str(COMPLETED_KEY);
        markdown.push('\n');
        for name in &board.completed_columns {
            markdown.push_str(&format!("  - '{}'\n", name.replace('\'', "''")));
        }
    }
    for line in &board.extra_front_matter {
        markdown.push_str(line);
        markdown.push('\n');
    }
    markdown.push_str("---\n\n");

    markdown.push_str(&format!("# {}\n\n", board.title));

    for column in &board.columns {
        markdown.push_str(&format!("## {}\n\n", column.name));
        for task in &column.tasks {
            let link = relative_link(storage_dir, &task.path);
            markdown.push_str(&format!("- [{}]({})\n", task.title, link));
        }
        markdown.push('\n');
    }

    markdown
}
