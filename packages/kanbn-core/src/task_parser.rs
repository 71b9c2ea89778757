/// Parser and generator for individual task files.
///
/// Handles the task format:
///   ---
///   created: 2024-05-01T09:30:00.000Z
///   updated: 2024-05-02T10:00:00.000Z
///   ---
///   # Task Title
///
///   Free text description.
///
///   ## Sub-tasks
///
///   - [x] Done item
///   - [ ] Open item
///
///   ## Relations
///
///   - [blocks other-task](other-task.md)
///
///   ## Comments
///
///   - author: Ann
///     date: 2024-05-01T09:30:00.000Z
///     Comment text
///
/// Sections other than the three above are dropped on parse.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_yaml::Value;

use crate::frontmatter;
use crate::types::{Comment, Relation, SubTask, TaskDetail, META_CREATED, META_UPDATED};

static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\]\s*(.*)$").unwrap());
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[(.*?)\]\((.*?)\)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Header,
    Description,
    SubTasks,
    Relations,
    Comments,
    Other,
}

impl Section {
    fn from_heading(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "sub-tasks" => Section::SubTasks,
            "relations" => Section::Relations,
            "comments" => Section::Comments,
            _ => Section::Other,
        }
    }
}

/// A comment being assembled from its `- author:` / `date:` / body lines.
#[derive(Default)]
struct PendingComment {
    author: String,
    date: String,
    lines: Vec<String>,
}

impl PendingComment {
    fn finish(self) -> Option<Comment> {
        if self.author.is_empty() {
            return None;
        }
        Some(Comment {
            author: self.author,
            date: self.date,
            text: self.lines.join("\n"),
        })
    }
}

/// Parse a task file into its detail model. Never fails: malformed front
/// matter becomes an empty mapping and unknown lines are skipped.
pub fn parse_task(content: &str) -> TaskDetail {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let (yaml, body) = frontmatter::split(&content);

    let mut detail = TaskDetail {
        metadata: yaml.map(frontmatter::decode).unwrap_or_default(),
        ..Default::default()
    };

    let mut section = Section::Header;
    let mut title_seen = false;
    let mut description_lines: Vec<&str> = Vec::new();
    let mut pending: Option<PendingComment> = None;

    for line in body.split('\n') {
        let trimmed = line.trim();

        if !title_seen {
            if let Some(title) = line.strip_prefix("# ") {
                detail.title = title.trim().to_string();
                title_seen = true;
                section = Section::Description;
                continue;
            }
        }

        if let Some(name) = line.strip_prefix("## ") {
            section = Section::from_heading(name);
            continue;
        }

        match section {
            Section::Header | Section::Other => {}
            Section::Description => {
                if !trimmed.is_empty() {
                    description_lines.push(line);
                }
            }
            Section::SubTasks => {
                if let Some(caps) = CHECKBOX_RE.captures(trimmed) {
                    let description = caps[2].trim();
                    if !description.is_empty() {
                        detail.sub_tasks.push(SubTask {
                            description: description.to_string(),
                            completed: &caps[1] != " ",
                        });
                    }
                }
            }
            Section::Relations => {
                if let Some(caps) = LINK_RE.captures(trimmed) {
                    let target = caps[2].trim();
                    detail.relations.push(Relation {
                        name: caps[1].trim().to_string(),
                        target: target.strip_suffix(".md").unwrap_or(target).to_string(),
                    });
                }
            }
            Section::Comments => {
                if let Some(author) = trimmed.strip_prefix("- author:") {
                    if let Some(comment) = pending.take().and_then(PendingComment::finish) {
                        detail.comments.push(comment);
                    }
                    pending = Some(PendingComment {
                        author: author.trim().to_string(),
                        ..Default::default()
                    });
                } else if let Some(open) = pending.as_mut() {
                    match trimmed.strip_prefix("date:") {
                        Some(date) if open.date.is_empty() => {
                            open.date = date.trim().to_string();
                        }
                        _ => {
                            if !open.author.is_empty() && !open.date.is_empty() && !trimmed.is_empty() {
                                open.lines.push(trimmed.to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(comment) = pending.take().and_then(PendingComment::finish) {
        detail.comments.push(comment);
    }

    detail.description = description_lines.join("\n").trim().to_string();
    detail
}

/// Set `updated` to `now`, and `created` too when it is missing or empty.
pub fn stamp_timestamps(metadata: &mut serde_yaml::Mapping, now: DateTime<Utc>) {
    let stamp = crate::iso_timestamp(now);
    let has_created = match metadata.get(META_CREATED) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };
    if !has_created {
        metadata.insert(META_CREATED.into(), Value::String(stamp.clone()));
    }
    metadata.insert(META_UPDATED.into(), Value::String(stamp));
}

/// Render the markdown body (everything below the front matter).
pub fn generate_body(detail: &TaskDetail) -> String {
    let mut body = format!("# {}\n\n", detail.title);

    if !detail.description.is_empty() {
        body.push_str(&detail.description);
        body.push_str("\n\n");
    }

    if !detail.sub_tasks.is_empty() {
        body.push_str("## Sub-tasks\n\n");
        for sub in &detail.sub_tasks {
            let checkbox = if sub.completed { "[x]" } else { "[ ]" };
            body.push_str(&format!("- {} {}\n", checkbox, sub.description));
        }
        body.push('\n');
    }

    if !detail.relations.is_empty() {
        body.push_str("## Relations\n\n");
        for rel in &detail.relations {
            body.push_str(&format!("- [{}]({}.md)\n", rel.name, rel.target));
        }
        body.push('\n');
    }

    if !detail.comments.is_empty() {
        body.push_str("## Comments\n\n");
        for comment in &detail.comments {
            body.push_str(&format!("- author: {}\n", comment.author));
            body.push_str(&format!("  date: {}\n", comment.date));
            for line in comment.text.split('\n') {
                body.push_str("  ");
                body.push_str(line.trim());
                body.push('\n');
            }
            body.push('\n');
        }
    }

    body
}

/// Stamp timestamps on `detail` and render the complete task file.
pub fn generate_task(detail: &mut TaskDetail, now: DateTime<Utc>) -> String {
    stamp_timestamps(&mut detail.metadata, now);
    let body = generate_body(detail);
    frontmatter::wrap(&detail.metadata, &body)
}
