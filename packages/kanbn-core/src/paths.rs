/// On-disk layout helpers and task id derivation.
///
/// A board lives at `<root>/<boards_dir>/<name>/<data_dir>/`, which is the
/// "storage dir" every link in the index is resolved against.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::LayoutConfig;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derive a task id from its title: lower-case, runs of anything outside
/// `[a-z0-9]` collapsed to one hyphen, no leading or trailing hyphen.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Task id for a link path: the file name without its `.md` extension.
pub fn task_id_from_link(link: &str) -> String {
    let name = link.rsplit(['/', '\\']).next().unwrap_or(link);
    name.strip_suffix(".md").unwrap_or(name).to_string()
}

/// Path of `target` relative to `base`, always with `/` separators.
/// Paths outside `base` are written as-is.
pub fn relative_link(base: &Path, target: &Path) -> String {
    let rel = target.strip_prefix(base).unwrap_or(target);
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            Component::RootDir => Some(String::new()),
            other => Some(other.as_os_str().to_string_lossy().replace('\\', "/")),
        })
        .collect();
    parts.join("/")
}

/// Path helpers bound to one workspace root and layout.
#[derive(Debug, Clone)]
pub struct BoardPaths {
    layout: LayoutConfig,
    root: PathBuf,
}

impl BoardPaths {
    pub fn new(root: &Path, layout: LayoutConfig) -> Self {
        Self {
            layout,
            root: root.to_path_buf(),
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// `<root>/.kanbn_boards`
    pub fn boards_root(&self) -> PathBuf {
        self.root.join(&self.layout.boards_dir)
    }

    /// `<root>/.kanbn_boards/<name>`
    pub fn board_dir(&self, name: &str) -> PathBuf {
        self.boards_root().join(name)
    }

    /// `<root>/.kanbn_boards/<name>/.kanbn`
    pub fn storage_dir(&self, name: &str) -> PathBuf {
        self.board_dir(name).join(&self.layout.data_dir)
    }
}
