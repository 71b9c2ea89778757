/// Leading `---` front-matter block handling for task files.
///
/// The block must start on the very first line and be closed by a `---`
/// line. Decoding is best-effort: anything that is not a YAML mapping
/// yields an empty mapping and a log line, never an error.

use serde_yaml::{Mapping, Value};

/// Split `content` into (front-matter text, body). Expects LF line endings.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (None, content);
    };

    // Empty block: `---\n---\n`
    if let Some(body) = rest.strip_prefix("---\n") {
        return (Some(""), body);
    }
    if rest == "---" {
        return (Some(""), "");
    }

    if let Some(end) = rest.find("\n---\n") {
        return (Some(&rest[..end]), &rest[end + 5..]);
    }
    if let Some(yaml) = rest.strip_suffix("\n---") {
        return (Some(yaml), "");
    }

    (None, content)
}

/// Remove a leading front-matter block, returning only the body.
pub fn strip(content: &str) -> &str {
    split(content).1
}

/// Decode a front-matter block into a mapping.
pub fn decode(yaml: &str) -> Mapping {
    if yaml.trim().is_empty() {
        return Mapping::new();
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => map,
        Ok(Value::Null) => Mapping::new(),
        Ok(other) => {
            log::warn!(
                "[kanbn.frontmatter] Front matter is not a mapping ({:?}), ignoring it",
                other
            );
            Mapping::new()
        }
        Err(e) => {
            log::warn!("[kanbn.frontmatter] Failed to parse front matter: {}", e);
            Mapping::new()
        }
    }
}

/// Wrap `body` with the encoded mapping. Falls back to the bare body when
/// encoding fails.
pub fn wrap(metadata: &Mapping, body: &str) -> String {
    match serde_yaml::to_string(metadata) {
        Ok(yaml) => {
            let mut out = String::with_capacity(yaml.len() + body.len() + 8);
            out.push_str("---\n");
            out.push_str(&yaml);
            if !yaml.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("---\n");
            out.push_str(body);
            out
        }
        Err(e) => {
            log::warn!("[kanbn.frontmatter] Failed to encode front matter: {}", e);
            body.to_string()
        }
    }
}
