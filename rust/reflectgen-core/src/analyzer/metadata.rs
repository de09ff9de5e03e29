use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extensions scanned for annotated records when no other set is configured.
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["h", "c", "cc", "hpp", "cpp"];

/// One reflected public data member, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReflectionInfo {
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(rename = "Name")]
    pub name: String,
}

impl VariableReflectionInfo {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// A record flagged with the component marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentReflectionInfo {
    /// Namespace-qualified name, e.g. `A::B::Name`.
    pub fullname: String,
    pub filepath: PathBuf,
    pub variables: Vec<VariableReflectionInfo>,
}

/// Recursively collect every regular file under `root` whose extension is in
/// `extensions`. Symlinks are followed. Entries that cannot be read are logged
/// and skipped.
pub fn find_all_source_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("error walking {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e == ext));
        if matches {
            out.push(entry.into_path());
        }
    }
    out
}

/// `path` relative to `root`, with `/` separators, as stored in the cache.
pub fn relative_key(path: &Path, root: &Path) -> String {
    to_slash(path.strip_prefix(root).unwrap_or(path))
}

pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative path leading from directory `base` to `path`. Both are expected to
/// be absolute; when they share no root `path` is returned as is.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return path.to_path_buf();
    }

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}
