use crate::analyzer::metadata::{
    find_all_source_files, relative_key, ComponentReflectionInfo, VariableReflectionInfo,
};
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// Format version written into every cache file. A cache from another
/// version is ignored.
pub const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// On-disk snapshot: relative path -> modification ticks, plus every component
/// with its filepath relative to the source root.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Files")]
    files: BTreeMap<String, u64>,
    #[serde(rename = "Components")]
    components: Vec<CachedComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedComponent {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Filepath")]
    filepath: String,
    #[serde(rename = "Variables")]
    variables: Vec<VariableReflectionInfo>,
}

/// Result of comparing the source tree against the last snapshot.
#[derive(Debug, Default)]
pub struct UnchangedScan {
    /// Every candidate file currently on disk.
    pub source_files: Vec<PathBuf>,
    /// Components of unchanged files, filepath rebased onto the source root.
    pub reused: Vec<ComponentReflectionInfo>,
    /// Files that are new or whose modification time moved.
    pub changed: Vec<PathBuf>,
}

/// Modification time as nanoseconds since the Unix epoch, saturating at
/// `u64::MAX`.
pub fn modified_ticks(path: &Path) -> io::Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    let nanos = modified.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    Ok(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Persistent per-file timestamp cache for incremental reflection runs.
pub struct ReflectionCache {
    path: PathBuf,
    version: String,
}

impl ReflectionCache {
    pub fn new(path: impl AsRef<Path>, version: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            version: version.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<CacheFile>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Best effort: a missing, unreadable or outdated cache is an empty one.
    fn load(&self) -> CacheFile {
        match self.read() {
            Ok(Some(cache)) if cache.version == self.version => cache,
            Ok(Some(cache)) => {
                info!(
                    "cache {} was written by version {}, generating from scratch",
                    self.path.display(),
                    cache.version
                );
                CacheFile::default()
            }
            Ok(None) => {
                debug!("no cache at {}", self.path.display());
                CacheFile::default()
            }
            Err(err) => {
                warn!("Failed to load last cache: {}, generating from scratch", err);
                CacheFile::default()
            }
        }
    }

    /// Enumerate `source_root` and split its files into unchanged ones, whose
    /// cached components are reused, and changed ones that must be re-parsed.
    pub fn load_unchanged(&self, source_root: &Path, extensions: &[String]) -> UnchangedScan {
        let source_files = find_all_source_files(source_root, extensions);
        let cache = self.load();

        let mut by_file: HashMap<&str, Vec<&CachedComponent>> = HashMap::new();
        for component in &cache.components {
            by_file.entry(component.filepath.as_str()).or_default().push(component);
        }

        let mut reused = Vec::new();
        let mut changed = Vec::new();
        for file in &source_files {
            let key = relative_key(file, source_root);
            let current = modified_ticks(file).ok();
            let cached = cache.files.get(&key).copied();

            if current.is_none() || current != cached {
                changed.push(file.clone());
                continue;
            }
            for component in by_file.get(key.as_str()).into_iter().flatten() {
                reused.push(ComponentReflectionInfo {
                    fullname: component.name.clone(),
                    filepath: source_root.join(&component.filepath),
                    variables: component.variables.clone(),
                });
            }
        }

        UnchangedScan {
            source_files,
            reused,
            changed,
        }
    }

    /// Rewrite the whole cache from the current components and file list.
    /// Files whose modification time cannot be read are left out, so they
    /// count as changed next time.
    pub fn serialize(
        &self,
        components: &[ComponentReflectionInfo],
        source_files: &[PathBuf],
        source_root: &Path,
    ) -> Result<(), CacheError> {
        let mut files = BTreeMap::new();
        for file in source_files {
            match modified_ticks(file) {
                Ok(ticks) => {
                    files.insert(relative_key(file, source_root), ticks);
                }
                Err(err) => warn!("can't stat {}: {}", file.display(), err),
            }
        }

        let components = components
            .iter()
            .map(|c| CachedComponent {
                name: c.fullname.clone(),
                filepath: relative_key(&c.filepath, source_root),
                variables: c.variables.clone(),
            })
            .collect();

        let snapshot = CacheFile {
            version: self.version.clone(),
            files,
            components,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&self.path, json).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
