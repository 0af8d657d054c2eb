use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeenSetError {
    #[error("Failed to access seen-set file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A corrupt file is fatal: treating it as empty would republish everything.
    #[error("Seen-set file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize)]
struct SeenFile {
    seen: BTreeSet<String>,
}

/// Identifiers of every article already published in a digest.
///
/// Loaded once at the start of a run and only written back after a
/// successful publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    ids: BTreeSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the set from `path`. A missing or empty file yields an empty set.
    pub fn load(path: &Path) -> Result<Self, SeenSetError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No seen-set file, starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SeenSetError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: SeenFile =
            serde_json::from_str(&content).map_err(|source| SeenSetError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), count = file.seen.len(), "Loaded seen set");
        Ok(Self { ids: file.seen })
    }

    /// Writes the set to `path` via a temp file and rename, so a crash never
    /// leaves a half-written file behind.
    pub fn save(&self, path: &Path) -> Result<(), SeenSetError> {
        let io_err = |source| SeenSetError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_vec_pretty(&SeenFile {
            seen: self.ids.clone(),
        })
        .map_err(|source| SeenSetError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

        // Unpredictable temp name; create_new refuses to follow a planted file
        let suffix = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = path.with_extension(format!("tmp.{:016x}", suffix));

        let write_temp = || -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)?;
            file.write_all(&body)?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        if let Err(e) = write_temp() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }

        // On Windows, rename fails if destination exists
        #[cfg(windows)]
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(io_err(e));
            }
        }

        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }

        tracing::info!(path = %path.display(), count = self.ids.len(), "Saved seen set");
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Records `ids` as published. Returns how many were not already present.
    pub fn extend<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.ids.len();
        self.ids.extend(ids.into_iter().map(Into::into));
        self.ids.len() - before
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = SeenSet::load(&dir.path().join("seen.json")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(SeenSet::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("seen.json");

        let mut set = SeenSet::new();
        assert_eq!(set.extend(["b", "a"]), 2);
        set.save(&path).unwrap();

        let loaded = SeenSet::load(&path).unwrap();
        assert_eq!(loaded, set);
        assert!(loaded.contains("a"));
        assert!(!loaded.contains("c"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        let mut set = SeenSet::new();
        set.extend(["x"]);
        set.save(&path).unwrap();
        set.extend(["y"]);
        set.save(&path).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["seen.json".to_string()]);
        assert_eq!(SeenSet::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_extend_counts_only_new_ids() {
        let mut set = SeenSet::new();
        set.extend(["a", "b"]);
        assert_eq!(set.extend(["b", "c"]), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = SeenSet::load(&path).unwrap_err();
        assert!(matches!(err, SeenSetError::Corrupt { .. }));
    }
}
