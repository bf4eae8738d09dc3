//! In-memory filesystem, available on all targets.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::FileSystem;

/// An in-memory filesystem implementation.
/// Useful for tests and for embedding where no real filesystem is available.
///
/// Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    /// Files stored as path -> content
    files: Arc<RwLock<BTreeMap<PathBuf, String>>>,
    /// Directories that exist (implicitly created when files are added)
    directories: Arc<RwLock<BTreeSet<PathBuf>>>,
}

impl InMemoryFileSystem {
    /// Create a new empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem pre-populated with files
    pub fn with_files(entries: Vec<(PathBuf, String)>) -> Self {
        let fs = Self::new();
        for (path, content) in entries {
            // Writes to memory cannot fail
            let _ = fs.write_file(&path, &content);
        }
        fs
    }

    /// Get a list of all file paths in the filesystem
    pub fn list_all_files(&self) -> Vec<PathBuf> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.keys().cloned().collect()
    }

    /// Helper to normalize paths (remove . and .. components where possible)
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    components.pop();
                }
                c => components.push(c),
            }
        }
        components.iter().collect()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path)))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);

        // Ensure parent directories exist
        if let Some(parent) = normalized.parent() {
            self.create_dir_all(parent)?;
        }

        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.insert(normalized, content.to_string());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files
            .remove(&normalized)
            .map(|_| ())
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path)))
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let dirs = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        files.contains_key(&normalized) || dirs.contains(&normalized)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut dirs = self
            .directories
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Add the directory and all parent directories
        let mut current = Some(normalized.as_path());
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }

        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        let dirs = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        dirs.contains(&normalized)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let normalized = Self::normalize_path(dir);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);

        Ok(files
            .keys()
            .filter(|path| path.parent() == Some(normalized.as_path()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_fs_basic_operations() {
        let fs = InMemoryFileSystem::new();

        // Create and read a file
        fs.write_file(Path::new("guest/Ideas.json"), "{}").unwrap();
        assert_eq!(
            fs.read_to_string(Path::new("guest/Ideas.json")).unwrap(),
            "{}"
        );

        // Check existence
        assert!(fs.exists(Path::new("guest/Ideas.json")));
        assert!(!fs.exists(Path::new("guest/Other.json")));

        // Delete file
        fs.delete_file(Path::new("guest/Ideas.json")).unwrap();
        assert!(!fs.exists(Path::new("guest/Ideas.json")));
        assert!(fs.delete_file(Path::new("guest/Ideas.json")).is_err());
    }

    #[test]
    fn test_in_memory_fs_directories() {
        let fs = InMemoryFileSystem::new();

        // Create a file in a nested directory
        fs.write_file(Path::new("data/users/alice/Notes.json"), "{}")
            .unwrap();

        // Parent directories should exist
        assert!(fs.is_dir(Path::new("data")));
        assert!(fs.is_dir(Path::new("data/users")));
        assert!(fs.is_dir(Path::new("data/users/alice")));
    }

    #[test]
    fn test_list_files_is_not_recursive() {
        let fs = InMemoryFileSystem::with_files(vec![
            (PathBuf::from("root/a.json"), "1".into()),
            (PathBuf::from("root/b.txt"), "2".into()),
            (PathBuf::from("root/sub/c.json"), "3".into()),
        ]);

        let files = fs.list_files(Path::new("root")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("root/a.json"), PathBuf::from("root/b.txt")]
        );

        let json = fs
            .list_files_with_extension(Path::new("./root"), "json")
            .unwrap();
        assert_eq!(json, vec![PathBuf::from("root/a.json")]);
    }

    #[test]
    fn test_clones_share_storage() {
        let fs = InMemoryFileSystem::new();
        let other = fs.clone();
        fs.write_file(Path::new("x.json"), "shared").unwrap();
        assert_eq!(other.read_to_string(Path::new("x.json")).unwrap(), "shared");
        assert_eq!(other.list_all_files(), vec![PathBuf::from("x.json")]);
    }
}
