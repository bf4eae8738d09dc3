//! Filesystem abstraction module.
//!
//! This module provides the `FileSystem` trait that the local store and the
//! directory-backed remote are written against, allowing the same code to run
//! on disk ([`RealFileSystem`]) or fully in memory ([`InMemoryFileSystem`]).

mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;

pub use memory::InMemoryFileSystem;
#[cfg(not(target_arch = "wasm32"))]
pub use native::RealFileSystem;

use std::io::Result;
use std::path::{Path, PathBuf};

/// Abstraction over filesystem operations.
/// Allows for different implementations: real filesystem, in-memory (for tests and WASM), etc.
pub trait FileSystem: Send + Sync {
    /// Reads the file content
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Creates or overwrites a file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Deletes a file
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Checks if a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the files directly inside `dir` (not recursive).
    /// A missing directory yields an empty list.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Lists the files directly inside `dir` that have the given extension
    fn list_files_with_extension(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        Ok(self
            .list_files(dir)?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == extension))
            .collect())
    }
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (*self).delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (*self).is_dir(path)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_files(dir)
    }
}
