//! Configuration types for MindNote.
//!
//! This module provides the [`Config`] struct which stores where data lives,
//! who is signed in and how sync behaves. Configuration is persisted as TOML
//! (typically at `~/.config/mindnote/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `data_dir`: Root of the local store (guest and user scopes)
//! - `remote_dir`: Directory served as the remote when no server is configured
//! - `current_user`: Signed-in account, if any
//! - `auto_sync_interval_secs`: Period of the background push
//! - `conflict_policy`: How conflicts are settled without asking
//!
//! # Example
//!
//! ```ignore
//! use mindnote_core::config::Config;
//! use std::path::PathBuf;
//!
//! let config = Config::new(PathBuf::from("/home/user/notes"));
//! let config = Config::load()?;
//! let interval = config.auto_sync_interval();
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MindNoteError, Result};
use crate::fs::FileSystem;
use crate::resolver::ConflictResolution;

/// Default period of the background push, in seconds.
pub const DEFAULT_AUTO_SYNC_SECS: u64 = 30;

/// How conflicts are settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Ask the user each time
    #[default]
    Ask,
    /// Always keep the local copy
    Local,
    /// Always keep the remote copy
    Remote,
}

impl ConflictPolicy {
    /// The fixed resolution, or `None` when the user should be asked.
    pub fn resolution(&self) -> Option<ConflictResolution> {
        match self {
            ConflictPolicy::Ask => None,
            ConflictPolicy::Local => Some(ConflictResolution::KeepLocal),
            ConflictPolicy::Remote => Some(ConflictResolution::KeepRemote),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Ask => "ask",
            ConflictPolicy::Local => "local",
            ConflictPolicy::Remote => "remote",
        })
    }
}

impl FromStr for ConflictPolicy {
    type Err = MindNoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ask" | "prompt" => Ok(ConflictPolicy::Ask),
            "local" | "keep-local" | "keep_local" => Ok(ConflictPolicy::Local),
            "remote" | "server" | "keep-remote" | "keep_remote" => Ok(ConflictPolicy::Remote),
            other => Err(MindNoteError::InvalidOperation(format!(
                "unknown conflict policy '{}' (expected ask, local or remote)",
                other
            ))),
        }
    }
}

fn default_auto_sync_secs() -> u64 {
    DEFAULT_AUTO_SYNC_SECS
}

fn is_default_policy(policy: &ConflictPolicy) -> bool {
    *policy == ConflictPolicy::default()
}

/// `Config` is a data structure that represents the parts of MindNote that the user can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the local store
    pub data_dir: PathBuf,

    /// Directory used as the remote (defaults to `<data_dir>/remote`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<PathBuf>,

    /// Signed-in account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user: Option<String>,

    /// Seconds between background pushes
    #[serde(default = "default_auto_sync_secs")]
    pub auto_sync_interval_secs: u64,

    /// How conflicts are settled
    #[serde(default, skip_serializing_if = "is_default_policy")]
    pub conflict_policy: ConflictPolicy,
}

impl Config {
    /// Create a new config storing data in `data_dir`
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            remote_dir: None,
            current_user: None,
            auto_sync_interval_secs: DEFAULT_AUTO_SYNC_SECS,
            conflict_policy: ConflictPolicy::default(),
        }
    }

    /// Directory served as the remote.
    pub fn remote_dir(&self) -> PathBuf {
        self.remote_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("remote"))
    }

    /// Period of the background push.
    pub fn auto_sync_interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_secs.max(1))
    }

    /// Load config from a specific path.
    pub fn load_from<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| MindNoteError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to<FS: FileSystem>(&self, fs: &FS, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .map_err(|e| MindNoteError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }

    /// Load config from `path`, returning a fresh config if it is missing or unreadable.
    pub fn load_from_or_default<FS: FileSystem>(fs: &FS, path: &Path, data_dir: PathBuf) -> Self {
        match Self::load_from(fs, path) {
            Ok(config) => config,
            Err(e) => {
                if fs.exists(path) {
                    log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                }
                Self::new(data_dir)
            }
        }
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindnote");
        Self::new(data_dir)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/mindnote/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mindnote").join("config.toml"))
    }

    /// Whether a config file has been written.
    pub fn exists() -> bool {
        Self::config_path().is_some_and(|path| path.exists())
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&crate::fs::RealFileSystem, &path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(MindNoteError::NoConfigDir)?;
        self.save_to(&crate::fs::RealFileSystem, &path)
    }

    /// Write a fresh config storing data in `data_dir`
    pub fn init(data_dir: PathBuf) -> Result<Self> {
        let config = Config::new(data_dir);
        config.save()?;
        Ok(config)
    }
}
