//! Shared utilities for CLI commands

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use mindnote_core::config::Config;
use mindnote_core::error::MindNoteError;
use mindnote_core::fs::RealFileSystem;
use mindnote_core::gateway::FsRemote;
use mindnote_core::store::{LocalStore, Scope};
use mindnote_core::workspace::{NodeId, WorkspaceTree};

/// Store type used by every command.
pub type CliStore = LocalStore<RealFileSystem>;

/// Loaded config plus the store it points at.
pub struct CliContext {
    pub config: Config,
    pub store: Arc<CliStore>,
}

impl CliContext {
    /// Load config, applying a `--data-dir` override.
    pub fn load(data_dir: Option<PathBuf>) -> Option<Self> {
        let mut config = load_config()?;
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
        let store = Arc::new(LocalStore::new(RealFileSystem, config.data_dir.clone()));
        Some(Self { config, store })
    }

    /// Scope edits go to: the signed-in user's, or guest.
    pub fn scope(&self) -> Scope {
        match &self.config.current_user {
            Some(user) => Scope::user(user.clone()),
            None => Scope::Guest,
        }
    }

    /// Directory-backed remote, signed in as the current user.
    pub fn remote(&self) -> FsRemote<RealFileSystem> {
        let remote = FsRemote::new(RealFileSystem, self.config.remote_dir());
        if let Some(user) = &self.config.current_user {
            remote.sign_in(user.clone());
        }
        remote
    }

    /// Load the workspace at `path` ("Top/Sub/Leaf") from the active scope.
    pub fn open(&self, path: &str) -> Option<(WorkspaceTree, NodeId)> {
        let parts = split_path(path);
        let Some(top) = parts.first() else {
            eprintln!("✗ Empty workspace path");
            return None;
        };

        let scope = self.scope();
        let tree = match self.store.load(&scope, top) {
            Ok(tree) => tree,
            Err(MindNoteError::NotFound { .. }) => {
                eprintln!("✗ No workspace '{}' in {} storage", top, scope);
                return None;
            }
            Err(e) => {
                eprintln!("✗ Could not load '{}': {}", top, e);
                return None;
            }
        };

        match tree.find_by_path(&parts[1..]) {
            Some(id) => Some((tree, id)),
            None => {
                eprintln!("✗ No workspace at '{}'", path);
                None
            }
        }
    }

    /// Persist a tree to the active scope.
    pub fn save(&self, tree: &WorkspaceTree) -> bool {
        match self.store.save(&self.scope(), tree) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("✗ Could not save '{}': {}", tree.title(), e);
                false
            }
        }
    }
}

/// Split a workspace path into titles.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Convert a 1-based item number into an index.
pub fn item_index(number: usize) -> Option<usize> {
    if number == 0 {
        eprintln!("✗ Item numbers start at 1");
        return None;
    }
    Some(number - 1)
}

/// Prompt user for a yes/no answer (default no)
pub fn prompt_confirm(message: &str) -> bool {
    print!("{} [y/N] ", message);
    let _ = io::stdout().flush();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Load config or print error message
pub fn load_config() -> Option<Config> {
    if !Config::exists() {
        eprintln!("✗ {}", MindNoteError::ConfigNotInitialized);
        return None;
    }
    match Config::load() {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("✗ Error loading config: {}", e);
            eprintln!("  Run 'mindnote init' first");
            None
        }
    }
}
