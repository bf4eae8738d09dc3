//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mindnote")]
#[command(version)]
#[command(about = "Offline-first workspaces of typed notes with account sync", long_about = None)]
pub struct Cli {
    /// Override the data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize mindnote configuration (uses --data-dir or the platform data dir)
    Init {
        /// Directory used as the remote account store
        #[arg(short, long)]
        remote_dir: Option<PathBuf>,
    },

    /// Sign in and move guest workspaces into the account
    Login {
        /// Account id
        user: String,

        /// Only record the sign-in, do not sync
        #[arg(long)]
        no_sync: bool,
    },

    /// Sign out (guest workspaces stay on this device)
    Logout,

    /// Create, edit and inspect workspaces
    #[command(aliases = ["ws", "w"])]
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },

    /// Edit the items of a workspace
    #[command(alias = "i")]
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Synchronize with the account
    #[command(alias = "s")]
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
}

/// Workspace paths are titles joined with '/', e.g. "Notes/Travel/Packing".
#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Create a new top-level workspace
    New {
        /// Title of the workspace
        title: String,
    },

    /// Create a subspace under an existing workspace
    Add {
        /// Path of the new subspace (parent path + new title)
        path: String,
    },

    /// Remove a workspace and everything below it
    #[command(alias = "remove")]
    Rm {
        /// Workspace path
        path: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a workspace
    #[command(alias = "mv")]
    Rename {
        /// Workspace path
        path: String,

        /// New title
        title: String,
    },

    /// Set the progress status (not_started, in_progress, completed)
    Status {
        /// Workspace path
        path: String,

        /// New status
        status: String,
    },

    /// Set or clear the icon from an image file
    Icon {
        /// Workspace path
        path: String,

        /// Image file (omit to clear)
        file: Option<PathBuf>,
    },

    /// List top-level workspaces
    #[command(alias = "ls")]
    List {
        /// Also list guest workspaces while signed in
        #[arg(long)]
        all: bool,
    },

    /// Show a workspace's items and its outline
    Show {
        /// Workspace path
        path: String,

        /// Print the stored JSON document instead
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Append an item
    Add {
        /// Workspace path
        path: String,

        /// Item kind: text, checkbox, ordered, unordered, image, file, title
        kind: String,

        /// Content (list kinds take one argument per entry)
        #[arg(required = true)]
        content: Vec<String>,
    },

    /// Toggle a checkbox
    Check {
        /// Workspace path
        path: String,

        /// Item number as shown by `workspace show`
        index: usize,
    },

    /// Remove an item (removing a subspace link removes the subspace)
    #[command(alias = "remove")]
    Rm {
        /// Workspace path
        path: String,

        /// Item number as shown by `workspace show`
        index: usize,
    },

    /// Move an item to a new position
    #[command(alias = "mv")]
    Move {
        /// Workspace path
        path: String,

        /// Current item number
        from: usize,

        /// New item number
        to: usize,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Pull every workspace from the account, resolving conflicts
    Full {
        /// Settle conflicts without asking (local or remote)
        #[arg(long)]
        prefer: Option<String>,
    },

    /// Send every local workspace to the account
    Push,

    /// Move guest workspaces into the signed-in account
    Migrate {
        /// Settle conflicts without asking (local or remote)
        #[arg(long)]
        prefer: Option<String>,
    },

    /// Show sync status
    Status,

    /// Push periodically until interrupted
    Watch {
        /// Seconds between pushes (default: config's auto_sync_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}
