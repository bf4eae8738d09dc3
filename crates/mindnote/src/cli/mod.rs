//! Command-line front end for MindNote.
//!
//! Each command family lives in its own module and returns `true` on
//! success; `run_cli` turns a failure into a non-zero exit code.

/// Clap argument definitions
mod args;

/// `login` / `logout` commands
mod auth;

/// Item editing commands
mod item;

/// Sync commands against the account store
mod sync;

/// Shared CLI utilities
mod util;

/// Workspace commands
mod workspace;

use clap::Parser;
use std::path::PathBuf;

use mindnote_core::config::Config;

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    let success = match cli.command {
        Commands::Init { remote_dir } => handle_init(cli.data_dir, remote_dir),

        Commands::Login { user, no_sync } => auth::handle_login(&user, no_sync, cli.data_dir),

        Commands::Logout => auth::handle_logout(),

        Commands::Workspace { command } => workspace::handle_workspace_command(command, cli.data_dir),

        Commands::Item { command } => item::handle_item_command(command, cli.data_dir),

        Commands::Sync { command } => sync::handle_sync_command(command, cli.data_dir),
    };

    if !success {
        std::process::exit(1);
    }
}

/// Handle the init command
/// Returns true on success, false on error
fn handle_init(data_dir: Option<PathBuf>, remote_dir: Option<PathBuf>) -> bool {
    let mut config = match data_dir {
        Some(dir) => Config::new(dir),
        None => Config::default(),
    };
    config.remote_dir = remote_dir;

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        eprintln!(
            "✗ Could not create data directory {}: {}",
            config.data_dir.display(),
            e
        );
        return false;
    }

    match config.save() {
        Ok(()) => {
            println!("✓ Initialized mindnote configuration");
            println!("  Data directory: {}", config.data_dir.display());
            println!("  Remote directory: {}", config.remote_dir().display());
            if let Some(config_path) = Config::config_path() {
                println!("  Config file: {}", config_path.display());
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Error initializing config: {}", e);
            false
        }
    }
}
