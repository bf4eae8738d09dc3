//! Sign-in and sign-out handlers.
//!
//! Signing in switches every later command to the user's storage and, unless
//! asked not to, moves guest workspaces into the account right away.

use std::path::PathBuf;

use crate::cli::sync;
use crate::cli::util::{CliContext, load_config};

/// Handle the login command.
/// Returns true on success, false on error
pub fn handle_login(user: &str, no_sync: bool, data_dir: Option<PathBuf>) -> bool {
    let user = user.trim();
    if user.is_empty() {
        eprintln!("✗ User id cannot be empty");
        return false;
    }

    let Some(mut config) = load_config() else {
        return false;
    };
    if let Some(previous) = &config.current_user
        && previous != user
    {
        println!("Signing out '{}'", previous);
    }
    config.current_user = Some(user.to_string());
    if let Err(e) = config.save() {
        eprintln!("✗ Could not save config: {}", e);
        return false;
    }
    println!("✓ Signed in as '{}'", user);

    if no_sync {
        println!();
        println!("Guest workspaces were left in place. Move them later with:");
        println!("  mindnote sync migrate");
        return true;
    }

    let Some(ctx) = CliContext::load(data_dir) else {
        return false;
    };
    println!();
    sync::handle_migrate(&ctx, None)
}

/// Handle the logout command.
/// Returns true on success, false on error
pub fn handle_logout() -> bool {
    let Some(mut config) = load_config() else {
        return false;
    };
    let Some(user) = config.current_user.take() else {
        println!("Not signed in.");
        return true;
    };
    if let Err(e) = config.save() {
        eprintln!("✗ Could not save config: {}", e);
        return false;
    }
    println!("✓ Signed out '{}'", user);
    println!("  New workspaces will be stored as guest data on this device.");
    true
}
