//! Sync command handlers for the CLI.
//!
//! This module provides the `mindnote sync` command family. Every command
//! builds a [`SyncCoordinator`] over the local store and the directory-backed
//! remote, runs one flow on a tokio runtime and prints the outcome.

mod prompt;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mindnote_core::config::ConflictPolicy;
use mindnote_core::error::Result;
use mindnote_core::fs::RealFileSystem;
use mindnote_core::gateway::FsRemote;
use mindnote_core::resolver::{ConflictResolver, PolicyResolver};
use mindnote_core::sync::{AutoSync, SyncCoordinator, SyncEvent, SyncKind, SyncOutcome};

use crate::cli::args::SyncCommands;
use crate::cli::util::CliContext;

use prompt::PromptResolver;

/// Coordinator type used by the CLI.
type CliCoordinator = SyncCoordinator<RealFileSystem, Arc<FsRemote<RealFileSystem>>>;

/// Handle sync subcommands.
/// Returns true on success, false on error
pub fn handle_sync_command(command: SyncCommands, data_dir: Option<PathBuf>) -> bool {
    let Some(ctx) = CliContext::load(data_dir) else {
        return false;
    };

    match command {
        SyncCommands::Full { prefer } => run(&ctx, prefer.as_deref(), SyncKind::Full),
        SyncCommands::Push => run(&ctx, None, SyncKind::Push),
        SyncCommands::Migrate { prefer } => handle_migrate(&ctx, prefer.as_deref()),
        SyncCommands::Status => status::handle_status(&ctx),
        SyncCommands::Watch { interval } => handle_watch(&ctx, interval),
    }
}

/// Move guest workspaces into the signed-in account.
pub fn handle_migrate(ctx: &CliContext, prefer: Option<&str>) -> bool {
    run(ctx, prefer, SyncKind::Migration)
}

/// Pick the resolver: `--prefer` wins over the configured policy.
fn resolver_for(ctx: &CliContext, prefer: Option<&str>) -> Option<Arc<dyn ConflictResolver>> {
    let policy = match prefer {
        Some(value) => match value.parse::<ConflictPolicy>() {
            Ok(policy) => policy,
            Err(e) => {
                eprintln!("✗ {}", e);
                return None;
            }
        },
        None => ctx.config.conflict_policy,
    };

    Some(match policy.resolution() {
        Some(resolution) => Arc::new(PolicyResolver::new(resolution)),
        None => Arc::new(PromptResolver),
    })
}

fn coordinator(ctx: &CliContext, resolver: Arc<dyn ConflictResolver>) -> Option<Arc<CliCoordinator>> {
    let Some(user) = ctx.config.current_user.clone() else {
        eprintln!("✗ Not signed in. Sign in first:");
        eprintln!("  mindnote login <user>");
        return None;
    };

    let coordinator = SyncCoordinator::new(Arc::clone(&ctx.store), Arc::new(ctx.remote()), resolver);
    coordinator.set_user(Some(user));
    coordinator.subscribe(Arc::new(print_event));
    Some(Arc::new(coordinator))
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => Some(runtime),
        Err(e) => {
            eprintln!("✗ Failed to start async runtime: {}", e);
            None
        }
    }
}

fn print_event(event: &SyncEvent) {
    match event {
        SyncEvent::WorkspaceAdopted { title, version } => {
            println!("  ↓ {} ({})", title, version)
        }
        SyncEvent::ConflictDetected { titles, .. } => {
            println!("  ! {} conflict(s): {}", titles.len(), titles.join(", "))
        }
        SyncEvent::MigrationPending {
            new,
            conflicts,
            server_only,
        } => println!(
            "  Account check: {} new, {} conflicting, {} account-only",
            new.len(),
            conflicts.len(),
            server_only.len()
        ),
        SyncEvent::Warning { message } => eprintln!("  ⚠ {}", message),
        other => log::debug!("Sync event: {:?}", other),
    }
}

fn run(ctx: &CliContext, prefer: Option<&str>, kind: SyncKind) -> bool {
    let Some(resolver) = resolver_for(ctx, prefer) else {
        return false;
    };
    let Some(coordinator) = coordinator(ctx, resolver) else {
        return false;
    };
    let Some(runtime) = runtime() else {
        return false;
    };

    println!("Syncing with {}...", ctx.config.remote_dir().display());
    let result = runtime.block_on(async {
        match kind {
            SyncKind::Full => coordinator.perform_full_sync().await,
            SyncKind::Push => coordinator.sync_local_changes().await,
            SyncKind::Migration => coordinator.start_user_sync().await,
        }
    });
    print_outcome(result)
}

fn print_outcome(result: Result<SyncOutcome>) -> bool {
    match result {
        Ok(SyncOutcome::Completed(report)) => {
            match report.kind {
                SyncKind::Full => {
                    println!(
                        "✓ Full sync complete: {} adopted, {} up to date, {} kept local",
                        report.adopted.len(),
                        report.up_to_date.len(),
                        report.kept_local.len()
                    );
                    if !report.pushed.is_empty() {
                        println!("  Pushed local copies: {}", report.pushed.join(", "));
                    }
                }
                SyncKind::Push => println!("✓ Pushed {} workspace(s)", report.pushed.len()),
                SyncKind::Migration => {
                    println!(
                        "✓ Migration complete: {} workspace(s) in your account",
                        report.adopted.len()
                    );
                    println!("  Removed {} guest record(s)", report.guest_removed);
                }
            }
            true
        }
        Ok(SyncOutcome::Skipped) => {
            println!("Another sync is already running; nothing to do.");
            true
        }
        Ok(SyncOutcome::Cancelled) => {
            println!("Sync cancelled; nothing was changed.");
            true
        }
        Err(e) => {
            eprintln!("✗ Sync failed: {}", e);
            if e.is_gateway() {
                eprintln!("  Local data was not modified. Try again later.");
            }
            false
        }
    }
}

fn handle_watch(ctx: &CliContext, interval: Option<u64>) -> bool {
    // Pushes never ask questions
    let resolver: Arc<dyn ConflictResolver> = Arc::new(PolicyResolver::default());
    let Some(coordinator) = coordinator(ctx, resolver) else {
        return false;
    };
    let Some(runtime) = runtime() else {
        return false;
    };
    let interval = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| ctx.config.auto_sync_interval());

    runtime.block_on(async {
        let auto = AutoSync::spawn(Arc::clone(&coordinator), interval);
        println!(
            "Pushing to {} every {}s. Press Ctrl+C to stop.",
            ctx.config.remote_dir().display(),
            auto.interval().as_secs()
        );

        match tokio::signal::ctrl_c().await {
            Ok(()) => println!("\nStopping auto-sync..."),
            Err(e) => eprintln!("✗ Failed to listen for Ctrl+C: {}", e),
        }
        auto.stop();

        print_outcome(coordinator.sync_local_changes().await)
    })
}
