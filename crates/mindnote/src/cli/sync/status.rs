//! Status command handler for sync.

use std::collections::BTreeMap;

use mindnote_core::gateway::RemoteGateway;
use mindnote_core::store::Scope;

use crate::cli::util::CliContext;

/// Handle the status command - show sync status.
pub fn handle_status(ctx: &CliContext) -> bool {
    let config = &ctx.config;

    println!("Sync Status");
    println!("===========");
    println!();

    println!("Remote directory: {}", config.remote_dir().display());
    println!("Data directory: {}", config.data_dir.display());
    println!("Conflict policy: {}", config.conflict_policy);
    println!("Auto-sync interval: {}s", config.auto_sync_interval().as_secs());
    println!();

    let guest = ctx.store.list(&Scope::Guest);
    println!("Guest workspaces: {}", guest.len());

    let Some(user) = &config.current_user else {
        println!("Account: (signed out)");
        println!();
        println!("To start syncing, sign in:");
        println!("  mindnote login <user>");
        return true;
    };

    let scope = Scope::user(user.clone());
    println!("Account: {}", user);
    println!("Account workspaces: {}", ctx.store.list(&scope).len());
    match ctx.store.last_sync_time(&scope) {
        Some(time) => println!(
            "Last sync: {}",
            time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("Last sync: never"),
    }

    let remote = ctx.remote();
    match futures_lite::future::block_on(remote.fetch_roots()) {
        Ok(roots) => {
            let remote_versions: BTreeMap<String, String> =
                roots.into_iter().map(|r| (r.title, r.version)).collect();
            print_comparison(ctx, &scope, &remote_versions);
        }
        Err(e) => println!("Remote: unavailable ({})", e),
    }

    if !guest.is_empty() {
        println!();
        println!("Guest workspaces are waiting to be moved into your account:");
        println!("  mindnote sync migrate");
    }
    true
}

fn print_comparison(ctx: &CliContext, scope: &Scope, remote: &BTreeMap<String, String>) {
    let mut rows: BTreeMap<String, &str> = BTreeMap::new();

    for title in ctx.store.list(scope) {
        let state = match (ctx.store.load(scope, &title), remote.get(&title)) {
            (Err(_), _) => "unreadable",
            (Ok(_), None) => "local only",
            (Ok(tree), Some(version)) => match tree.version(tree.root()) {
                Ok(local) if local == version.as_str() => "in sync",
                _ => "differs",
            },
        };
        rows.insert(title, state);
    }
    for title in remote.keys() {
        rows.entry(title.clone()).or_insert("remote only");
    }

    println!();
    if rows.is_empty() {
        println!("No workspaces on either side.");
        return;
    }
    for (title, state) in rows {
        println!("  {:<30} {}", title, state);
    }
}
