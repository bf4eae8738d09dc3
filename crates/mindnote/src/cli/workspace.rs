//! Workspace command handlers.

use std::path::PathBuf;

use mindnote_core::codec;
use mindnote_core::store::Scope;
use mindnote_core::workspace::{Icon, Item, WorkspaceStatus, WorkspaceTree, format_tree};

use crate::cli::args::WorkspaceCommands;
use crate::cli::util::{CliContext, prompt_confirm, split_path};

/// Handle workspace subcommands.
/// Returns true on success, false on error
pub fn handle_workspace_command(command: WorkspaceCommands, data_dir: Option<PathBuf>) -> bool {
    let Some(ctx) = CliContext::load(data_dir) else {
        return false;
    };

    match command {
        WorkspaceCommands::New { title } => handle_new(&ctx, &title),
        WorkspaceCommands::Add { path } => handle_add(&ctx, &path),
        WorkspaceCommands::Rm { path, yes } => handle_rm(&ctx, &path, yes),
        WorkspaceCommands::Rename { path, title } => handle_rename(&ctx, &path, &title),
        WorkspaceCommands::Status { path, status } => handle_status(&ctx, &path, &status),
        WorkspaceCommands::Icon { path, file } => handle_icon(&ctx, &path, file),
        WorkspaceCommands::List { all } => handle_list(&ctx, all),
        WorkspaceCommands::Show { path, json } => handle_show(&ctx, &path, json),
    }
}

fn handle_new(ctx: &CliContext, title: &str) -> bool {
    let scope = ctx.scope();
    let title = title.trim();
    if ctx.store.list(&scope).contains(title) {
        eprintln!("✗ Workspace '{}' already exists", title);
        return false;
    }

    let mut tree = WorkspaceTree::create_root(title);
    tree.set_owner(scope.owner());
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ Created workspace '{}' in {} storage", title, scope);
    true
}

fn handle_add(ctx: &CliContext, path: &str) -> bool {
    let parts = split_path(path);
    let Some((title, parent_path)) = parts.split_last() else {
        eprintln!("✗ Empty workspace path");
        return false;
    };
    if parent_path.is_empty() {
        eprintln!("✗ '{}' has no parent; use 'mindnote workspace new' for top-level workspaces", title);
        return false;
    }

    let Some((mut tree, parent)) = ctx.open(&parent_path.join("/")) else {
        return false;
    };
    if let Err(e) = tree.create_child(parent, *title) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ Created subspace '{}'", parts.join(" / "));
    true
}

fn handle_rm(ctx: &CliContext, path: &str, yes: bool) -> bool {
    let parts = split_path(path);

    // Top-level: drop the whole record
    if let [title] = parts.as_slice() {
        let scope = ctx.scope();
        if !yes && !prompt_confirm(&format!("Delete workspace '{}' and all its subspaces?", title)) {
            println!("Cancelled.");
            return true;
        }
        return match ctx.store.remove(&scope, title) {
            Ok(true) => {
                println!("✓ Deleted workspace '{}'", title);
                true
            }
            Ok(false) => {
                eprintln!("✗ No workspace '{}' in {} storage", title, scope);
                false
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        };
    }

    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };
    match tree.remove_node(id) {
        Ok(removed) => {
            if !ctx.save(&tree) {
                return false;
            }
            println!(
                "✓ Removed '{}' ({} workspace{})",
                parts.join(" / "),
                removed.len(),
                if removed.len() == 1 { "" } else { "s" }
            );
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_rename(ctx: &CliContext, path: &str, new_title: &str) -> bool {
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };
    let scope = ctx.scope();
    let old_title = tree.title().to_string();
    let is_top_level = id == tree.root();

    // Top-level titles are record keys and must stay unique per scope
    if is_top_level && new_title != old_title && ctx.store.list(&scope).contains(new_title) {
        eprintln!("✗ Workspace '{}' already exists", new_title);
        return false;
    }

    if let Err(e) = tree.rename(id, new_title) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    if is_top_level
        && new_title != old_title
        && let Err(e) = ctx.store.remove(&scope, &old_title)
    {
        eprintln!("✗ Saved '{}' but could not remove '{}': {}", new_title, old_title, e);
        return false;
    }

    println!("✓ Renamed '{}' to '{}'", path, new_title);
    true
}

fn handle_status(ctx: &CliContext, path: &str, status: &str) -> bool {
    let status: WorkspaceStatus = match status.parse() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };
    if let Err(e) = tree.set_status(id, status) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ '{}' is now {}", path, status);
    true
}

fn handle_icon(ctx: &CliContext, path: &str, file: Option<PathBuf>) -> bool {
    let icon = match file {
        Some(file) => match std::fs::read(&file) {
            Ok(bytes) => Some(Icon::new(bytes)),
            Err(e) => {
                eprintln!("✗ Could not read {}: {}", file.display(), e);
                return false;
            }
        },
        None => None,
    };
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };
    let cleared = icon.is_none();
    if let Err(e) = tree.set_icon(id, icon) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    if cleared {
        println!("✓ Cleared icon of '{}'", path);
    } else {
        println!("✓ Set icon of '{}'", path);
    }
    true
}

fn handle_list(ctx: &CliContext, all: bool) -> bool {
    let scope = ctx.scope();
    list_scope(ctx, &scope);
    if all && !scope.is_guest() {
        println!();
        list_scope(ctx, &Scope::Guest);
    }
    true
}

fn list_scope(ctx: &CliContext, scope: &Scope) {
    let titles = ctx.store.list(scope);
    println!("Workspaces in {} storage", scope);
    if titles.is_empty() {
        println!("  (none)");
        return;
    }
    for title in titles {
        match ctx.store.load(scope, &title) {
            Ok(tree) => {
                let root = tree.root();
                let version = tree.version(root).unwrap_or_default();
                println!(
                    "  {} [{}] {} page(s), version {}",
                    title,
                    tree.node(root).map(|n| n.status()).unwrap_or_default(),
                    tree.len(),
                    version
                );
            }
            Err(e) => println!("  {} (unreadable: {})", title, e),
        }
    }
}

fn handle_show(ctx: &CliContext, path: &str, json: bool) -> bool {
    let Some((tree, id)) = ctx.open(path) else {
        return false;
    };

    if json {
        return match codec::encode_node(&tree, id, id == tree.root()).and_then(|doc| doc.to_json())
        {
            Ok(json) => {
                println!("{}", json);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        };
    }

    let node = match tree.node(id) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let breadcrumb = tree.path_titles(id).unwrap_or_default().join(" / ");
    println!("{}", breadcrumb);
    println!("{}", "=".repeat(breadcrumb.chars().count()));
    println!("Status: {}", node.status());
    println!(
        "Created: {}",
        node.created_at()
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    println!("Version: {}", node.version());
    if let Some(icon) = node.icon() {
        println!("Icon: {} bytes", icon.bytes().len());
    }

    println!();
    if node.items().is_empty() {
        println!("(no items)");
    }
    for (i, item) in node.items().iter().enumerate() {
        println!("{:>3}. {}", i + 1, render_item(&tree, item));
    }

    if !node.children().is_empty() {
        println!();
        print!("{}", format_tree(&tree, id, ""));
    }
    true
}

/// One-line (or indented multi-line) rendering of an item.
pub fn render_item(tree: &WorkspaceTree, item: &Item) -> String {
    match item {
        Item::Text { content } => content.clone(),
        Item::Checkbox { label, checked } => {
            format!("[{}] {}", if *checked { "x" } else { " " }, label)
        }
        Item::List { kind, entries } => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{} {}", kind.marker(i), entry))
            .collect::<Vec<_>>()
            .join("\n     "),
        Item::Image { path } => format!("image: {}", path),
        Item::File { path } => format!("file: {}", path),
        Item::Title { text } => format!("# {}", text),
        Item::SubspaceLink { target } => match tree.get(*target) {
            Some(child) => format!("→ {}", child.title()),
            None => "→ (missing)".to_string(),
        },
    }
}
