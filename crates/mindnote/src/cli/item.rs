//! Item command handlers.

use std::path::PathBuf;

use mindnote_core::workspace::{Item, ListKind};

use crate::cli::args::ItemCommands;
use crate::cli::util::{CliContext, item_index};
use crate::cli::workspace::render_item;

/// Handle item subcommands.
/// Returns true on success, false on error
pub fn handle_item_command(command: ItemCommands, data_dir: Option<PathBuf>) -> bool {
    let Some(ctx) = CliContext::load(data_dir) else {
        return false;
    };

    match command {
        ItemCommands::Add {
            path,
            kind,
            content,
        } => handle_add(&ctx, &path, &kind, content),
        ItemCommands::Check { path, index } => handle_check(&ctx, &path, index),
        ItemCommands::Rm { path, index } => handle_rm(&ctx, &path, index),
        ItemCommands::Move { path, from, to } => handle_move(&ctx, &path, from, to),
    }
}

/// Build an item from a kind name and its command-line content.
fn parse_item(kind: &str, content: Vec<String>) -> Result<Item, String> {
    let joined = content.join(" ");
    match kind.to_lowercase().as_str() {
        "text" | "t" => Ok(Item::text(joined)),
        "checkbox" | "check" | "c" => Ok(Item::checkbox(joined)),
        "ordered" | "ol" => Ok(Item::list(ListKind::Ordered, content)),
        "unordered" | "ul" | "list" => Ok(Item::list(ListKind::Unordered, content)),
        "image" | "img" => Ok(Item::Image { path: joined }),
        "file" => Ok(Item::File { path: joined }),
        "title" | "heading" | "h" => Ok(Item::title(joined)),
        other => Err(format!(
            "unknown item kind '{}' (expected text, checkbox, ordered, unordered, image, file or title)",
            other
        )),
    }
}

fn handle_add(ctx: &CliContext, path: &str, kind: &str, content: Vec<String>) -> bool {
    let item = match parse_item(kind, content) {
        Ok(item) => item,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };
    let rendered = render_item(&tree, &item);
    let index = match tree.add_item(id, item) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ Added item {} to '{}': {}", index + 1, path, rendered);
    true
}

fn handle_check(ctx: &CliContext, path: &str, number: usize) -> bool {
    let Some(index) = item_index(number) else {
        return false;
    };
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };

    let toggled = match tree.node(id).map(|n| n.items().get(index).cloned()) {
        Ok(Some(Item::Checkbox { label, checked })) => Item::Checkbox {
            label,
            checked: !checked,
        },
        Ok(Some(other)) => {
            eprintln!("✗ Item {} is a {}, not a checkbox", number, other.kind_name());
            return false;
        }
        Ok(None) => {
            eprintln!("✗ '{}' has no item {}", path, number);
            return false;
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let rendered = render_item(&tree, &toggled);
    if let Err(e) = tree.replace_item(id, index, toggled) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ {}", rendered);
    true
}

fn handle_rm(ctx: &CliContext, path: &str, number: usize) -> bool {
    let Some(index) = item_index(number) else {
        return false;
    };
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };

    // Render before removal so a subspace link still resolves its title
    let rendered = match tree.node(id).map(|n| n.items().get(index).cloned()) {
        Ok(Some(item)) => render_item(&tree, &item),
        Ok(None) => {
            eprintln!("✗ '{}' has no item {}", path, number);
            return false;
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    if let Err(e) = tree.remove_item(id, index) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ Removed item {}: {}", number, rendered);
    true
}

fn handle_move(ctx: &CliContext, path: &str, from: usize, to: usize) -> bool {
    let (Some(from_index), Some(to_index)) = (item_index(from), item_index(to)) else {
        return false;
    };
    let Some((mut tree, id)) = ctx.open(path) else {
        return false;
    };
    if let Err(e) = tree.move_item(id, from_index, to_index) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !ctx.save(&tree) {
        return false;
    }
    println!("✓ Moved item {} to position {}", from, to);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_kinds() {
        assert_eq!(
            parse_item("text", vec!["hello".into(), "world".into()]).unwrap(),
            Item::text("hello world")
        );
        assert_eq!(
            parse_item("ol", vec!["a".into(), "b".into()]).unwrap(),
            Item::list(ListKind::Ordered, vec!["a".into(), "b".into()])
        );
        assert_eq!(
            parse_item("Checkbox", vec!["milk".into()]).unwrap(),
            Item::checkbox("milk")
        );
        assert!(parse_item("subspace", vec!["x".into()]).is_err());
    }
}
