//! Workspace tree module.
//!
//! A [`WorkspaceTree`] owns every node of one top-level workspace in an arena
//! and hands out [`NodeId`]s. All structural edits go through the tree so the
//! following always hold:
//! - every node except the root has exactly one parent
//! - sibling titles are unique
//! - each child has exactly one [`Item::SubspaceLink`] in its parent's items,
//!   and every link targets a live child of that parent
//!
//! Local edits refresh the `version` of the edited node and of all its
//! ancestors.
//!
//! # Module Structure
//!
//! - `types` - Value types (NodeId, WorkspaceStatus, Icon, Item, WorkspaceNode)

mod types;

pub use types::{Icon, Item, ListKind, NodeId, WorkspaceNode, WorkspaceStatus};

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{MindNoteError, Result};

/// Deepest nesting allowed below a root workspace.
///
/// Stored records must stay readable by `serde_json`, whose parser stops at
/// 128 levels; every workspace level costs two (the `pages` array and the
/// page object).
pub const MAX_DEPTH: usize = 32;

/// An arena-backed tree of workspaces rooted at one top-level workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceTree {
    nodes: Vec<Option<WorkspaceNode>>,
    root: NodeId,
    owner: String,
}

impl WorkspaceTree {
    /// Create a tree holding a single, empty root workspace.
    pub fn create_root(title: impl Into<String>) -> Self {
        let mut tree = Self::from_root_node(WorkspaceNode::new(title));
        tree.refresh_versions(tree.root);
        tree
    }

    /// Build a tree around an already populated root node (versions untouched).
    pub(crate) fn from_root_node(mut node: WorkspaceNode) -> Self {
        node.parent = None;
        node.children.clear();
        Self {
            nodes: vec![Some(node)],
            root: NodeId(0),
            owner: String::new(),
        }
    }

    /// Attach a populated node below `parent` without touching link items or versions.
    pub(crate) fn attach(&mut self, parent: NodeId, mut node: WorkspaceNode) -> Result<NodeId> {
        if self.depth(parent)? >= MAX_DEPTH {
            return Err(MindNoteError::TooDeep {
                title: node.title,
                max: MAX_DEPTH,
            });
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(Some(node));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut WorkspaceNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(MindNoteError::NodeNotFound(id.0))
    }

    /// Id of the root workspace.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Title of the root workspace.
    pub fn title(&self) -> &str {
        self.get(self.root).map(|n| n.title()).unwrap_or_default()
    }

    /// Owner id; empty for guest data.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Set the owner id (empty string for guest).
    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.owner = owner.into();
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&WorkspaceNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Look up a node, failing with `NodeNotFound`.
    pub fn node(&self, id: NodeId) -> Result<&WorkspaceNode> {
        self.get(id).ok_or(MindNoteError::NodeNotFound(id.0))
    }

    /// Parent of a node (`None` for the root).
    pub fn parent_of(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Direct subspaces of a node, in order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    /// Version token of a node.
    pub fn version(&self, id: NodeId) -> Result<&str> {
        Ok(self.node(id)?.version())
    }

    /// Find a direct child of `parent` by title.
    pub fn find_child(&self, parent: NodeId, title: &str) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.get(*c).is_some_and(|n| n.title == title))
    }

    /// Resolve a title path below the root. An empty path is the root itself.
    pub fn find_by_path(&self, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root, |current, title| self.find_child(current, title))
    }

    /// Ids from the root down to `id`, inclusive.
    pub fn path_chain(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = vec![id];
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            // A cycle would mean a corrupted arena
            if chain.len() > self.nodes.len() {
                return Err(MindNoteError::InvalidOperation(
                    "cycle detected in workspace tree".to_string(),
                ));
            }
            chain.push(parent);
            current = self.node(parent)?.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Titles from the root down to `id`, for breadcrumbs.
    pub fn path_titles(&self, id: NodeId) -> Result<Vec<String>> {
        self.path_chain(id)?
            .into_iter()
            .map(|n| self.node(n).map(|node| node.title.clone()))
            .collect()
    }

    /// Number of ancestors of `id` (0 for the root).
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        Ok(self.path_chain(id)?.len() - 1)
    }

    /// Top-level ancestor of `id`.
    pub fn root_of(&self, id: NodeId) -> Result<NodeId> {
        let chain = self.path_chain(id)?;
        Ok(chain[0])
    }

    /// `id` and all of its descendants in pre-order.
    pub fn walk(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let node = self.node(current)?;
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Create a new subspace under `parent` and append its link item.
    pub fn create_child(&mut self, parent: NodeId, title: impl Into<String>) -> Result<NodeId> {
        let title = title.into();
        check_title(&title)?;
        let parent_node = self.node(parent)?;
        if self.find_child(parent, &title).is_some() {
            return Err(MindNoteError::DuplicateTitle {
                parent: parent_node.title.clone(),
                title,
            });
        }

        let id = self.attach(parent, WorkspaceNode::new(title))?;
        self.node_mut(parent)?
            .items
            .push(Item::SubspaceLink { target: id });
        self.refresh_versions(id);
        Ok(id)
    }

    /// Detach `id` and all its descendants, returning them as an independent tree.
    ///
    /// Exactly one link item (the one targeting `id`) is removed from the former
    /// parent. The root itself cannot be removed; drop the whole tree instead.
    pub fn remove_node(&mut self, id: NodeId) -> Result<WorkspaceTree> {
        let parent = self.node(id)?.parent.ok_or_else(|| {
            MindNoteError::InvalidOperation("the root workspace cannot be removed".to_string())
        })?;

        let subtree = self.walk(id)?;
        let mut mapping = HashMap::new();
        for (new_index, old) in subtree.iter().enumerate() {
            mapping.insert(*old, NodeId(new_index));
        }

        let mut detached = Vec::with_capacity(subtree.len());
        for old in &subtree {
            let mut node = self.nodes[old.0]
                .take()
                .ok_or(MindNoteError::NodeNotFound(old.0))?;
            node.parent = node.parent.and_then(|p| mapping.get(&p).copied());
            node.children = node.children.iter().map(|c| mapping[c]).collect();
            for item in &mut node.items {
                if let Item::SubspaceLink { target } = item {
                    *target = mapping[&*target];
                }
            }
            detached.push(Some(node));
        }

        let parent_node = self.node_mut(parent)?;
        parent_node.children.retain(|c| *c != id);
        if let Some(pos) = parent_node
            .items
            .iter()
            .position(|item| matches!(item, Item::SubspaceLink { target } if *target == id))
        {
            parent_node.items.remove(pos);
        }
        self.refresh_versions(parent);

        log::debug!(
            "Removed subspace with {} node(s) from '{}'",
            detached.len(),
            self.title()
        );

        Ok(WorkspaceTree {
            nodes: detached,
            root: NodeId(0),
            owner: self.owner.clone(),
        })
    }

    /// Rename a workspace, keeping sibling titles unique.
    pub fn rename(&mut self, id: NodeId, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        check_title(&title)?;
        if let Some(parent) = self.node(id)?.parent
            && let Some(existing) = self.find_child(parent, &title)
            && existing != id
        {
            return Err(MindNoteError::DuplicateTitle {
                parent: self.node(parent)?.title.clone(),
                title,
            });
        }
        self.node_mut(id)?.title = title;
        self.refresh_versions(id);
        Ok(())
    }

    /// Update the progress status.
    pub fn set_status(&mut self, id: NodeId, status: WorkspaceStatus) -> Result<()> {
        self.node_mut(id)?.status = status;
        self.refresh_versions(id);
        Ok(())
    }

    /// Replace or clear the icon.
    pub fn set_icon(&mut self, id: NodeId, icon: Option<Icon>) -> Result<()> {
        self.node_mut(id)?.icon = icon;
        self.refresh_versions(id);
        Ok(())
    }

    /// Append a content item, returning its index.
    ///
    /// Subspace links are rejected; use [`create_child`](Self::create_child).
    pub fn add_item(&mut self, id: NodeId, item: Item) -> Result<usize> {
        reject_link(&item)?;
        let node = self.node_mut(id)?;
        node.items.push(item);
        let index = node.items.len() - 1;
        self.refresh_versions(id);
        Ok(index)
    }

    /// Replace the item at `index` (links can neither be replaced nor inserted).
    pub fn replace_item(&mut self, id: NodeId, index: usize, item: Item) -> Result<()> {
        reject_link(&item)?;
        let node = self.node_mut(id)?;
        let slot = node
            .items
            .get_mut(index)
            .ok_or_else(|| item_out_of_range(index))?;
        reject_link(slot)?;
        *slot = item;
        self.refresh_versions(id);
        Ok(())
    }

    /// Remove the item at `index`. Removing a subspace link removes the subspace.
    pub fn remove_item(&mut self, id: NodeId, index: usize) -> Result<Item> {
        let item = self
            .node(id)?
            .items
            .get(index)
            .cloned()
            .ok_or_else(|| item_out_of_range(index))?;

        if let Item::SubspaceLink { target } = item {
            self.remove_node(target)?;
        } else {
            self.node_mut(id)?.items.remove(index);
            self.refresh_versions(id);
        }
        Ok(item)
    }

    /// Move an item to a new position within the same workspace.
    pub fn move_item(&mut self, id: NodeId, from: usize, to: usize) -> Result<()> {
        let node = self.node_mut(id)?;
        let len = node.items.len();
        if from >= len {
            return Err(item_out_of_range(from));
        }
        if to >= len {
            return Err(item_out_of_range(to));
        }
        let item = node.items.remove(from);
        node.items.insert(to, item);
        self.refresh_versions(id);
        Ok(())
    }

    /// Check the structural invariants of the whole tree.
    pub fn validate(&self) -> Result<()> {
        for id in self.walk(self.root)? {
            let node = self.node(id)?;
            let mut seen = Vec::new();
            for child in &node.children {
                let child_node = self.node(*child)?;
                if child_node.parent != Some(id) {
                    return Err(invalid(format!(
                        "'{}' does not point back to '{}'",
                        child_node.title, node.title
                    )));
                }
                if seen.contains(&child_node.title.as_str()) {
                    return Err(MindNoteError::DuplicateTitle {
                        parent: node.title.clone(),
                        title: child_node.title.clone(),
                    });
                }
                seen.push(child_node.title.as_str());

                let links = node
                    .items
                    .iter()
                    .filter(|i| matches!(i, Item::SubspaceLink { target } if target == child))
                    .count();
                if links != 1 {
                    return Err(invalid(format!(
                        "'{}' has {} links in '{}'",
                        child_node.title, links, node.title
                    )));
                }
            }
            for item in &node.items {
                if let Item::SubspaceLink { target } = item
                    && !node.children.contains(target)
                {
                    return Err(invalid(format!(
                        "'{}' links to a node that is not its child",
                        node.title
                    )));
                }
            }
        }
        Ok(())
    }

    /// Content hash of the subtree at `id`, ignoring every stored version.
    pub fn content_hash(&self, id: NodeId) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        self.hash_subtree(id, &mut hasher)?;
        Ok(format!("{:016x}", hasher.finish()))
    }

    fn hash_subtree(&self, id: NodeId, hasher: &mut DefaultHasher) -> Result<()> {
        let node = self.node(id)?;
        node.title.hash(hasher);
        node.status.hash(hasher);
        node.created_at.timestamp().hash(hasher);
        node.created_at.timestamp_subsec_nanos().hash(hasher);
        node.icon.hash(hasher);
        for item in &node.items {
            match item {
                // Arena slots differ between copies of the same tree
                Item::SubspaceLink { target } => {
                    "link".hash(hasher);
                    self.node(*target)?.title.hash(hasher);
                }
                other => other.hash(hasher),
            }
        }
        for child in &node.children {
            self.hash_subtree(*child, hasher)?;
        }
        Ok(())
    }

    /// Recompute the version of `id` and each of its ancestors.
    fn refresh_versions(&mut self, id: NodeId) {
        let Ok(chain) = self.path_chain(id) else {
            return;
        };
        for node in chain.into_iter().rev() {
            if let Ok(hash) = self.content_hash(node)
                && let Ok(n) = self.node_mut(node)
            {
                n.version = hash;
            }
        }
    }

    fn nodes_equal(&self, a: NodeId, other: &WorkspaceTree, b: NodeId) -> bool {
        let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
            return false;
        };
        if left.title != right.title
            || left.status != right.status
            || left.created_at != right.created_at
            || left.version != right.version
            || left.icon != right.icon
            || left.items.len() != right.items.len()
            || left.children.len() != right.children.len()
        {
            return false;
        }

        let items_match = left.items.iter().zip(&right.items).all(|pair| match pair {
            (Item::SubspaceLink { target: l }, Item::SubspaceLink { target: r }) => {
                self.get(*l).map(|n| &n.title) == other.get(*r).map(|n| &n.title)
            }
            (l, r) => l == r,
        });

        items_match
            && left
                .children
                .iter()
                .zip(&right.children)
                .all(|(l, r)| self.nodes_equal(*l, other, *r))
    }
}

/// Trees are equal when they have the same shape and values, whatever their arena layout.
impl PartialEq for WorkspaceTree {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.nodes_equal(self.root, other, other.root)
    }
}

impl Eq for WorkspaceTree {}

fn check_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(invalid("workspace titles cannot be empty".to_string()));
    }
    Ok(())
}

fn reject_link(item: &Item) -> Result<()> {
    if item.is_subspace_link() {
        return Err(invalid(
            "subspace links are managed by the tree; create or remove the subspace instead"
                .to_string(),
        ));
    }
    Ok(())
}

fn item_out_of_range(index: usize) -> MindNoteError {
    invalid(format!("no item at position {}", index))
}

fn invalid(message: String) -> MindNoteError {
    MindNoteError::InvalidOperation(message)
}

/// Render a tree outline for terminal display.
pub fn format_tree(tree: &WorkspaceTree, id: NodeId, prefix: &str) -> String {
    let Some(node) = tree.get(id) else {
        return String::new();
    };

    let mut result = format!("{} [{}]\n", node.title, node.status);

    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == child_count - 1;
        let connector = if is_last_child {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last_child { "    " } else { "│   " };

        result.push_str(prefix);
        result.push_str(connector);
        result.push_str(&format_tree(
            tree,
            *child,
            &format!("{}{}", prefix, child_prefix),
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_count(tree: &WorkspaceTree, id: NodeId) -> usize {
        tree.node(id)
            .unwrap()
            .items()
            .iter()
            .filter(|i| i.is_subspace_link())
            .count()
    }

    #[test]
    fn test_create_child_appends_link() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        tree.add_item(root, Item::text("intro")).unwrap();
        let child = tree.create_child(root, "Week 1").unwrap();

        let items = tree.node(root).unwrap().items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], Item::SubspaceLink { target: child });
        assert_eq!(tree.parent_of(child).unwrap(), Some(root));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        tree.create_child(root, "X").unwrap();

        let err = tree.create_child(root, "X").unwrap_err();
        assert!(matches!(err, MindNoteError::DuplicateTitle { .. }));
        // Nothing was added by the failed call
        assert_eq!(tree.children(root).unwrap().len(), 1);
        assert_eq!(link_count(&tree, root), 1);
    }

    #[test]
    fn test_same_title_allowed_under_different_parents() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let a = tree.create_child(root, "A").unwrap();
        tree.create_child(root, "Tasks").unwrap();
        tree.create_child(a, "Tasks").unwrap();
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_remove_node_detaches_subtree() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let a = tree.create_child(root, "A").unwrap();
        let b = tree.create_child(root, "B").unwrap();
        let a1 = tree.create_child(a, "A1").unwrap();
        tree.create_child(a1, "A1x").unwrap();
        tree.add_item(a1, Item::checkbox("call")).unwrap();

        let removed = tree.remove_node(a).unwrap();

        // All descendants are gone from the source tree
        assert_eq!(tree.len(), 2);
        assert!(tree.get(a).is_none());
        assert!(tree.get(a1).is_none());
        // Exactly one link removed from the former parent
        assert_eq!(link_count(&tree, root), 1);
        assert_eq!(tree.children(root).unwrap(), &[b]);
        assert!(tree.validate().is_ok());

        // The detached subtree is a valid tree of its own
        assert_eq!(removed.title(), "A");
        assert_eq!(removed.len(), 3);
        assert!(removed.validate().is_ok());
        let moved = removed.find_by_path(&["A1"]).unwrap();
        assert_eq!(removed.node(moved).unwrap().items().len(), 2);
    }

    #[test]
    fn test_remove_root_rejected() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        assert!(matches!(
            tree.remove_node(root),
            Err(MindNoteError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_unknown_node_id() {
        let tree = WorkspaceTree::create_root("Notes");
        assert!(matches!(
            tree.node(NodeId(42)),
            Err(MindNoteError::NodeNotFound(42))
        ));
    }

    #[test]
    fn test_path_chain_and_root_of() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let a = tree.create_child(root, "A").unwrap();
        let b = tree.create_child(a, "B").unwrap();

        assert_eq!(tree.path_chain(b).unwrap(), vec![root, a, b]);
        assert_eq!(tree.path_titles(b).unwrap(), vec!["Notes", "A", "B"]);
        assert_eq!(tree.root_of(b).unwrap(), root);
        assert_eq!(tree.find_by_path(&["A", "B"]), Some(b));
        assert_eq!(tree.find_by_path(&[]), Some(root));
        assert_eq!(tree.find_by_path(&["B"]), None);
        assert_eq!(tree.depth(b).unwrap(), 2);
    }

    #[test]
    fn test_nesting_stops_at_max_depth() {
        let mut tree = WorkspaceTree::create_root("Deep");
        let mut current = tree.root();
        for level in 1..=MAX_DEPTH {
            current = tree.create_child(current, format!("Level {}", level)).unwrap();
        }
        assert_eq!(tree.depth(current).unwrap(), MAX_DEPTH);

        let err = tree.create_child(current, "Too far").unwrap_err();
        assert!(matches!(err, MindNoteError::TooDeep { max: MAX_DEPTH, .. }));
        assert!(tree.children(current).unwrap().is_empty());
        assert_eq!(link_count(&tree, current), 0);
        assert_eq!(tree.len(), MAX_DEPTH + 1);
    }

    #[test]
    fn test_add_item_rejects_links() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let child = tree.create_child(root, "A").unwrap();

        let err = tree
            .add_item(root, Item::SubspaceLink { target: child })
            .unwrap_err();
        assert!(matches!(err, MindNoteError::InvalidOperation(_)));
        assert_eq!(link_count(&tree, root), 1);
    }

    #[test]
    fn test_remove_link_item_removes_subspace() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        tree.add_item(root, Item::text("keep")).unwrap();
        let child = tree.create_child(root, "A").unwrap();

        let removed = tree.remove_item(root, 1).unwrap();
        assert_eq!(removed, Item::SubspaceLink { target: child });
        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.node(root).unwrap().items(), &[Item::text("keep")]);
    }

    #[test]
    fn test_edits_refresh_ancestor_versions() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let a = tree.create_child(root, "A").unwrap();
        let root_before = tree.version(root).unwrap().to_string();
        let a_before = tree.version(a).unwrap().to_string();

        tree.add_item(a, Item::text("hello")).unwrap();

        assert_ne!(tree.version(a).unwrap(), a_before);
        assert_ne!(tree.version(root).unwrap(), root_before);
        assert_eq!(tree.version(root).unwrap().len(), 16);
    }

    #[test]
    fn test_rename_checks_siblings() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let a = tree.create_child(root, "A").unwrap();
        tree.create_child(root, "B").unwrap();

        assert!(tree.rename(a, "B").is_err());
        // Renaming to its own title is a no-op
        assert!(tree.rename(a, "A").is_ok());
        tree.rename(a, "C").unwrap();
        assert_eq!(tree.find_child(root, "C"), Some(a));
    }

    #[test]
    fn test_move_item() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        tree.add_item(root, Item::text("one")).unwrap();
        tree.add_item(root, Item::text("two")).unwrap();
        tree.add_item(root, Item::text("three")).unwrap();

        tree.move_item(root, 2, 0).unwrap();
        let texts: Vec<&Item> = tree.node(root).unwrap().items().iter().collect();
        assert_eq!(texts[0], &Item::text("three"));
        assert_eq!(texts[1], &Item::text("one"));
        assert!(tree.move_item(root, 5, 0).is_err());
    }

    #[test]
    fn test_structural_equality_ignores_arena_layout() {
        let mut left = WorkspaceTree::create_root("Notes");
        let root = left.root();
        let scratch = left.create_child(root, "Scratch").unwrap();
        left.create_child(root, "Keep").unwrap();
        left.remove_node(scratch).unwrap();

        let mut right = left.clone();
        assert_eq!(left, right);

        // A different payload breaks equality
        let r = right.root();
        right.add_item(r, Item::text("extra")).unwrap();
        assert_ne!(left, right);
    }

    #[test]
    fn test_format_tree() {
        let mut tree = WorkspaceTree::create_root("Notes");
        let root = tree.root();
        let a = tree.create_child(root, "A").unwrap();
        tree.create_child(a, "A1").unwrap();
        tree.create_child(root, "B").unwrap();

        let rendered = format_tree(&tree, root, "");
        assert_eq!(
            rendered,
            "Notes [not_started]\n├── A [not_started]\n│   └── A1 [not_started]\n└── B [not_started]\n"
        );
    }
}
