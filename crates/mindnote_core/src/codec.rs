//! Workspace tree ⇄ portable document conversion.
//!
//! A [`WorkspaceDocument`] is the recursive JSON shape shared by the local
//! store and the remote gateway:
//!
//! ```json
//! {
//!   "title": "Notes",
//!   "status": "in_progress",
//!   "created_at": "2024-03-01T10:00:00Z",
//!   "version": "9f1c2a0b7d3e4f51",
//!   "is_main": true,
//!   "icon": "iVBORw0KGgo...",
//!   "elements": [
//!     { "type": "TextItem", "content": "hello" },
//!     { "type": "SubspaceLinkItem", "subspaceTitle": "Week 1" }
//!   ],
//!   "pages": [ { "title": "Week 1", "...": "..." } ]
//! }
//! ```
//!
//! Elements with an unrecognised `type` are skipped. Subspace links are bound
//! to their page by title once all sibling pages have been decoded.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MindNoteError, Result};
use crate::workspace::{Icon, Item, ListKind, NodeId, WorkspaceNode, WorkspaceStatus, WorkspaceTree};

/// Serialized form of one workspace and, recursively, its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    /// Workspace title
    pub title: String,

    /// Progress status
    #[serde(default)]
    pub status: WorkspaceStatus,

    /// Creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Opaque change marker
    #[serde(default)]
    pub version: String,

    /// Informational flag set on top-level workspaces
    #[serde(default)]
    pub is_main: bool,

    /// Owning user id (top-level only, empty for guest data)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,

    /// Base64 icon bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Content blocks, kept as raw JSON so unknown kinds survive transport
    #[serde(default, alias = "items")]
    pub elements: Vec<Value>,

    /// Child workspaces
    #[serde(default)]
    pub pages: Vec<WorkspaceDocument>,
}

impl WorkspaceDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MindNoteError::Serialization(e.to_string()))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Wire form of a content block, tagged by `type`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ElementRecord {
    TextItem {
        #[serde(default)]
        content: String,
    },
    CheckboxItem {
        #[serde(default)]
        label: String,
        #[serde(default)]
        checked: bool,
    },
    OrderedListItem {
        #[serde(default)]
        items: Vec<String>,
    },
    UnorderedListItem {
        #[serde(default)]
        items: Vec<String>,
    },
    ImageItem {
        #[serde(default, rename = "imagePath")]
        image_path: String,
    },
    FileItem {
        #[serde(default, rename = "filePath")]
        file_path: String,
    },
    TitleItem {
        #[serde(default)]
        content: String,
    },
    SubspaceLinkItem {
        #[serde(rename = "subspaceTitle", alias = "subspaceId")]
        subspace_title: String,
    },
}

const KNOWN_TAGS: &[&str] = &[
    "TextItem",
    "CheckboxItem",
    "OrderedListItem",
    "UnorderedListItem",
    "ImageItem",
    "FileItem",
    "TitleItem",
    "SubspaceLinkItem",
];

/// Encode the whole tree, starting at its root.
pub fn encode(tree: &WorkspaceTree) -> Result<WorkspaceDocument> {
    encode_node(tree, tree.root(), true)
}

/// Encode the subtree at `id`. `is_root` only toggles the `is_main` flag and the owner field.
pub fn encode_node(tree: &WorkspaceTree, id: NodeId, is_root: bool) -> Result<WorkspaceDocument> {
    let node = tree.node(id)?;

    let elements = node
        .items()
        .iter()
        .map(|item| encode_item(tree, item))
        .collect::<Result<Vec<_>>>()?;

    let pages = node
        .children()
        .iter()
        .map(|child| encode_node(tree, *child, false))
        .collect::<Result<Vec<_>>>()?;

    Ok(WorkspaceDocument {
        title: node.title().to_string(),
        status: node.status(),
        created_at: node.created_at(),
        version: node.version().to_string(),
        is_main: is_root,
        owner: if is_root {
            tree.owner().to_string()
        } else {
            String::new()
        },
        icon: node.icon().map(Icon::to_base64),
        elements,
        pages,
    })
}

fn encode_item(tree: &WorkspaceTree, item: &Item) -> Result<Value> {
    let record = match item {
        Item::Text { content } => ElementRecord::TextItem {
            content: content.clone(),
        },
        Item::Checkbox { label, checked } => ElementRecord::CheckboxItem {
            label: label.clone(),
            checked: *checked,
        },
        Item::List {
            kind: ListKind::Ordered,
            entries,
        } => ElementRecord::OrderedListItem {
            items: entries.clone(),
        },
        Item::List {
            kind: ListKind::Unordered,
            entries,
        } => ElementRecord::UnorderedListItem {
            items: entries.clone(),
        },
        Item::Image { path } => ElementRecord::ImageItem {
            image_path: path.clone(),
        },
        Item::File { path } => ElementRecord::FileItem {
            file_path: path.clone(),
        },
        Item::Title { text } => ElementRecord::TitleItem {
            content: text.clone(),
        },
        Item::SubspaceLink { target } => ElementRecord::SubspaceLinkItem {
            subspace_title: tree.node(*target)?.title().to_string(),
        },
    };
    Ok(serde_json::to_value(record)?)
}

/// Rebuild a tree from its document. Versions are kept as stored.
pub fn decode(doc: &WorkspaceDocument) -> Result<WorkspaceTree> {
    let mut tree = WorkspaceTree::from_root_node(node_shell(doc)?);
    tree.set_owner(doc.owner.clone());
    let root = tree.root();
    decode_into(&mut tree, root, doc)?;
    tree.validate()?;
    Ok(tree)
}

/// Decode from an untyped JSON value.
pub fn decode_value(value: Value) -> Result<WorkspaceTree> {
    let doc: WorkspaceDocument =
        serde_json::from_value(value).map_err(|e| MindNoteError::Serialization(e.to_string()))?;
    decode(&doc)
}

/// Encode a tree as pretty JSON.
pub fn to_json(tree: &WorkspaceTree) -> Result<String> {
    encode(tree)?.to_json()
}

/// Decode a tree from JSON text.
pub fn from_json(json: &str) -> Result<WorkspaceTree> {
    decode(&WorkspaceDocument::from_json(json)?)
}

/// Version token derived from the content of the subtree at `id`.
pub fn content_version(tree: &WorkspaceTree, id: NodeId) -> Result<String> {
    tree.content_hash(id)
}

/// Version token for a document that arrived without one.
pub fn document_version(doc: &WorkspaceDocument) -> Result<String> {
    let tree = decode(doc)?;
    tree.content_hash(tree.root())
}

fn node_shell(doc: &WorkspaceDocument) -> Result<WorkspaceNode> {
    if doc.title.trim().is_empty() {
        return Err(MindNoteError::Serialization(
            "workspace without a title".to_string(),
        ));
    }

    let icon = match doc.icon.as_deref() {
        Some(encoded) if !encoded.trim().is_empty() => Some(Icon::from_base64(encoded)?),
        _ => None,
    };

    let mut node = WorkspaceNode::new(doc.title.clone());
    node.status = doc.status;
    node.created_at = doc.created_at;
    node.version = doc.version.clone();
    node.icon = icon;
    Ok(node)
}

fn decode_into(tree: &mut WorkspaceTree, id: NodeId, doc: &WorkspaceDocument) -> Result<()> {
    let mut pages: HashMap<&str, NodeId> = HashMap::new();
    for page in &doc.pages {
        if pages.contains_key(page.title.as_str()) {
            return Err(MindNoteError::DuplicateTitle {
                parent: doc.title.clone(),
                title: page.title.clone(),
            });
        }
        let child = tree.attach(id, node_shell(page)?)?;
        decode_into(tree, child, page)?;
        pages.insert(page.title.as_str(), child);
    }

    let mut linked = HashSet::new();
    let mut items = Vec::with_capacity(doc.elements.len());
    for value in &doc.elements {
        let Some(record) = decode_element(value)? else {
            continue;
        };
        match record {
            ElementRecord::SubspaceLinkItem { subspace_title } => {
                match pages.get(subspace_title.as_str()) {
                    Some(target) if linked.insert(*target) => {
                        items.push(Item::SubspaceLink { target: *target })
                    }
                    Some(_) => log::warn!(
                        "Dropping repeated link to '{}' in '{}'",
                        subspace_title,
                        doc.title
                    ),
                    None => log::warn!(
                        "Dropping link to missing page '{}' in '{}'",
                        subspace_title,
                        doc.title
                    ),
                }
            }
            other => items.extend(item_from_record(other)),
        }
    }

    for child in tree.children(id)?.to_vec() {
        if !linked.contains(&child) {
            log::warn!(
                "Page '{}' had no link in '{}', appending one",
                tree.node(child)?.title(),
                doc.title
            );
            items.push(Item::SubspaceLink { target: child });
        }
    }

    tree.node_mut(id)?.items = items;
    Ok(())
}

fn decode_element(value: &Value) -> Result<Option<ElementRecord>> {
    let tag = value.get("type").and_then(Value::as_str).unwrap_or_default();
    if !KNOWN_TAGS.contains(&tag) {
        log::debug!("Skipping element with unknown type '{}'", tag);
        return Ok(None);
    }

    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|e| MindNoteError::Serialization(format!("{}: {}", tag, e)))
}

fn item_from_record(record: ElementRecord) -> Option<Item> {
    let item = match record {
        ElementRecord::TextItem { content } => Item::Text { content },
        ElementRecord::CheckboxItem { label, checked } => Item::Checkbox { label, checked },
        ElementRecord::OrderedListItem { items } => Item::List {
            kind: ListKind::Ordered,
            entries: items,
        },
        ElementRecord::UnorderedListItem { items } => Item::List {
            kind: ListKind::Unordered,
            entries: items,
        },
        ElementRecord::ImageItem { image_path } => Item::Image { path: image_path },
        ElementRecord::FileItem { file_path } => Item::File { path: file_path },
        ElementRecord::TitleItem { content } => Item::Title { text: content },
        // Links are bound by the caller
        ElementRecord::SubspaceLinkItem { .. } => return None,
    };
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> WorkspaceTree {
        let mut tree = WorkspaceTree::create_root("Notes");
        tree.set_owner("alice");
        let root = tree.root();
        tree.add_item(root, Item::title("Plan")).unwrap();
        tree.add_item(root, Item::text("<b>hello</b>")).unwrap();
        let week = tree.create_child(root, "Week 1").unwrap();
        tree.add_item(
            root,
            Item::list(ListKind::Ordered, vec!["a".into(), "b".into()]),
        )
        .unwrap();
        tree.add_item(week, Item::checkbox("call mom")).unwrap();
        tree.add_item(
            week,
            Item::Image {
                path: "img/cat.png".into(),
            },
        )
        .unwrap();
        tree.add_item(
            week,
            Item::File {
                path: "docs/plan.pdf".into(),
            },
        )
        .unwrap();
        let day = tree.create_child(week, "Monday").unwrap();
        tree.add_item(
            day,
            Item::list(ListKind::Unordered, vec!["milk".into()]),
        )
        .unwrap();
        tree.set_status(week, WorkspaceStatus::InProgress).unwrap();
        tree.set_icon(day, Some(Icon::new(vec![1, 2, 3, 250])))
            .unwrap();
        tree
    }

    #[test]
    fn test_round_trip_preserves_tree() {
        let tree = sample_tree();
        let doc = encode(&tree).unwrap();
        let decoded = decode(&doc).unwrap();
        assert_eq!(decoded, tree);

        // Through JSON text as well
        let json = to_json(&tree).unwrap();
        assert_eq!(from_json(&json).unwrap(), tree);
    }

    #[test]
    fn test_encode_shape() {
        let tree = sample_tree();
        let doc = encode(&tree).unwrap();

        assert!(doc.is_main);
        assert_eq!(doc.owner, "alice");
        assert!(!doc.pages[0].is_main);
        assert!(doc.pages[0].owner.is_empty());
        assert_eq!(doc.pages[0].status, WorkspaceStatus::InProgress);
        assert_eq!(
            doc.elements[2],
            json!({"type": "SubspaceLinkItem", "subspaceTitle": "Week 1"})
        );
        assert_eq!(
            doc.elements[3],
            json!({"type": "OrderedListItem", "items": ["a", "b"]})
        );
        assert_eq!(
            doc.pages[0].elements[1],
            json!({"type": "ImageItem", "imagePath": "img/cat.png"})
        );
    }

    #[test]
    fn test_unknown_tags_are_skipped() {
        let doc = json!({
            "title": "Notes",
            "elements": [
                {"type": "TextItem", "content": "one"},
                {"type": "VideoItem", "url": "x"},
                {"content": "no type at all"},
                {"type": "TextItem", "content": "two"}
            ],
            "pages": []
        });
        let tree = decode_value(doc).unwrap();
        let items = tree.node(tree.root()).unwrap().items();
        assert_eq!(items, &[Item::text("one"), Item::text("two")]);
    }

    #[test]
    fn test_malformed_known_tag_is_an_error() {
        let doc = json!({
            "title": "Notes",
            "elements": [{"type": "CheckboxItem", "label": "x", "checked": "yes"}]
        });
        assert!(matches!(
            decode_value(doc),
            Err(MindNoteError::Serialization(_))
        ));
    }

    #[test]
    fn test_over_deep_document_rejected() {
        let mut doc = encode(&WorkspaceTree::create_root("Leaf")).unwrap();
        for level in (0..=crate::workspace::MAX_DEPTH).rev() {
            let mut parent = encode(&WorkspaceTree::create_root(format!("Level {}", level))).unwrap();
            parent.pages.push(doc);
            doc = parent;
        }
        assert!(matches!(
            decode(&doc),
            Err(MindNoteError::TooDeep { .. })
        ));

        // One level shallower is fine
        let inner = doc.pages.remove(0);
        assert!(decode(&inner).is_ok());
    }

    #[test]
    fn test_links_bind_after_pages() {
        // The link comes before the page list in the document
        let doc = json!({
            "title": "Notes",
            "items": [
                {"type": "SubspaceLinkItem", "subspaceTitle": "B"},
                {"type": "TextItem", "content": "between"},
                {"type": "SubspaceLinkItem", "subspaceId": "A"}
            ],
            "pages": [{"title": "A"}, {"title": "B"}]
        });
        let tree = decode_value(doc).unwrap();
        let root = tree.root();
        let a = tree.find_child(root, "A").unwrap();
        let b = tree.find_child(root, "B").unwrap();
        assert_eq!(
            tree.node(root).unwrap().items(),
            &[
                Item::SubspaceLink { target: b },
                Item::text("between"),
                Item::SubspaceLink { target: a },
            ]
        );
    }

    #[test]
    fn test_dangling_and_missing_links_are_repaired() {
        let doc = json!({
            "title": "Notes",
            "elements": [{"type": "SubspaceLinkItem", "subspaceTitle": "Ghost"}],
            "pages": [{"title": "Real"}]
        });
        let tree = decode_value(doc).unwrap();
        let root = tree.root();
        let real = tree.find_child(root, "Real").unwrap();
        assert_eq!(
            tree.node(root).unwrap().items(),
            &[Item::SubspaceLink { target: real }]
        );
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_duplicate_page_titles_rejected() {
        let doc = json!({
            "title": "Notes",
            "pages": [{"title": "A"}, {"title": "A"}]
        });
        assert!(matches!(
            decode_value(doc),
            Err(MindNoteError::DuplicateTitle { .. })
        ));
    }

    #[test]
    fn test_defaults_for_sparse_documents() {
        let doc = WorkspaceDocument::from_json(r#"{"title": "Bare"}"#).unwrap();
        assert_eq!(doc.status, WorkspaceStatus::NotStarted);
        assert!(doc.version.is_empty());
        assert!(doc.icon.is_none());

        let tree = decode(&doc).unwrap();
        assert_eq!(tree.title(), "Bare");
        assert!(tree.owner().is_empty());
    }

    #[test]
    fn test_document_version_is_stable() {
        let tree = sample_tree();
        let doc = encode(&tree).unwrap();
        let mut blank = doc.clone();
        blank.version.clear();

        // Stored versions do not feed into the content hash
        assert_eq!(
            document_version(&doc).unwrap(),
            document_version(&blank).unwrap()
        );
        assert_eq!(
            document_version(&doc).unwrap(),
            content_version(&tree, tree.root()).unwrap()
        );
    }
}
