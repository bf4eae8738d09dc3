//! Workspace data types.
//!
//! This module contains the value types a workspace tree is made of:
//! - `NodeId` - Handle to a node inside a [`WorkspaceTree`](super::WorkspaceTree)
//! - `WorkspaceStatus` - Progress marker shown next to a workspace
//! - `Icon` - Raw image bytes attached to a workspace
//! - `Item` / `ListKind` - Typed content blocks
//! - `WorkspaceNode` - A single workspace (page) in the tree

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{MindNoteError, Result};

/// Handle to a node stored in a workspace tree arena.
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena slot backing this id.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress status of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    /// Nothing done yet
    #[default]
    NotStarted,
    /// Work has begun
    InProgress,
    /// Finished
    Completed,
}

impl WorkspaceStatus {
    /// Wire representation (`not_started`, `in_progress`, `completed`).
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceStatus::NotStarted => "not_started",
            WorkspaceStatus::InProgress => "in_progress",
            WorkspaceStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkspaceStatus {
    type Err = MindNoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" => Ok(WorkspaceStatus::NotStarted),
            "in_progress" | "doing" => Ok(WorkspaceStatus::InProgress),
            "completed" | "done" => Ok(WorkspaceStatus::Completed),
            other => Err(MindNoteError::InvalidOperation(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

/// Raw image bytes used as a workspace icon.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Icon(Vec<u8>);

impl Icon {
    /// Wrap raw image bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Standard base64 encoding used on the wire.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Decode a base64 icon payload.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        BASE64
            .decode(encoded.trim())
            .map(Icon)
            .map_err(|e| MindNoteError::Serialization(format!("invalid icon data: {}", e)))
    }
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Icon({} bytes)", self.0.len())
    }
}

/// Flavor of a list block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Numbered list
    Ordered,
    /// Bulleted list
    Unordered,
}

impl ListKind {
    /// Marker shown before the entry at `index` (0-based).
    ///
    /// Numbering is derived from position and never stored.
    pub fn marker(&self, index: usize) -> String {
        match self {
            ListKind::Ordered => format!("{}.", index + 1),
            ListKind::Unordered => "•".to_string(),
        }
    }
}

/// A typed content block inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    /// Free text
    Text {
        /// Body text
        content: String,
    },
    /// A labelled checkbox
    Checkbox {
        /// Label shown next to the box
        label: String,
        /// Whether the box is ticked
        checked: bool,
    },
    /// Ordered or unordered list
    List {
        /// Numbered or bulleted
        kind: ListKind,
        /// Entries in display order
        entries: Vec<String>,
    },
    /// Reference to an image file
    Image {
        /// Image location
        path: String,
    },
    /// Reference to an attached file
    File {
        /// File location
        path: String,
    },
    /// Section heading
    Title {
        /// Heading text
        text: String,
    },
    /// Link to a direct child workspace.
    ///
    /// Only created by [`WorkspaceTree::create_child`](super::WorkspaceTree::create_child).
    SubspaceLink {
        /// The linked child
        target: NodeId,
    },
}

impl Item {
    /// Plain text block.
    pub fn text(content: impl Into<String>) -> Self {
        Item::Text {
            content: content.into(),
        }
    }

    /// Unchecked checkbox.
    pub fn checkbox(label: impl Into<String>) -> Self {
        Item::Checkbox {
            label: label.into(),
            checked: false,
        }
    }

    /// List block.
    pub fn list(kind: ListKind, entries: Vec<String>) -> Self {
        Item::List { kind, entries }
    }

    /// Heading block.
    pub fn title(text: impl Into<String>) -> Self {
        Item::Title { text: text.into() }
    }

    /// Whether this item links to a subspace.
    pub fn is_subspace_link(&self) -> bool {
        matches!(self, Item::SubspaceLink { .. })
    }

    /// Short kind name used in listings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Item::Text { .. } => "text",
            Item::Checkbox { .. } => "checkbox",
            Item::List {
                kind: ListKind::Ordered,
                ..
            } => "ordered-list",
            Item::List {
                kind: ListKind::Unordered,
                ..
            } => "unordered-list",
            Item::Image { .. } => "image",
            Item::File { .. } => "file",
            Item::Title { .. } => "title",
            Item::SubspaceLink { .. } => "subspace",
        }
    }
}

/// A single workspace (page).
///
/// Nodes live inside a [`WorkspaceTree`](super::WorkspaceTree) arena and are
/// only mutated through the tree so that structural invariants hold.
#[derive(Debug, Clone)]
pub struct WorkspaceNode {
    pub(crate) title: String,
    pub(crate) status: WorkspaceStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) version: String,
    pub(crate) icon: Option<Icon>,
    pub(crate) items: Vec<Item>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl WorkspaceNode {
    pub(crate) fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: WorkspaceStatus::default(),
            created_at: Utc::now(),
            version: String::new(),
            icon: None,
            items: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Title, unique among siblings.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Progress status.
    pub fn status(&self) -> WorkspaceStatus {
        self.status
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Opaque change marker.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Icon bytes, if any.
    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }

    /// Content blocks in display order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Direct subspaces in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_aliases() {
        assert_eq!(
            "in-progress".parse::<WorkspaceStatus>().unwrap(),
            WorkspaceStatus::InProgress
        );
        assert_eq!(
            "DONE".parse::<WorkspaceStatus>().unwrap(),
            WorkspaceStatus::Completed
        );
        assert!("later".parse::<WorkspaceStatus>().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&WorkspaceStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
        assert_eq!(WorkspaceStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_ordered_markers_follow_position() {
        let kind = ListKind::Ordered;
        let markers: Vec<String> = (0..3).map(|i| kind.marker(i)).collect();
        assert_eq!(markers, vec!["1.", "2.", "3."]);
        assert_eq!(ListKind::Unordered.marker(7), "•");
    }

    #[test]
    fn test_icon_base64() {
        let icon = Icon::new(vec![0x89, b'P', b'N', b'G']);
        let decoded = Icon::from_base64(&icon.to_base64()).unwrap();
        assert_eq!(decoded, icon);

        // Garbage is a serialization error, not a panic
        assert!(matches!(
            Icon::from_base64("***"),
            Err(MindNoteError::Serialization(_))
        ));
    }
}
