//! Remote gateway interface.
//!
//! The sync coordinator talks to the server only through [`RemoteGateway`].
//! Implementations own the transport (HTTP client, session headers, retries);
//! the coordinator only sees structured documents and success/failure.
//!
//! # Wire shapes
//!
//! - Push batch: `{ "workspaces": [doc, ...] }`, acknowledged with
//!   `{ "accepted": [{ "title", "version" }, ...] }`
//! - Migration diff: `{ "new": [doc], "conflicts": [{ "title", "local", "server" }], "server_only": [doc] }`
//! - Migration resolution: `{ "resolve": [{ "title", "use": "local" | "server", "data"? }], "new": [doc] }`

mod fs_remote;

pub use fs_remote::FsRemote;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::WorkspaceDocument;
use crate::error::Result;

/// A boxed future for object-safe async methods.
///
/// Futures are `Send` for compatibility with multi-threaded runtimes.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Title and version of a top-level workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSummary {
    /// Workspace title
    pub title: String,
    /// Opaque version token
    pub version: String,
}

impl RootSummary {
    /// Summary of an encoded workspace.
    pub fn of(doc: &WorkspaceDocument) -> Self {
        Self {
            title: doc.title.clone(),
            version: doc.version.clone(),
        }
    }
}

/// Every top-level workspace of the active scope, sent in one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushBatch {
    /// Full trees to store remotely
    pub workspaces: Vec<WorkspaceDocument>,
}

/// Server acknowledgement of a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushAck {
    /// Stored workspaces and the versions the server now holds
    #[serde(default)]
    pub accepted: Vec<RootSummary>,
}

/// A workspace that exists on both sides with different content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConflict {
    /// Shared title
    pub title: String,
    /// The guest copy
    pub local: WorkspaceDocument,
    /// The account copy
    pub server: WorkspaceDocument,
}

/// Server classification of a guest→user migration proposal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationDiff {
    /// Guest workspaces the account does not have
    #[serde(default)]
    pub new: Vec<WorkspaceDocument>,
    /// Workspaces present on both sides with different content
    #[serde(default)]
    pub conflicts: Vec<MigrationConflict>,
    /// Account workspaces the guest does not have
    #[serde(default)]
    pub server_only: Vec<WorkspaceDocument>,
}

impl MigrationDiff {
    /// Nothing for the user to decide.
    pub fn needs_decision(&self) -> bool {
        !self.new.is_empty() || !self.conflicts.is_empty()
    }
}

/// Which copy wins a migration conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The guest copy
    #[default]
    Local,
    /// The account copy
    Server,
}

/// Decision for one conflicting title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveEntry {
    /// Conflicting title
    pub title: String,
    /// Winning side
    #[serde(rename = "use")]
    pub use_side: Side,
    /// Guest copy, sent only when the local side wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<WorkspaceDocument>,
}

/// Client answer to a [`MigrationDiff`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationResolution {
    /// Per-conflict decisions
    #[serde(default)]
    pub resolve: Vec<ResolveEntry>,
    /// New workspaces to create in the account
    #[serde(default)]
    pub new: Vec<WorkspaceDocument>,
}

/// Transport-agnostic access to the remote store.
///
/// All failures are reported as [`MindNoteError::Gateway`](crate::error::MindNoteError::Gateway).
pub trait RemoteGateway: Send + Sync {
    /// Human-readable name for this gateway
    fn name(&self) -> &str;

    /// Titles and versions of every top-level workspace of the signed-in user
    fn fetch_roots(&self) -> BoxFuture<'_, Result<Vec<RootSummary>>>;

    /// Full tree of one top-level workspace
    fn fetch_subtree<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<WorkspaceDocument>>;

    /// Store every workspace in the batch
    fn push_changes(&self, batch: PushBatch) -> BoxFuture<'_, Result<PushAck>>;

    /// Submit guest workspaces and receive the server's classification
    fn propose_migration(
        &self,
        local: Vec<WorkspaceDocument>,
    ) -> BoxFuture<'_, Result<MigrationDiff>>;

    /// Apply the client's decisions and receive the final set of workspaces
    fn resolve_migration(
        &self,
        resolution: MigrationResolution,
    ) -> BoxFuture<'_, Result<Vec<WorkspaceDocument>>>;
}

impl<T: RemoteGateway + ?Sized> RemoteGateway for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_roots(&self) -> BoxFuture<'_, Result<Vec<RootSummary>>> {
        (**self).fetch_roots()
    }

    fn fetch_subtree<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<WorkspaceDocument>> {
        (**self).fetch_subtree(title)
    }

    fn push_changes(&self, batch: PushBatch) -> BoxFuture<'_, Result<PushAck>> {
        (**self).push_changes(batch)
    }

    fn propose_migration(
        &self,
        local: Vec<WorkspaceDocument>,
    ) -> BoxFuture<'_, Result<MigrationDiff>> {
        (**self).propose_migration(local)
    }

    fn resolve_migration(
        &self,
        resolution: MigrationResolution,
    ) -> BoxFuture<'_, Result<Vec<WorkspaceDocument>>> {
        (**self).resolve_migration(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolution_wire_format() {
        let resolution = MigrationResolution {
            resolve: vec![
                ResolveEntry {
                    title: "Notes".into(),
                    use_side: Side::Server,
                    data: None,
                },
            ],
            new: vec![],
        };
        let value = serde_json::to_value(&resolution).unwrap();
        assert_eq!(
            value,
            json!({"resolve": [{"title": "Notes", "use": "server"}], "new": []})
        );
    }

    #[test]
    fn test_diff_parses_server_reply() {
        let diff: MigrationDiff = serde_json::from_value(json!({
            "new": [{"title": "Ideas", "version": "g1"}],
            "conflicts": [],
            "server_only": [{"title": "Work"}]
        }))
        .unwrap();
        assert!(diff.needs_decision());
        assert_eq!(diff.new[0].title, "Ideas");
        assert_eq!(diff.server_only[0].title, "Work");

        // A server that omits empty lists is fine too
        let empty: MigrationDiff = serde_json::from_value(json!({})).unwrap();
        assert!(!empty.needs_decision());
    }
}
