//! Directory-backed remote.
//!
//! `FsRemote` serves the [`RemoteGateway`] operations from a directory laid
//! out like the local store (`users/<id>/<title>.json`). It is what the CLI
//! syncs against when no server is configured, and it applies the same
//! migration rules as the account server: a title present on both sides with
//! different content is a conflict, identical content is neither new nor
//! conflicting, and account-only titles are reported as `server_only`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use super::{
    BoxFuture, MigrationConflict, MigrationDiff, MigrationResolution, PushAck, PushBatch,
    RemoteGateway, RootSummary, Side,
};
use crate::codec::{self, WorkspaceDocument};
use crate::error::{MindNoteError, Result};
use crate::fs::FileSystem;
use crate::store::{LocalStore, Scope};

/// A [`RemoteGateway`] that keeps each user's workspaces in a directory.
pub struct FsRemote<FS: FileSystem> {
    store: LocalStore<FS>,
    user: RwLock<Option<String>>,
    name: String,
}

impl<FS: FileSystem> FsRemote<FS> {
    /// Serve workspaces stored under `dir`.
    pub fn new(fs: FS, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("dir:{}", dir.display());
        Self {
            store: LocalStore::new(fs, dir),
            user: RwLock::new(None),
            name,
        }
    }

    /// Authenticate subsequent calls as `user`.
    pub fn sign_in(&self, user: impl Into<String>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user.into());
    }

    /// Drop the session.
    pub fn sign_out(&self) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The authenticated user, if any.
    pub fn current_user(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn scope(&self) -> Result<Scope> {
        self.current_user()
            .map(Scope::User)
            .ok_or_else(|| MindNoteError::gateway("not authenticated"))
    }

    fn all_documents(&self, scope: &Scope) -> Vec<WorkspaceDocument> {
        self.store
            .list(scope)
            .into_iter()
            .filter_map(|title| match self.store.load_record(scope, &title) {
                Ok(record) => Some(record.tree),
                Err(e) => {
                    log::warn!("Remote skipping unreadable '{}': {}", title, e);
                    None
                }
            })
            .collect()
    }

    /// Store a document, giving it a content version when it arrives without one.
    fn store_document(&self, scope: &Scope, mut doc: WorkspaceDocument) -> Result<RootSummary> {
        if doc.version.is_empty() {
            doc.version = codec::document_version(&doc).map_err(remote_error)?;
        }
        let summary = RootSummary::of(&doc);
        self.store.save_document(scope, doc).map_err(remote_error)?;
        Ok(summary)
    }

    fn roots(&self) -> Result<Vec<RootSummary>> {
        let scope = self.scope()?;
        Ok(self
            .all_documents(&scope)
            .iter()
            .map(RootSummary::of)
            .collect())
    }

    fn subtree(&self, title: &str) -> Result<WorkspaceDocument> {
        let scope = self.scope()?;
        self.store
            .load_record(&scope, title)
            .map(|record| record.tree)
            .map_err(remote_error)
    }

    fn push(&self, batch: PushBatch) -> Result<PushAck> {
        let scope = self.scope()?;
        let mut ack = PushAck::default();
        for doc in batch.workspaces {
            ack.accepted.push(self.store_document(&scope, doc)?);
        }
        log::info!(
            "Remote accepted {} workspace(s) for {}",
            ack.accepted.len(),
            scope
        );
        Ok(ack)
    }

    fn diff(&self, local: Vec<WorkspaceDocument>) -> Result<MigrationDiff> {
        let scope = self.scope()?;
        let server = self.all_documents(&scope);
        let local_titles: BTreeSet<&str> = local.iter().map(|d| d.title.as_str()).collect();

        let mut diff = MigrationDiff {
            server_only: server
                .iter()
                .filter(|d| !local_titles.contains(d.title.as_str()))
                .cloned()
                .collect(),
            ..Default::default()
        };

        for doc in local {
            match server.iter().find(|s| s.title == doc.title) {
                None => diff.new.push(doc),
                Some(existing) => {
                    let local_hash = codec::document_version(&doc).map_err(remote_error)?;
                    let server_hash = codec::document_version(existing).map_err(remote_error)?;
                    if local_hash != server_hash {
                        diff.conflicts.push(MigrationConflict {
                            title: doc.title.clone(),
                            local: doc,
                            server: existing.clone(),
                        });
                    }
                }
            }
        }

        Ok(diff)
    }

    fn apply(&self, resolution: MigrationResolution) -> Result<Vec<WorkspaceDocument>> {
        let scope = self.scope()?;

        for entry in resolution.resolve {
            // Server wins: nothing to store
            if entry.use_side != Side::Local {
                continue;
            }
            match entry.data {
                Some(mut data) => {
                    data.title = entry.title;
                    self.store_document(&scope, data)?;
                }
                None => log::warn!("Local resolution for '{}' carried no data", entry.title),
            }
        }

        let existing = self.store.list(&scope);
        for doc in resolution.new {
            if !existing.contains(&doc.title) {
                self.store_document(&scope, doc)?;
            }
        }

        Ok(self.all_documents(&scope))
    }
}

fn remote_error(err: MindNoteError) -> MindNoteError {
    match err {
        MindNoteError::Gateway(_) => err,
        other => MindNoteError::Gateway(other.to_string()),
    }
}

impl<FS: FileSystem> RemoteGateway for FsRemote<FS> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_roots(&self) -> BoxFuture<'_, Result<Vec<RootSummary>>> {
        Box::pin(async move { self.roots() })
    }

    fn fetch_subtree<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<WorkspaceDocument>> {
        Box::pin(async move { self.subtree(title) })
    }

    fn push_changes(&self, batch: PushBatch) -> BoxFuture<'_, Result<PushAck>> {
        Box::pin(async move { self.push(batch) })
    }

    fn propose_migration(
        &self,
        local: Vec<WorkspaceDocument>,
    ) -> BoxFuture<'_, Result<MigrationDiff>> {
        Box::pin(async move { self.diff(local) })
    }

    fn resolve_migration(
        &self,
        resolution: MigrationResolution,
    ) -> BoxFuture<'_, Result<Vec<WorkspaceDocument>>> {
        Box::pin(async move { self.apply(resolution) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::fs::InMemoryFileSystem;
    use crate::gateway::ResolveEntry;
    use crate::test_utils::block_on_test;
    use crate::workspace::{Item, WorkspaceTree};

    fn doc(title: &str, text: &str) -> WorkspaceDocument {
        let mut tree = WorkspaceTree::create_root(title);
        let root = tree.root();
        tree.add_item(root, Item::text(text)).unwrap();
        codec::encode(&tree).unwrap()
    }

    fn remote() -> FsRemote<InMemoryFileSystem> {
        let remote = FsRemote::new(InMemoryFileSystem::new(), "server");
        remote.sign_in("alice");
        remote
    }

    #[test]
    fn test_requires_session() {
        let remote = FsRemote::new(InMemoryFileSystem::new(), "server");
        let err = block_on_test(remote.fetch_roots()).unwrap_err();
        assert!(err.is_gateway());
    }

    #[test]
    fn test_push_then_fetch() {
        let remote = remote();
        let notes = doc("Notes", "hello");
        let version = notes.version.clone();

        let ack = block_on_test(remote.push_changes(PushBatch {
            workspaces: vec![notes.clone()],
        }))
        .unwrap();
        assert_eq!(ack.accepted[0].version, version);

        let roots = block_on_test(remote.fetch_roots()).unwrap();
        assert_eq!(
            roots,
            vec![RootSummary {
                title: "Notes".into(),
                version
            }]
        );
        let fetched = block_on_test(remote.fetch_subtree("Notes")).unwrap();
        assert_eq!(fetched.elements, notes.elements);
        assert_eq!(fetched.owner, "alice");

        // Missing titles are gateway failures
        assert!(block_on_test(remote.fetch_subtree("Nope")).unwrap_err().is_gateway());
    }

    #[test]
    fn test_users_are_separate() {
        let remote = remote();
        block_on_test(remote.push_changes(PushBatch {
            workspaces: vec![doc("Notes", "alice's")],
        }))
        .unwrap();

        // server/users/<id>/<title>.json
        let fs = remote.store.fs_ref();
        assert!(fs.exists(Path::new("server/users/alice/Notes.json")));
        assert!(!fs.exists(Path::new("server/alice/Notes.json")));

        remote.sign_in("bob");
        assert!(block_on_test(remote.fetch_roots()).unwrap().is_empty());
    }

    #[test]
    fn test_unversioned_documents_get_a_version() {
        let remote = remote();
        let mut bare = doc("Notes", "x");
        bare.version.clear();
        let ack = block_on_test(remote.push_changes(PushBatch {
            workspaces: vec![bare],
        }))
        .unwrap();
        assert_eq!(ack.accepted[0].version.len(), 16);
    }

    #[test]
    fn test_migration_diff_classification() {
        let remote = remote();
        let shared = doc("Same", "identical");
        block_on_test(remote.push_changes(PushBatch {
            workspaces: vec![shared.clone(), doc("Notes", "server"), doc("Work", "w")],
        }))
        .unwrap();

        let diff = block_on_test(remote.propose_migration(vec![
            shared,
            doc("Notes", "guest"),
            doc("Ideas", "new"),
        ]))
        .unwrap();

        assert_eq!(diff.new.len(), 1);
        assert_eq!(diff.new[0].title, "Ideas");
        assert_eq!(diff.conflicts.len(), 1);
        assert_eq!(diff.conflicts[0].title, "Notes");
        assert_eq!(diff.server_only.len(), 1);
        assert_eq!(diff.server_only[0].title, "Work");
    }

    #[test]
    fn test_apply_resolution() {
        let remote = remote();
        block_on_test(remote.push_changes(PushBatch {
            workspaces: vec![doc("Notes", "server"), doc("Work", "server")],
        }))
        .unwrap();

        let guest_notes = doc("Notes", "guest");
        let final_set = block_on_test(remote.resolve_migration(MigrationResolution {
            resolve: vec![
                ResolveEntry {
                    title: "Notes".into(),
                    use_side: Side::Local,
                    data: Some(guest_notes.clone()),
                },
                ResolveEntry {
                    title: "Work".into(),
                    use_side: Side::Server,
                    data: None,
                },
            ],
            // Existing titles are never overwritten through `new`
            new: vec![doc("Ideas", "idea"), doc("Work", "guest")],
        }))
        .unwrap();

        let titles: Vec<&str> = final_set.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Ideas", "Notes", "Work"]);
        let notes = final_set.iter().find(|d| d.title == "Notes").unwrap();
        assert_eq!(notes.elements, guest_notes.elements);
        let work = final_set.iter().find(|d| d.title == "Work").unwrap();
        assert_eq!(work.elements, doc("Work", "server").elements);
    }
}
