//! The sync coordinator.
//!
//! [`SyncCoordinator`] owns the protocol between the [`LocalStore`] and a
//! [`RemoteGateway`]:
//!
//! - **Full sync** pulls every remote root, adopting trees the local store is
//!   missing and routing version conflicts to the [`ConflictResolver`].
//! - **Push** sends every local root of the signed-in user in one batch.
//! - **Migration** moves guest workspaces into a freshly signed-in account.
//!
//! At most one flow runs at a time; a request that finds another in flight
//! returns [`SyncOutcome::Skipped`] without touching anything. Every flow
//! gathers all remote data before its first local write, so a gateway
//! failure or a cancelled resolution leaves the store as it was.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::Notify;

use super::events::{CallbackRegistry, EventCallback, SubscriptionId, SyncEvent};
use super::{SyncKind, SyncOutcome, SyncReport, SyncState};
use crate::codec::{self, WorkspaceDocument};
use crate::error::{MindNoteError, Result};
use crate::fs::FileSystem;
use crate::gateway::{MigrationDiff, MigrationResolution, PushBatch, RemoteGateway, ResolveEntry, Side};
use crate::resolver::{
    ConflictDiff, ConflictResolution, ConflictResolver, MigrationDecision, VersionConflict,
};
use crate::store::{LocalStore, Scope};

/// Coordinates local storage with the remote.
pub struct SyncCoordinator<FS: FileSystem, G: RemoteGateway> {
    store: Arc<LocalStore<FS>>,
    gateway: G,
    resolver: Arc<dyn ConflictResolver>,
    events: CallbackRegistry,
    in_flight: AtomicBool,
    state: Mutex<SyncState>,
    user: RwLock<Option<String>>,
    cancel: Notify,
}

/// Marks a flow as running; dropping it returns the coordinator to idle.
struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a Mutex<SyncState>,
    events: &'a CallbackRegistry,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        set_state(self.state, self.events, SyncState::Idle);
        self.in_flight.store(false, Ordering::Release);
    }
}

fn set_state(state: &Mutex<SyncState>, events: &CallbackRegistry, next: SyncState) {
    let changed = {
        let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = *current != next;
        *current = next;
        changed
    };
    if changed {
        log::debug!("Sync state: {}", next.description());
        events.emit(&SyncEvent::StateChanged { state: next });
    }
}

impl<FS: FileSystem, G: RemoteGateway> SyncCoordinator<FS, G> {
    /// Create an idle coordinator with nobody signed in.
    pub fn new(store: Arc<LocalStore<FS>>, gateway: G, resolver: Arc<dyn ConflictResolver>) -> Self {
        Self {
            store,
            gateway,
            resolver,
            events: CallbackRegistry::new(),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SyncState::Idle),
            user: RwLock::new(None),
            cancel: Notify::new(),
        }
    }

    /// The local store.
    pub fn store(&self) -> &LocalStore<FS> {
        &self.store
    }

    /// The remote gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Event registry for status subscribers.
    pub fn events(&self) -> &CallbackRegistry {
        &self.events
    }

    /// Subscribe to sync events.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Set or clear the signed-in user.
    pub fn set_user(&self, user: Option<String>) {
        log::info!(
            "Sync user: {}",
            user.as_deref().unwrap_or("(signed out)")
        );
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Scope local edits go to: the user's when signed in, guest otherwise.
    pub fn active_scope(&self) -> Scope {
        self.current_user().map(Scope::User).unwrap_or(Scope::Guest)
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a flow is running.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Abandon a pending conflict or migration resolution.
    ///
    /// The waiting flow ends with [`SyncOutcome::Cancelled`] and commits
    /// nothing. Returns false when no resolution is pending.
    pub fn cancel_resolution(&self) -> bool {
        if !self.state().is_awaiting() {
            return false;
        }
        log::info!("Cancelling pending resolution");
        self.cancel.notify_waiters();
        true
    }

    /// Pull every remote root into the user's storage.
    ///
    /// Roots missing locally are adopted. Roots whose versions differ are
    /// handed to the resolver; keep-remote choices are adopted and keep-local
    /// choices are pushed once the pull has committed.
    pub async fn perform_full_sync(&self) -> Result<SyncOutcome> {
        let Some(guard) = self.begin(SyncKind::Full) else {
            return Ok(SyncOutcome::Skipped);
        };
        let result = match self.user_scope() {
            Ok(scope) => self.full_sync(&scope).await,
            Err(e) => Err(e),
        };
        drop(guard);
        self.finish(SyncKind::Full, result)
    }

    /// Send every root in the user's storage to the remote.
    pub async fn sync_local_changes(&self) -> Result<SyncOutcome> {
        let Some(guard) = self.begin(SyncKind::Push) else {
            return Ok(SyncOutcome::Skipped);
        };
        let result = match self.user_scope() {
            Ok(scope) => self.push_all(&scope).await,
            Err(e) => Err(e),
        };
        drop(guard);
        self.finish(SyncKind::Push, result)
    }

    /// Move guest workspaces into the signed-in user's account.
    ///
    /// Without guest data this is a full sync. Otherwise the server
    /// classifies the guest trees, the resolver decides, and the final set
    /// replaces the user's storage before guest storage is cleared.
    pub async fn start_user_sync(&self) -> Result<SyncOutcome> {
        let Some(guard) = self.begin(SyncKind::Migration) else {
            return Ok(SyncOutcome::Skipped);
        };
        let result = match self.user_scope() {
            Ok(scope) => self.migrate(&scope).await,
            Err(e) => Err(e),
        };
        drop(guard);
        self.finish(SyncKind::Migration, result)
    }

    fn user_scope(&self) -> Result<Scope> {
        self.current_user()
            .map(Scope::User)
            .ok_or(MindNoteError::NotAuthenticated)
    }

    fn emit(&self, event: SyncEvent) {
        self.events.emit(&event);
    }

    fn set_state(&self, next: SyncState) {
        set_state(&self.state, &self.events, next);
    }

    fn begin(&self, kind: SyncKind) -> Option<FlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Skipping {:?} sync: another sync is in flight", kind);
            self.emit(SyncEvent::SyncSkipped { kind });
            return None;
        }
        let guard = FlightGuard {
            in_flight: &self.in_flight,
            state: &self.state,
            events: &self.events,
        };
        self.emit(SyncEvent::SyncStarted { kind });
        self.set_state(SyncState::Syncing);
        Some(guard)
    }

    fn finish(&self, kind: SyncKind, result: Result<SyncOutcome>) -> Result<SyncOutcome> {
        match &result {
            Ok(SyncOutcome::Completed(report)) => {
                // A migration without guest data reports as a full sync
                let kind = report.kind;
                log::info!(
                    "{:?} sync complete: {} adopted, {} pushed",
                    kind,
                    report.adopted.len(),
                    report.pushed.len()
                );
                self.emit(SyncEvent::SyncCompleted {
                    kind,
                    adopted: report.adopted.len(),
                    pushed: report.pushed.len(),
                });
            }
            Ok(SyncOutcome::Cancelled) => {
                log::info!("{:?} sync cancelled", kind);
                self.emit(SyncEvent::SyncCancelled { kind });
            }
            Ok(SyncOutcome::Skipped) => {}
            Err(e) => {
                log::warn!("{:?} sync failed: {}", kind, e);
                self.emit(SyncEvent::failed(kind, e));
            }
        }
        result
    }

    fn warn(&self, message: String) {
        log::warn!("{}", message);
        self.emit(SyncEvent::Warning { message });
    }

    /// Park in `awaiting` until `question` answers or the resolution is cancelled.
    async fn await_resolution<T>(
        &self,
        awaiting: SyncState,
        question: impl Future<Output = Option<T>>,
    ) -> Option<T> {
        // Registered before the state change so a cancel cannot slip between
        let cancelled = self.cancel.notified();
        self.set_state(awaiting);
        let answer = futures_lite::future::or(question, async {
            cancelled.await;
            None
        })
        .await;
        self.set_state(SyncState::Syncing);
        answer
    }

    async fn full_sync(&self, scope: &Scope) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(SyncKind::Full);
        let roots = self.gateway.fetch_roots().await?;

        let mut to_adopt = Vec::new();
        let mut unreadable = Vec::new();
        let mut conflicts = Vec::new();
        for root in roots {
            match self.store.load(scope, &root.title) {
                Ok(local) => {
                    let local_version = local.version(local.root())?;
                    if local_version == root.version {
                        report.up_to_date.push(root.title);
                    } else {
                        conflicts.push(VersionConflict {
                            local_version: local_version.to_string(),
                            remote_version: root.version,
                            title: root.title,
                        });
                    }
                }
                Err(MindNoteError::NotFound { .. }) => to_adopt.push(root.title),
                Err(e) => {
                    self.warn(format!(
                        "Local copy of '{}' is unreadable, replacing it from the remote: {}",
                        root.title, e
                    ));
                    unreadable.push(root.title.clone());
                    to_adopt.push(root.title);
                }
            }
        }

        if !conflicts.is_empty() {
            let diff = ConflictDiff { conflicts };
            let conflict = MindNoteError::VersionConflict {
                titles: diff.titles(),
            };
            log::info!("{}, waiting for a decision", conflict);
            self.emit(SyncEvent::ConflictDetected {
                titles: diff.titles(),
                message: conflict.to_string(),
            });

            let question = self.resolver.resolve_conflicts(&diff);
            let Some(decision) = self
                .await_resolution(SyncState::AwaitingConflictResolution, question)
                .await
            else {
                return Ok(SyncOutcome::Cancelled);
            };

            for conflict in diff.conflicts {
                match decision.choice_for(&conflict.title) {
                    ConflictResolution::KeepRemote => to_adopt.push(conflict.title),
                    ConflictResolution::KeepLocal => report.kept_local.push(conflict.title),
                }
            }
        }

        let mut fetched = Vec::with_capacity(to_adopt.len());
        for title in &to_adopt {
            fetched.push(self.fetch_checked(title).await?);
        }

        // Commit point
        for title in &unreadable {
            if let Some(backup) = self.store.backup_record(scope, title)? {
                self.warn(format!("Kept the unreadable '{}' as {}", title, backup.display()));
            }
        }
        let adopted: Vec<(String, String)> = fetched
            .iter()
            .map(|doc| (doc.title.clone(), doc.version.clone()))
            .collect();
        self.store.save_all(scope, fetched)?;
        for (title, version) in adopted {
            self.emit(SyncEvent::WorkspaceAdopted {
                title: title.clone(),
                version,
            });
            report.adopted.push(title);
        }
        self.store.set_last_sync_time(scope, Utc::now())?;

        if !report.kept_local.is_empty() {
            // The pull already committed; a failed push is reported but does not undo it
            match self.push_titles(scope, &report.kept_local).await {
                Ok(pushed) => report.pushed = pushed,
                Err(e) => {
                    log::warn!("Pushing kept-local workspaces failed: {}", e);
                    self.emit(SyncEvent::failed(SyncKind::Push, &e));
                }
            }
        }

        Ok(SyncOutcome::Completed(report))
    }

    /// Fetch one subtree and make sure it decodes before anything is stored.
    async fn fetch_checked(&self, title: &str) -> Result<WorkspaceDocument> {
        let mut doc = self.gateway.fetch_subtree(title).await?;
        doc.title = title.to_string();
        codec::decode(&doc).map_err(|e| {
            MindNoteError::gateway(format!("remote sent an invalid '{}': {}", title, e))
        })?;
        Ok(doc)
    }

    async fn push_all(&self, scope: &Scope) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(SyncKind::Push);
        let titles: Vec<String> = self.store.list(scope).into_iter().collect();
        report.pushed = self.push_titles(scope, &titles).await?;
        self.store.set_last_sync_time(scope, Utc::now())?;
        Ok(SyncOutcome::Completed(report))
    }

    async fn push_titles(&self, scope: &Scope, titles: &[String]) -> Result<Vec<String>> {
        let mut workspaces = Vec::with_capacity(titles.len());
        for title in titles {
            match self.store.load(scope, title) {
                Ok(tree) => workspaces.push(codec::encode(&tree)?),
                Err(e) => self.warn(format!("Not pushing '{}': {}", title, e)),
            }
        }
        if workspaces.is_empty() {
            return Ok(Vec::new());
        }

        let count = workspaces.len();
        let ack = self.gateway.push_changes(PushBatch { workspaces }).await?;
        log::debug!(
            "{} accepted {} of {} workspace(s)",
            self.gateway.name(),
            ack.accepted.len(),
            count
        );
        Ok(ack.accepted.into_iter().map(|summary| summary.title).collect())
    }

    async fn migrate(&self, scope: &Scope) -> Result<SyncOutcome> {
        let guest = Scope::Guest;
        let mut local = Vec::new();
        for tree in self.store.load_all(&guest) {
            let mut doc = codec::encode(&tree)?;
            doc.owner = scope.owner().to_string();
            local.push(doc);
        }
        let proposed: Vec<String> = local.iter().map(|doc| doc.title.clone()).collect();
        let skipped = self.store.list(&guest).len().saturating_sub(proposed.len());
        if skipped > 0 {
            self.warn(format!(
                "{} unreadable guest workspace(s) will stay in guest storage",
                skipped
            ));
        }
        if local.is_empty() {
            log::info!("No guest workspaces to migrate, running a full sync");
            return self.full_sync(scope).await;
        }

        let diff = self.gateway.propose_migration(local).await?;
        self.emit(SyncEvent::MigrationPending {
            new: diff.new.iter().map(|d| d.title.clone()).collect(),
            conflicts: diff.conflicts.iter().map(|c| c.title.clone()).collect(),
            server_only: diff.server_only.iter().map(|d| d.title.clone()).collect(),
        });

        let decision = if diff.needs_decision() {
            let question = self.resolver.resolve_migration(&diff);
            match self
                .await_resolution(SyncState::AwaitingMigrationResolution, question)
                .await
            {
                Some(decision) => decision,
                None => return Ok(SyncOutcome::Cancelled),
            }
        } else {
            MigrationDecision::accept_all()
        };

        let final_set = self
            .gateway
            .resolve_migration(resolution_for(diff, &decision))
            .await?;

        let mut fetched = Vec::with_capacity(final_set.len());
        for doc in &final_set {
            fetched.push(self.fetch_checked(&doc.title).await?);
        }

        let mut report = SyncReport::new(SyncKind::Migration);
        report.adopted = fetched.iter().map(|d| d.title.clone()).collect();
        self.store.replace_all(scope, fetched)?;
        // Only what the server has seen leaves guest storage
        for title in &proposed {
            if self.store.remove(&guest, title)? {
                report.guest_removed += 1;
            }
        }
        self.store.set_last_sync_time(scope, Utc::now())?;

        Ok(SyncOutcome::Completed(report))
    }
}

/// Build the server request for a migration decision.
///
/// Guest data travels only for titles the guest side wins.
fn resolution_for(diff: MigrationDiff, decision: &MigrationDecision) -> MigrationResolution {
    let resolve = diff
        .conflicts
        .into_iter()
        .map(|conflict| {
            let use_side = decision.side_for(&conflict.title);
            ResolveEntry {
                data: (use_side == Side::Local).then_some(conflict.local),
                title: conflict.title,
                use_side,
            }
        })
        .collect();
    let new = diff
        .new
        .into_iter()
        .filter(|doc| decision.adopts(&doc.title))
        .collect();
    MigrationResolution { resolve, new }
}
