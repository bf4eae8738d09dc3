//! Resolver answered from outside the sync task.
//!
//! A UI (or any other client) watches for a [`PendingResolution`], shows it to
//! the user, and calls one of the `answer_*` methods or [`ChannelResolver::cancel`].
//! The sync coordinator stays suspended until then.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{Notify, oneshot};

use super::{ConflictDecision, ConflictDiff, ConflictResolver, MigrationDecision};
use crate::gateway::{BoxFuture, MigrationDiff};

/// A question waiting for an answer.
#[derive(Debug, Clone)]
pub enum PendingResolution {
    /// Version conflicts from a full sync
    Conflicts(ConflictDiff),
    /// A guest→user migration diff
    Migration(MigrationDiff),
}

enum Reply {
    Conflicts(oneshot::Sender<Option<ConflictDecision>>),
    Migration(oneshot::Sender<Option<MigrationDecision>>),
}

/// A [`ConflictResolver`] whose answers come from another task or thread.
#[derive(Default)]
pub struct ChannelResolver {
    slot: Mutex<Option<(PendingResolution, Reply)>>,
    posted: Notify,
}

impl ChannelResolver {
    /// Create a resolver with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// The question currently waiting, if any.
    pub fn pending(&self) -> Option<PendingResolution> {
        self.lock().as_ref().map(|(pending, _)| pending.clone())
    }

    /// Wait until a question is posted.
    pub async fn wait_pending(&self) -> PendingResolution {
        loop {
            let posted = self.posted.notified();
            if let Some(pending) = self.pending() {
                return pending;
            }
            posted.await;
        }
    }

    /// Answer pending conflicts. Returns false if no conflict question was waiting.
    pub fn answer_conflicts(&self, decision: ConflictDecision) -> bool {
        let mut slot = self.lock();
        match slot.take() {
            Some((_, Reply::Conflicts(tx))) => tx.send(Some(decision)).is_ok(),
            other => {
                *slot = other;
                false
            }
        }
    }

    /// Answer a pending migration. Returns false if no migration question was waiting.
    pub fn answer_migration(&self, decision: MigrationDecision) -> bool {
        let mut slot = self.lock();
        match slot.take() {
            Some((_, Reply::Migration(tx))) => tx.send(Some(decision)).is_ok(),
            other => {
                *slot = other;
                false
            }
        }
    }

    /// Decline whatever is pending, cancelling the sync that asked.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some((_, Reply::Conflicts(tx))) => tx.send(None).is_ok(),
            Some((_, Reply::Migration(tx))) => tx.send(None).is_ok(),
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(PendingResolution, Reply)>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn post(&self, pending: PendingResolution, reply: Reply) -> Posted<'_> {
        *self.lock() = Some((pending, reply));
        self.posted.notify_waiters();
        Posted(self)
    }
}

/// Clears the slot if the asking future goes away before an answer arrives.
struct Posted<'a>(&'a ChannelResolver);

impl Drop for Posted<'_> {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

impl ConflictResolver for ChannelResolver {
    fn resolve_conflicts<'a>(
        &'a self,
        diff: &'a ConflictDiff,
    ) -> BoxFuture<'a, Option<ConflictDecision>> {
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();
            let _posted = self.post(PendingResolution::Conflicts(diff.clone()), Reply::Conflicts(tx));
            // A dropped sender counts as a cancellation
            rx.await.ok().flatten()
        })
    }

    fn resolve_migration<'a>(
        &'a self,
        diff: &'a MigrationDiff,
    ) -> BoxFuture<'a, Option<MigrationDecision>> {
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();
            let _posted = self.post(PendingResolution::Migration(diff.clone()), Reply::Migration(tx));
            rx.await.ok().flatten()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ConflictResolution, VersionConflict};
    use std::future::Future;
    use std::sync::Arc;

    fn diff() -> ConflictDiff {
        ConflictDiff {
            conflicts: vec![VersionConflict {
                title: "Notes".into(),
                local_version: "v1".into(),
                remote_version: "v2".into(),
            }],
        }
    }

    #[tokio::test]
    async fn test_answer_reaches_waiting_resolver() {
        let resolver = Arc::new(ChannelResolver::new());
        let asking = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                let diff = diff();
                resolver.resolve_conflicts(&diff).await
            })
        };

        let pending = resolver.wait_pending().await;
        assert!(matches!(pending, PendingResolution::Conflicts(ref d) if d.titles() == vec!["Notes"]));

        // A migration answer does not fit a conflict question
        assert!(!resolver.answer_migration(MigrationDecision::accept_all()));
        assert!(resolver.answer_conflicts(
            ConflictDecision::default().with_choice("Notes", ConflictResolution::KeepRemote)
        ));

        let decision = asking.await.unwrap().unwrap();
        assert_eq!(decision.choice_for("Notes"), ConflictResolution::KeepRemote);
        assert!(resolver.pending().is_none());
    }

    #[tokio::test]
    async fn test_cancel_yields_none() {
        let resolver = Arc::new(ChannelResolver::new());
        let asking = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                let diff = MigrationDiff::default();
                resolver.resolve_migration(&diff).await
            })
        };

        resolver.wait_pending().await;
        assert!(resolver.cancel());
        assert!(asking.await.unwrap().is_none());
        assert!(!resolver.cancel());
    }

    #[test]
    fn test_dropped_question_clears_slot() {
        let resolver = ChannelResolver::new();
        let diff = diff();
        {
            let mut fut = resolver.resolve_conflicts(&diff);
            // Poll once so the question is posted, then drop the future
            let waker = std::task::Waker::noop();
            let mut cx = std::task::Context::from_waker(waker);
            assert!(fut.as_mut().poll(&mut cx).is_pending());
            assert!(resolver.pending().is_some());
        }
        assert!(resolver.pending().is_none());
    }
}
