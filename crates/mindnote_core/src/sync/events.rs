//! Sync status events and the registry that delivers them.
//!
//! UI collaborators subscribe to [`SyncEvent`]s to show progress, surface
//! conflicts and report failures. Emission never blocks on a subscriber
//! and a panicking subscriber does not affect the others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{SyncKind, SyncState};
use crate::error::MindNoteError;

/// Events emitted by the sync coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// The coordinator moved to a new state.
    StateChanged {
        /// The new state
        state: SyncState,
    },

    /// A sync flow began.
    SyncStarted {
        /// Which flow
        kind: SyncKind,
    },

    /// A sync request found another one in flight.
    SyncSkipped {
        /// Which flow was requested
        kind: SyncKind,
    },

    /// Version conflicts were found and handed to the resolver.
    ConflictDetected {
        /// Titles of the conflicting workspaces
        titles: Vec<String>,
        /// Human-readable summary
        message: String,
    },

    /// The server classified a guest→user migration.
    MigrationPending {
        /// Guest-only titles
        new: Vec<String>,
        /// Titles present on both sides with different content
        conflicts: Vec<String>,
        /// Account-only titles
        server_only: Vec<String>,
    },

    /// A remote tree was written to local storage.
    WorkspaceAdopted {
        /// Workspace title
        title: String,
        /// Version now stored locally
        version: String,
    },

    /// A sync flow finished.
    SyncCompleted {
        /// Which flow
        kind: SyncKind,
        /// Number of workspaces taken from the remote
        adopted: usize,
        /// Number of workspaces sent to the remote
        pushed: usize,
    },

    /// A pending resolution was cancelled; nothing was committed.
    SyncCancelled {
        /// Which flow
        kind: SyncKind,
    },

    /// A sync flow failed.
    SyncFailed {
        /// Which flow
        kind: SyncKind,
        /// Error message
        error: String,
        /// Error variant name, for branching without parsing the message
        error_kind: String,
    },

    /// Something was skipped or repaired without failing the sync.
    Warning {
        /// What happened
        message: String,
    },
}

impl SyncEvent {
    /// Failure event for `kind`, carrying the error's serializable form.
    pub fn failed(kind: SyncKind, error: &MindNoteError) -> Self {
        let error = error.to_serializable();
        SyncEvent::SyncFailed {
            kind,
            error: error.message,
            error_kind: error.kind,
        }
    }

    /// Short name of the event, matching its `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::StateChanged { .. } => "StateChanged",
            SyncEvent::SyncStarted { .. } => "SyncStarted",
            SyncEvent::SyncSkipped { .. } => "SyncSkipped",
            SyncEvent::ConflictDetected { .. } => "ConflictDetected",
            SyncEvent::MigrationPending { .. } => "MigrationPending",
            SyncEvent::WorkspaceAdopted { .. } => "WorkspaceAdopted",
            SyncEvent::SyncCompleted { .. } => "SyncCompleted",
            SyncEvent::SyncCancelled { .. } => "SyncCancelled",
            SyncEvent::SyncFailed { .. } => "SyncFailed",
            SyncEvent::Warning { .. } => "Warning",
        }
    }
}

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for sync events.
///
/// Callbacks run on the syncing task and should return quickly.
pub type EventCallback = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Thread-safe registry for managing event subscriptions.
///
/// # Example
///
/// ```ignore
/// use mindnote_core::sync::{CallbackRegistry, SyncEvent, SyncKind};
/// use std::sync::Arc;
///
/// let registry = CallbackRegistry::new();
///
/// let id = registry.subscribe(Arc::new(|event| {
///     println!("Event: {:?}", event);
/// }));
///
/// registry.emit(&SyncEvent::SyncStarted { kind: SyncKind::Full });
///
/// registry.unsubscribe(id);
/// ```
pub struct CallbackRegistry {
    callbacks: RwLock<HashMap<SubscriptionId, EventCallback>>,
    next_id: AtomicU64,
}

impl CallbackRegistry {
    /// Create a new empty callback registry.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to sync events.
    ///
    /// Returns a subscription ID that can be used to unsubscribe later.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, callback);
        id
    }

    /// Unsubscribe from sync events.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Emit an event to all registered callbacks.
    ///
    /// Callbacks are invoked synchronously in an undefined order.
    pub fn emit(&self, event: &SyncEvent) {
        // Snapshot so a callback may subscribe or unsubscribe without deadlocking
        let callbacks: Vec<EventCallback> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            }));
        }
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clear all subscriptions.
    pub fn clear(&self) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_emit() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _id = registry.subscribe(Arc::new(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(registry.subscriber_count(), 1);

        registry.emit(&SyncEvent::SyncStarted {
            kind: SyncKind::Full,
        });
        registry.emit(&SyncEvent::StateChanged {
            state: SyncState::Idle,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let id = registry.subscribe(Arc::new(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));

        registry.emit(&SyncEvent::Warning {
            message: "ignored".into(),
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_callback_does_not_affect_others() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(Arc::new(|_event| panic!("subscriber bug")));
        let seen_clone = Arc::clone(&seen);
        registry.subscribe(Arc::new(move |event: &SyncEvent| {
            seen_clone.lock().unwrap().push(event.name());
        }));

        registry.emit(&SyncEvent::SyncSkipped {
            kind: SyncKind::Push,
        });
        assert_eq!(*seen.lock().unwrap(), vec!["SyncSkipped"]);
    }

    #[test]
    fn test_event_serialization() {
        let event = SyncEvent::failed(SyncKind::Migration, &MindNoteError::gateway("offline"));
        assert_eq!(
            event,
            SyncEvent::SyncFailed {
                kind: SyncKind::Migration,
                error: "Remote gateway error: offline".into(),
                error_kind: "Gateway".into(),
            }
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SyncFailed\""));
        assert!(json.contains("\"kind\":\"migration\""));
        assert!(json.contains("\"error_kind\":\"Gateway\""));

        let back: SyncEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
