//! Sync coordination between the local store and the remote gateway.
//!
//! # Architecture
//!
//! ```text
//!   Remote Gateway (network truth)
//!         ↑↓
//!   SyncCoordinator ──→ ConflictResolver (only on disagreement)
//!         ↑↓
//!   LocalStore (offline truth)
//! ```
//!
//! # Key Components
//!
//! - [`SyncCoordinator`] - Full sync, incremental push and guest→user migration
//! - [`SyncState`] - Where the coordinator is in its state machine
//! - [`SyncEvent`] / [`CallbackRegistry`] - Status channel for UI collaborators
//! - [`AutoSync`] - Periodic incremental push

/// Periodic push task
pub mod auto;
/// Coordinator state machine
pub mod coordinator;
/// Status events and subscriptions
pub mod events;

pub use auto::AutoSync;
pub use coordinator::SyncCoordinator;
pub use events::{CallbackRegistry, EventCallback, SubscriptionId, SyncEvent};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No sync in flight
    #[default]
    Idle,
    /// Talking to the remote
    Syncing,
    /// Waiting for the resolver to decide version conflicts
    AwaitingConflictResolution,
    /// Waiting for the resolver to decide a migration
    AwaitingMigrationResolution,
}

impl SyncState {
    /// Whether the coordinator is parked on a resolver.
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            SyncState::AwaitingConflictResolution | SyncState::AwaitingMigrationResolution
        )
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            SyncState::Idle => "Idle",
            SyncState::Syncing => "Syncing...",
            SyncState::AwaitingConflictResolution => "Waiting for conflict resolution",
            SyncState::AwaitingMigrationResolution => "Waiting for migration decision",
        }
    }
}

/// The three sync flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Pull remote roots, resolving conflicts
    Full,
    /// Push every local root
    Push,
    /// Guest→user migration
    Migration,
}

/// What a completed sync did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Which flow ran
    pub kind: SyncKind,
    /// Titles written to the store from the remote
    pub adopted: Vec<String>,
    /// Titles already identical on both sides
    pub up_to_date: Vec<String>,
    /// Conflicting titles kept as they are locally
    pub kept_local: Vec<String>,
    /// Titles sent to the remote
    pub pushed: Vec<String>,
    /// Guest records deleted by a migration
    pub guest_removed: usize,
}

impl SyncReport {
    /// Empty report for `kind`.
    pub fn new(kind: SyncKind) -> Self {
        Self {
            kind,
            adopted: Vec::new(),
            up_to_date: Vec::new(),
            kept_local: Vec::new(),
            pushed: Vec::new(),
            guest_removed: 0,
        }
    }
}

/// Result of a sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The flow ran to completion
    Completed(SyncReport),
    /// Another sync was in flight; nothing was done
    Skipped,
    /// The resolution was cancelled; nothing was committed
    Cancelled,
}

impl SyncOutcome {
    /// Report of a completed sync.
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// Whether the flow ran to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awaiting_states() {
        assert!(SyncState::AwaitingConflictResolution.is_awaiting());
        assert!(SyncState::AwaitingMigrationResolution.is_awaiting());
        assert!(!SyncState::Syncing.is_awaiting());
        assert!(!SyncState::default().is_awaiting());
    }

    #[test]
    fn test_outcome_report() {
        let outcome = SyncOutcome::Completed(SyncReport::new(SyncKind::Push));
        assert!(outcome.is_completed());
        assert_eq!(outcome.report().unwrap().kind, SyncKind::Push);
        assert!(SyncOutcome::Skipped.report().is_none());
    }
}
