//! Periodic incremental push.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SyncCoordinator, SyncOutcome};
use crate::fs::FileSystem;
use crate::gateway::RemoteGateway;

/// Shortest interval the timer accepts.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Background task that pushes local changes on a fixed interval.
///
/// Ticks are skipped while nobody is signed in; a tick that lands on a
/// running sync is skipped by the coordinator. Dropping the handle stops
/// the task.
pub struct AutoSync {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl AutoSync {
    /// Start pushing every `interval` on the current tokio runtime.
    pub fn spawn<FS, G>(coordinator: Arc<SyncCoordinator<FS, G>>, interval: Duration) -> Self
    where
        FS: FileSystem + 'static,
        G: RemoteGateway + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if coordinator.current_user().is_none() {
                    continue;
                }
                match coordinator.sync_local_changes().await {
                    Ok(SyncOutcome::Completed(report)) => {
                        log::debug!("Auto-sync pushed {} workspace(s)", report.pushed.len())
                    }
                    Ok(_) => log::debug!("Auto-sync tick skipped"),
                    Err(e) => log::warn!("Auto-sync failed: {}", e),
                }
            }
        });
        log::info!("Auto-sync every {:?}", interval);
        Self { handle, interval }
    }

    /// Interval between pushes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
