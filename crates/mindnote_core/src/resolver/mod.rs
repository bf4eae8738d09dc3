//! Conflict detection and resolution types.
//!
//! When a full sync finds a top-level workspace whose local and remote
//! versions differ, or a guest→user migration needs a decision, the
//! coordinator suspends and asks a [`ConflictResolver`]. Any client can
//! answer: an interactive prompt, a GUI fed through [`ChannelResolver`], or
//! an automated [`PolicyResolver`].

mod channel;

pub use channel::{ChannelResolver, PendingResolution};

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::gateway::{BoxFuture, MigrationDiff, Side};

/// A top-level workspace whose local and remote versions disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConflict {
    /// Title of the conflicting workspace
    pub title: String,
    /// Version held locally
    pub local_version: String,
    /// Version held remotely
    pub remote_version: String,
}

/// Every conflict found by one full sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDiff {
    /// Conflicts in remote listing order
    pub conflicts: Vec<VersionConflict>,
}

impl ConflictDiff {
    /// Titles of all conflicts.
    pub fn titles(&self) -> Vec<String> {
        self.conflicts.iter().map(|c| c.title.clone()).collect()
    }

    /// Whether there is nothing to resolve.
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// How to resolve a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Keep the local version, overwrite remote
    #[default]
    KeepLocal,

    /// Keep the remote version, overwrite local
    KeepRemote,
}

impl FromStr for ConflictResolution {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "keep_local" | "keep-local" => Ok(ConflictResolution::KeepLocal),
            "remote" | "server" | "keep_remote" | "keep-remote" => {
                Ok(ConflictResolution::KeepRemote)
            }
            _ => Err(()),
        }
    }
}

impl ConflictResolution {
    /// Check if this resolution keeps the local version
    pub fn keeps_local(&self) -> bool {
        matches!(self, ConflictResolution::KeepLocal)
    }

    /// Check if this resolution keeps the remote version
    pub fn keeps_remote(&self) -> bool {
        matches!(self, ConflictResolution::KeepRemote)
    }

    /// Equivalent migration side.
    pub fn side(&self) -> Side {
        match self {
            ConflictResolution::KeepLocal => Side::Local,
            ConflictResolution::KeepRemote => Side::Server,
        }
    }
}

/// Answer to a [`ConflictDiff`]. Titles without a choice keep the local version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDecision {
    /// Choice per title
    pub choices: IndexMap<String, ConflictResolution>,
}

impl ConflictDecision {
    /// Apply the same choice to every conflict in `diff`.
    pub fn all(diff: &ConflictDiff, resolution: ConflictResolution) -> Self {
        Self {
            choices: diff
                .conflicts
                .iter()
                .map(|c| (c.title.clone(), resolution))
                .collect(),
        }
    }

    /// Add a choice (builder pattern).
    pub fn with_choice(mut self, title: impl Into<String>, resolution: ConflictResolution) -> Self {
        self.choices.insert(title.into(), resolution);
        self
    }

    /// Choice for `title`, defaulting to keep-local.
    pub fn choice_for(&self, title: &str) -> ConflictResolution {
        self.choices.get(title).copied().unwrap_or_default()
    }
}

/// Answer to a [`MigrationDiff`].
///
/// Conflicts without a choice keep the guest copy; new workspaces without a
/// choice are adopted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDecision {
    /// Winning side per conflicting title
    pub resolve: IndexMap<String, Side>,
    /// Whether to adopt each new guest workspace
    pub adopt_new: IndexMap<String, bool>,
}

impl MigrationDecision {
    /// Keep the guest copy of every conflict and adopt every new workspace.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Set the winning side for a conflict (builder pattern).
    pub fn with_side(mut self, title: impl Into<String>, side: Side) -> Self {
        self.resolve.insert(title.into(), side);
        self
    }

    /// Choose whether to adopt a new workspace (builder pattern).
    pub fn with_new(mut self, title: impl Into<String>, adopt: bool) -> Self {
        self.adopt_new.insert(title.into(), adopt);
        self
    }

    /// Winning side for `title`.
    pub fn side_for(&self, title: &str) -> Side {
        self.resolve.get(title).copied().unwrap_or_default()
    }

    /// Whether the new workspace `title` is adopted.
    pub fn adopts(&self, title: &str) -> bool {
        self.adopt_new.get(title).copied().unwrap_or(true)
    }
}

/// Decides conflicts on behalf of the user.
///
/// Each call is a suspension point: the sync coordinator awaits the answer
/// before writing anything. Returning `None` cancels the sync.
pub trait ConflictResolver: Send + Sync {
    /// Decide version conflicts found by a full sync
    fn resolve_conflicts<'a>(
        &'a self,
        diff: &'a ConflictDiff,
    ) -> BoxFuture<'a, Option<ConflictDecision>>;

    /// Decide the outcome of a guest→user migration
    fn resolve_migration<'a>(
        &'a self,
        diff: &'a MigrationDiff,
    ) -> BoxFuture<'a, Option<MigrationDecision>>;
}

/// Resolves every conflict the same way without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyResolver {
    preference: ConflictResolution,
}

impl PolicyResolver {
    /// Always pick `preference`; migrations adopt every new workspace.
    pub fn new(preference: ConflictResolution) -> Self {
        Self { preference }
    }

    /// Configured preference.
    pub fn preference(&self) -> ConflictResolution {
        self.preference
    }
}

impl ConflictResolver for PolicyResolver {
    fn resolve_conflicts<'a>(
        &'a self,
        diff: &'a ConflictDiff,
    ) -> BoxFuture<'a, Option<ConflictDecision>> {
        let decision = ConflictDecision::all(diff, self.preference);
        Box::pin(async move { Some(decision) })
    }

    fn resolve_migration<'a>(
        &'a self,
        diff: &'a MigrationDiff,
    ) -> BoxFuture<'a, Option<MigrationDecision>> {
        let side = self.preference.side();
        let decision = diff
            .conflicts
            .iter()
            .fold(MigrationDecision::accept_all(), |d, c| {
                d.with_side(c.title.clone(), side)
            });
        Box::pin(async move { Some(decision) })
    }
}
