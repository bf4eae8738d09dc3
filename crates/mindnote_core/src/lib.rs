#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Workspace JSON codec
pub mod codec;

/// Configuration options
pub mod config;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// Remote gateway interface and the directory-backed remote
pub mod gateway;

/// Conflict resolution (decisions, policy and channel resolvers)
pub mod resolver;

/// Local store partitioned by guest and user scope
pub mod store;

/// Sync coordinator, events and auto-sync
pub mod sync;

/// Workspace trees (nodes, items and structural edits)
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_utils;
