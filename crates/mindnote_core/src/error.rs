use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for mindnote operations
#[derive(Debug, Error)]
pub enum MindNoteError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Configuration not initialized. Run 'mindnote init' first.")]
    ConfigNotInitialized,

    // Session errors
    #[error("Not signed in. Run 'mindnote login <user>' first.")]
    NotAuthenticated,

    // Store errors
    #[error("No workspace named '{title}' in {scope} storage")]
    NotFound { scope: String, title: String },

    // Tree errors
    #[error("Node {0} does not exist in this workspace tree")]
    NodeNotFound(usize),

    #[error("A subspace named '{title}' already exists under '{parent}'")]
    DuplicateTitle { parent: String, title: String },

    #[error("'{title}' would nest deeper than {max} levels")]
    TooDeep { title: String, max: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // Codec errors
    #[error("Malformed workspace document: {0}")]
    Serialization(String),

    // Sync errors
    #[error("Remote gateway error: {0}")]
    Gateway(String),

    #[error("Version conflict on {}", titles.join(", "))]
    VersionConflict { titles: Vec<String> },
}

/// Result type alias for mindnote operations
pub type Result<T> = std::result::Result<T, MindNoteError>;

/// A serializable representation of MindNoteError for IPC
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&MindNoteError> for SerializableError {
    fn from(err: &MindNoteError) -> Self {
        let kind = match err {
            MindNoteError::Io(_) => "Io",
            MindNoteError::FileRead { .. } => "FileRead",
            MindNoteError::FileWrite { .. } => "FileWrite",
            MindNoteError::Json(_) => "Json",
            MindNoteError::ConfigParse(_) => "ConfigParse",
            MindNoteError::ConfigSerialize(_) => "ConfigSerialize",
            MindNoteError::NoConfigDir => "NoConfigDir",
            MindNoteError::ConfigNotInitialized => "ConfigNotInitialized",
            MindNoteError::NotAuthenticated => "NotAuthenticated",
            MindNoteError::NotFound { .. } => "NotFound",
            MindNoteError::NodeNotFound(_) => "NodeNotFound",
            MindNoteError::DuplicateTitle { .. } => "DuplicateTitle",
            MindNoteError::TooDeep { .. } => "TooDeep",
            MindNoteError::InvalidOperation(_) => "InvalidOperation",
            MindNoteError::Serialization(_) => "Serialization",
            MindNoteError::Gateway(_) => "Gateway",
            MindNoteError::VersionConflict { .. } => "VersionConflict",
        }
        .to_string();

        let path = match err {
            MindNoteError::FileRead { path, .. } => Some(path.clone()),
            MindNoteError::FileWrite { path, .. } => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl From<MindNoteError> for SerializableError {
    fn from(err: MindNoteError) -> Self {
        SerializableError::from(&err)
    }
}

impl MindNoteError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    /// Wrap a transport failure message as a gateway error.
    pub fn gateway(message: impl Into<String>) -> Self {
        MindNoteError::Gateway(message.into())
    }

    /// Whether this error came from the remote side (the attempt may be retried).
    pub fn is_gateway(&self) -> bool {
        matches!(self, MindNoteError::Gateway(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializable_error_kind_and_path() {
        let err = MindNoteError::FileRead {
            path: PathBuf::from("guest/Ideas.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let ser = err.to_serializable();
        assert_eq!(ser.kind, "FileRead");
        assert_eq!(ser.path, Some(PathBuf::from("guest/Ideas.json")));
        assert!(ser.message.contains("guest/Ideas.json"));
    }

    #[test]
    fn test_version_conflict_message_lists_titles() {
        let err = MindNoteError::VersionConflict {
            titles: vec!["Notes".to_string(), "Ideas".to_string()],
        };
        assert_eq!(err.to_string(), "Version conflict on Notes, Ideas");
        assert_eq!(err.to_serializable().kind, "VersionConflict");
    }

    #[test]
    fn test_gateway_helper() {
        let err = MindNoteError::gateway("connection refused");
        assert!(err.is_gateway());
        assert!(!MindNoteError::NotAuthenticated.is_gateway());
    }
}
