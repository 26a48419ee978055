//! Error taxonomy for workspace operations.
//!
//! Every expected failure is surfaced as a `WorkspaceError` carrying a short
//! user-facing message; engine operations return these instead of panicking
//! so the presentation layer can display them directly.

/// Failure modes of workspace, persistence and transfer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    /// Bad input: invalid name, missing target folder, unresolved collision.
    Validation(String),
    /// The referenced file or folder no longer exists.
    NotFound(String),
    /// The durable session slot could not be read or written.
    Storage(String),
    /// A remote fetch or directory listing failed or timed out.
    Network(String),
    /// A persisted snapshot was malformed and has been discarded.
    CorruptData(String),
    /// The editor component failed unexpectedly (e.g. during buffer creation).
    Editor(String),
}

impl WorkspaceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WorkspaceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        WorkspaceError::NotFound(msg.into())
    }

    /// The message shown to the user, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            WorkspaceError::Validation(msg)
            | WorkspaceError::NotFound(msg)
            | WorkspaceError::Storage(msg)
            | WorkspaceError::Network(msg)
            | WorkspaceError::CorruptData(msg)
            | WorkspaceError::Editor(msg) => msg,
        }
    }
}

impl std::fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceError::Validation(msg) => write!(f, "Validation error: {msg}"),
            WorkspaceError::NotFound(msg) => write!(f, "Not found: {msg}"),
            WorkspaceError::Storage(msg) => write!(f, "Storage error: {msg}"),
            WorkspaceError::Network(msg) => write!(f, "Network error: {msg}"),
            WorkspaceError::CorruptData(msg) => write!(f, "Corrupt session data: {msg}"),
            WorkspaceError::Editor(msg) => write!(f, "Editor error: {msg}"),
        }
    }
}

impl std::error::Error for WorkspaceError {}
