use thiserror::Error;

/// Errors raised by the working document, the command engine and the editor.
///
/// Every variant is raised before any mutation is applied, so a caller that
/// receives one can rely on the document being unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Unknown id: {0}")]
    UnknownId(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid payload for command {command}: {message}")]
    InvalidPayload { command: String, message: String },
}

impl EditorError {
    pub(crate) fn unknown_id(what: impl std::fmt::Display) -> Self {
        EditorError::UnknownId(what.to_string())
    }

    pub(crate) fn invalid_path(what: impl std::fmt::Display) -> Self {
        EditorError::InvalidPath(what.to_string())
    }

    pub(crate) fn invalid_operation(what: impl Into<String>) -> Self {
        EditorError::InvalidOperation(what.into())
    }

    pub(crate) fn type_mismatch(what: impl Into<String>) -> Self {
        EditorError::TypeMismatch(what.into())
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
