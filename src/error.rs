use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure kinds of a single tool or local operation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("ambiguous edit: snippet matches {occurrences} locations in {}", path.display())]
    AmbiguousEdit { path: PathBuf, occurrences: usize },

    #[error("original snippet not found in {}", .0.display())]
    SnippetNotFound(PathBuf),

    #[error("content is {size} bytes, exceeding the {limit} byte limit")]
    SizeLimitExceeded { size: usize, limit: usize },

    #[error("home directory references are not allowed: {0}")]
    HomeDirectoryReference(String),

    #[error("malformed arguments: {0}")]
    MalformedArguments(String),

    #[error("git executable not found; git features are disabled for this session")]
    GitUnavailable,

    #[error("git {command} failed: {details}")]
    GitOperationFailed { command: String, details: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    /// Classify an I/O failure against the path it happened on.
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => ToolError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ToolError::PermissionDenied(path.to_path_buf()),
            _ => ToolError::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    pub fn is_git_unavailable(&self) -> bool {
        matches!(self, ToolError::GitUnavailable)
    }
}

/// Why a streamed tool call was dropped before dispatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyIssue {
    #[error("tool call has no id")]
    MissingId,

    #[error("tool call has no function name")]
    MissingName,

    #[error("arguments for '{name}' are malformed: {reason}")]
    MalformedArguments { name: String, reason: String },
}

/// Raised by the Context Store when an append would break tool-call causality.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("a tool result cannot be the first conversation entry")]
    ToolResultFirst,

    #[error("tool result '{0}' does not answer any call of the latest assistant tool request")]
    OrphanToolResult(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("turn interrupted by user")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_by_kind() {
        let path = Path::new("missing.txt");
        let not_found = ToolError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(not_found, ToolError::NotFound(_)));

        let denied = ToolError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, ToolError::PermissionDenied(_)));

        let other = ToolError::from_io(path, io::Error::from(io::ErrorKind::InvalidData));
        assert!(other.to_string().contains("missing.txt"));
    }
}
