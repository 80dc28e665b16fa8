//! Listing and generation error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// How a failure should be reported to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself was bad (sandbox violation, unusable path).
    BadRequest,
    /// The requested directory does not exist.
    NotFound,
    /// The deployment is broken (missing/stale metadata, I/O failure).
    ServerError,
}

impl ErrorClass {
    /// HTTP-style status code for this class.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::ServerError => 500,
        }
    }
}

/// Sitetree error type.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Resolved path is not under the root.
    #[error("path escapes root: {0}")]
    PathEscape(String),

    /// Path cannot be used at all (e.g. embedded NUL).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Requested directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Requested path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Metadata table is missing or unparsable.
    #[error("metadata unavailable at {}: {reason}", path.display())]
    MetadataUnavailable {
        /// Location of the metadata file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Table loaded but has no usable record for a live child.
    #[error("no metadata entry for {0} (table is stale, regenerate it)")]
    MissingMetadataEntry(String),

    /// An entry could not be read during generation.
    #[error("cannot stat {}: {source}", path.display())]
    StatFailure {
        /// Entry that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The generated table could not be written.
    #[error("cannot write metadata to {}: {source}", path.display())]
    Persist {
        /// Target metadata file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Configuration is unusable.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TreeError {
    /// Create a PathEscape error.
    pub fn path_escape(path: impl Into<String>) -> Self {
        Self::PathEscape(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create a MetadataUnavailable error.
    pub fn metadata_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MetadataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingMetadataEntry error.
    pub fn missing_entry(path: impl Into<String>) -> Self {
        Self::MissingMetadataEntry(path.into())
    }

    /// Create a StatFailure error.
    pub fn stat_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StatFailure {
            path: path.into(),
            source,
        }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Client-facing classification.
    pub fn class(&self) -> ErrorClass {
        match self {
            TreeError::PathEscape(_) | TreeError::InvalidPath(_) | TreeError::NotADirectory(_) => {
                ErrorClass::BadRequest
            }
            TreeError::NotFound(_) => ErrorClass::NotFound,
            TreeError::MetadataUnavailable { .. }
            | TreeError::MissingMetadataEntry(_)
            | TreeError::StatFailure { .. }
            | TreeError::Persist { .. }
            | TreeError::Config(_)
            | TreeError::Io(_) => ErrorClass::ServerError,
        }
    }

    /// Short machine-readable tag for error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            TreeError::PathEscape(_) => "path_escape",
            TreeError::InvalidPath(_) => "invalid_path",
            TreeError::NotFound(_) => "not_found",
            TreeError::NotADirectory(_) => "not_a_directory",
            TreeError::MetadataUnavailable { .. } => "metadata_unavailable",
            TreeError::MissingMetadataEntry(_) => "missing_metadata_entry",
            TreeError::StatFailure { .. } => "stat_failure",
            TreeError::Persist { .. } => "persist",
            TreeError::Config(_) => "config",
            TreeError::Io(_) => "io",
        }
    }

    /// Map a failed stat/readdir of a requested directory.
    pub(crate) fn from_lookup(rel: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(rel),
            io::ErrorKind::NotADirectory => Self::not_a_directory(rel),
            _ => Self::Io(err),
        }
    }
}

/// Sitetree result type.
pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(TreeError::path_escape("..").class(), ErrorClass::BadRequest);
        assert_eq!(TreeError::invalid_path("a\0b").class(), ErrorClass::BadRequest);
        assert_eq!(TreeError::not_a_directory("a.txt").class(), ErrorClass::BadRequest);
        assert_eq!(TreeError::not_found("nope").class(), ErrorClass::NotFound);
        assert_eq!(
            TreeError::metadata_unavailable("/srv/_meta.json", "missing").class(),
            ErrorClass::ServerError
        );
        assert_eq!(TreeError::missing_entry("c.txt").class(), ErrorClass::ServerError);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorClass::BadRequest.status_code(), 400);
        assert_eq!(ErrorClass::NotFound.status_code(), 404);
        assert_eq!(ErrorClass::ServerError.status_code(), 500);
    }

    #[test]
    fn test_from_lookup() {
        let err = TreeError::from_lookup("docs", io::Error::new(io::ErrorKind::NotFound, "x"));
        assert!(matches!(err, TreeError::NotFound(ref p) if p == "docs"));

        let err = TreeError::from_lookup("docs", io::Error::other("boom"));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_display() {
        let err = TreeError::missing_entry("c.txt");
        assert!(err.to_string().contains("c.txt"));
        assert_eq!(err.kind(), "missing_metadata_entry");
    }
}
