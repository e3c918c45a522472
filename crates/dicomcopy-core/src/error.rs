//! Error and warning types for configuration and tree walking.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pattern string failed to compile.
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value is missing or out of range.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create an invalid pattern error from any displayable cause.
    pub fn invalid_pattern(pattern: &str, cause: impl std::fmt::Display) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            message: cause.to_string(),
        }
    }

    /// Create a generic invalid configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Errors that stop a run before the walk starts.
///
/// Once the walk is underway every failure is downgraded to a
/// [`WalkWarning`] and the run carries on.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source root is not a directory.
    #[error("Source root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Source and target trees overlap.
    #[error("Source and target overlap: {source_root} <-> {target_root}")]
    Overlap {
        source_root: PathBuf,
        target_root: PathBuf,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WalkError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of walk warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory could not be listed or its iteration failed.
    ReadError,
    /// A candidate file could not be parsed or lacks the field.
    MetadataError,
    /// Copying a directory or file to the target failed.
    CopyFailed,
    /// An entry could not be inspected during the walk.
    VisitFailed,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadError => write!(f, "read error"),
            Self::MetadataError => write!(f, "metadata error"),
            Self::CopyFailed => write!(f, "copy failed"),
            Self::VisitFailed => write!(f, "visit failed"),
        }
    }
}

/// Non-fatal problem encountered during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl WalkWarning {
    /// Create a new walk warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("Read error: {error}"), WarningKind::ReadError)
    }

    /// Create a metadata warning.
    pub fn metadata(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::new(path, error.to_string(), WarningKind::MetadataError)
    }

    /// Create a copy failure warning naming both ends of the copy.
    pub fn copy_failed(
        source: impl Into<PathBuf>,
        target: &std::path::Path,
        error: &std::io::Error,
    ) -> Self {
        Self::new(
            source,
            format!("Unable to copy to {}: {error}", target.display()),
            WarningKind::CopyFailed,
        )
    }

    /// Create a visit failure warning.
    pub fn visit_failed(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("Unable to visit: {error}"), WarningKind::VisitFailed)
    }
}

impl std::fmt::Display for WalkWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_error_io() {
        let err = WalkError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, WalkError::PermissionDenied { .. }));

        let err = WalkError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_copy_failed_warning_names_target() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let warning =
            WalkWarning::copy_failed("/src/study", std::path::Path::new("/dst/study"), &err);
        assert_eq!(warning.kind, WarningKind::CopyFailed);
        assert!(warning.message.contains("/dst/study"));
        assert!(warning.message.contains("disk full"));
        assert_eq!(warning.to_string(), format!("/src/study: {}", warning.message));
    }

    #[test]
    fn test_config_error_converts() {
        let err: WalkError = ConfigError::invalid("leaf pattern is required").into();
        assert!(err.to_string().contains("leaf pattern is required"));
    }
}
