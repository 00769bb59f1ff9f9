//! Error types for kleanup runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a kleanup run.
///
/// Per-file access failures are not represented here: the walks absorb them
/// and, when asked, record a [`SkippedEntry`] instead.
#[derive(Debug, Error)]
pub enum KleanupError {
    /// The start date did not match `mm/dd/yy`.
    #[error("Invalid date format: {input:?} (expected mm/dd/yy)")]
    InvalidDateFormat { input: String },

    /// The operator answered neither select nor ignore.
    #[error("Invalid selection mode: {input:?} (expected S to select or I to ignore)")]
    InvalidSelectionMode { input: String },

    /// Not enough free space to hold the archive.
    #[error("Not enough disk space: required {required} bytes, available {available} bytes")]
    InsufficientSpace { required: u64, available: u64 },

    /// The archiver exited unsuccessfully.
    #[error("Archiver failed ({}): {output}", describe_status(.status))]
    ArchiverFailure { status: Option<i32>, output: String },

    /// I/O failure outside of the tree walks.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was interrupted by the operator.
    #[error("Operation interrupted")]
    Interrupted,
}

impl KleanupError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::Interrupted {
            return Self::Interrupted;
        }
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from operator input rather than the system.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateFormat { .. } | Self::InvalidSelectionMode { .. }
        )
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Why an entry was left out of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipKind {
    /// Permission was denied.
    PermissionDenied,
    /// The entry disappeared while the walk was running.
    Vanished,
    /// Error reading a directory listing.
    ReadError,
    /// Error reading metadata or the selected timestamp.
    MetadataError,
}

impl SkipKind {
    /// Classify an I/O error.
    pub fn from_io(error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::NotFound => Self::Vanished,
            _ => Self::MetadataError,
        }
    }
}

/// A file or directory that a walk could not account for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Path of the entry, empty when the walker could not report one.
    pub path: PathBuf,
    /// Why it was skipped.
    pub kind: SkipKind,
}

impl SkippedEntry {
    /// Create a new skipped entry.
    pub fn new(path: impl Into<PathBuf>, kind: SkipKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_path() {
        let err = KleanupError::io(
            "/tmp/manifest",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, KleanupError::Io { ref path, .. } if path == &PathBuf::from("/tmp/manifest")));
    }

    #[test]
    fn test_interrupted_io_maps_to_interrupted() {
        let err = KleanupError::io(
            "/tmp",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "ctrl-c"),
        );
        assert!(matches!(err, KleanupError::Interrupted));
    }

    #[test]
    fn test_user_input_classification() {
        assert!(KleanupError::InvalidDateFormat { input: "x".into() }.is_user_input());
        assert!(!KleanupError::InsufficientSpace { required: 2, available: 1 }.is_user_input());
    }

    #[test]
    fn test_archiver_failure_message() {
        let err = KleanupError::ArchiverFailure {
            status: Some(2),
            output: "bad password".into(),
        };
        assert_eq!(err.to_string(), "Archiver failed (exit code 2): bad password");
    }

    #[test]
    fn test_skip_kind_from_io() {
        let gone = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(SkipKind::from_io(&gone), SkipKind::Vanished);
    }
}
