use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a scan. Problems below the root are not reported here;
/// they end up as [`crate::models::scan_result::ScanIssue`] records instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("path not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scan task failed: {0}")]
    Join(String),
}

impl ScanError {
    /// Classify an I/O error raised while touching the scan root itself.
    pub fn from_root_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => ScanError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied { path, source },
            _ => ScanError::Io { path, source },
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("invalid sort direction {0:?}, expected ASC or DESC")]
    InvalidDirection(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read port config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("port config {} is empty, put the listen port on its first line", path.display())]
    EmptyPort { path: PathBuf },
    #[error("invalid port {value:?}")]
    InvalidPort { value: String },
}
