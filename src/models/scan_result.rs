use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::entry::Entry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// One entry per immediate child of `scan_path`, in directory-listing order
    /// until sorted.
    pub entries: Vec<Entry>,
    pub total_size: u64,
    pub total_files: usize,
    pub total_dirs: usize,
    pub scan_duration: Duration,
    pub issues: Vec<ScanIssue>,
    pub scan_path: PathBuf,
}

/// A subtree that could not be read. It contributed nothing to its entry's size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: ScanIssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanIssueKind {
    PermissionDenied,
    NotFound,
    SymlinkCycle,
    IoError,
}

impl ScanIssue {
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanIssueKind::PermissionDenied,
            std::io::ErrorKind::NotFound => ScanIssueKind::NotFound,
            _ => ScanIssueKind::IoError,
        };
        Self {
            path,
            kind,
            message: err.to_string(),
        }
    }
}
