use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One immediate child of a scanned root, with everything beneath it folded
/// into `size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "IsDir")]
    pub is_dir: bool,
    #[serde(skip)]
    pub path: PathBuf,
}

impl Entry {
    pub fn file(path: PathBuf, name: String, size: u64) -> Self {
        Self {
            name,
            size,
            is_dir: false,
            path,
        }
    }

    pub fn directory(path: PathBuf, name: String, size: u64) -> Self {
        Self {
            name,
            size,
            is_dir: true,
            path,
        }
    }

    pub fn human_readable_size(&self) -> String {
        human_readable_size(self.size)
    }
}

pub fn human_readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
