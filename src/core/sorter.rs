use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SortError;
use crate::models::entry::Entry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" => Ok(SortDirection::Ascending),
            "DESC" | "DESCENDING" => Ok(SortDirection::Descending),
            _ => Err(SortError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("ASC"),
            SortDirection::Descending => f.write_str("DESC"),
        }
    }
}

/// Order entries by size. Equal sizes keep their incoming order in both
/// directions.
pub fn sort_entries(entries: &mut [Entry], direction: SortDirection) {
    match direction {
        SortDirection::Ascending => entries.sort_by(|a, b| a.size.cmp(&b.size)),
        SortDirection::Descending => entries.sort_by(|a, b| b.size.cmp(&a.size)),
    }
}

/// Parse `direction` and sort. Entries are left untouched on a bad direction.
pub fn sort_entries_by(entries: &mut [Entry], direction: &str) -> Result<(), SortError> {
    let direction = direction.parse()?;
    sort_entries(entries, direction);
    Ok(())
}
