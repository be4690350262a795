use std::path::Path;

use crate::models::entry::Entry;

/// Write entries as the same `[{"Name", "Size", "IsDir"}, ...]` array that
/// `GET /files` serves.
pub fn export_json(entries: &[Entry], output_path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(output_path, json)?;
    Ok(())
}
