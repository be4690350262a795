use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::core::sorter::SortDirection;
use crate::models::entry::{human_readable_size, Entry};
use crate::models::scan_result::ScanResult;

/// Render a scan as a plain-text table, one row per entry in the order given.
pub fn render_table(result: &ScanResult, direction: SortDirection) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "{} (sorted {})", result.scan_path.display(), direction)?;
    writeln!(out)?;

    let sizes: Vec<String> = result.entries.iter().map(Entry::human_readable_size).collect();
    let size_width = sizes.iter().map(|s| s.width()).max().unwrap_or(0);

    for (entry, size) in result.entries.iter().zip(&sizes) {
        let kind = if entry.is_dir { "DIR " } else { "FILE" };
        let pad = size_width - size.width();
        writeln!(out, "{kind}  {}{size}  {}", " ".repeat(pad), entry.name)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} entries, {} total, {:.2}s",
        result.entries.len(),
        human_readable_size(result.total_size),
        result.scan_duration.as_secs_f64()
    )?;

    if !result.issues.is_empty() {
        writeln!(out, "{} path(s) could not be read:", result.issues.len())?;
        for issue in &result.issues {
            writeln!(out, "  {:?}: {}", issue.kind, issue.path.display())?;
        }
    }

    Ok(out)
}
