use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use crate::config::settings::Settings;
use crate::error::ScanError;
use crate::models::entry::Entry;
use crate::models::scan_result::{ScanIssue, ScanResult};

use super::accumulator::{read_dir_batch, DirEntryData, LinkTarget, SizeAccumulator, Subtotal};
use super::progress::ProgressTracker;

/// Lists the immediate children of a directory and sizes each of them.
///
/// A `Scanner` is cheap to clone. Clones share one I/O semaphore, so
/// concurrent scans (one per HTTP request, say) are throttled together.
#[derive(Clone)]
pub struct Scanner {
    semaphore: Arc<Semaphore>,
    settings: Arc<Settings>,
}

impl Scanner {
    pub fn new(settings: Settings) -> Self {
        let max_io = settings.max_concurrent_io.max(1);
        Self::with_semaphore(settings, Arc::new(Semaphore::new(max_io)))
    }

    /// Build a scanner that draws directory-read permits from `semaphore`
    /// instead of its own pool. `settings.max_concurrent_io` is ignored.
    pub fn with_semaphore(settings: Settings, semaphore: Arc<Semaphore>) -> Self {
        Self {
            semaphore,
            settings: Arc::new(settings),
        }
    }

    /// Directory-read permits not currently held by any scan.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Scan `root` and return one entry per immediate child, in listing order.
    ///
    /// Returns only once every spawned subtree task has finished. Dropping the
    /// returned future aborts all of them.
    pub async fn scan(&self, root: impl Into<PathBuf>) -> Result<ScanResult, ScanError> {
        let root = root.into();

        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| ScanError::from_root_io(root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let progress = Arc::new(ProgressTracker::new());
        let accumulator = SizeAccumulator::new(
            Arc::clone(&self.semaphore),
            Arc::clone(&progress),
            self.settings.follow_symlinks,
        );
        accumulator.mark_visited(&root).await;
        progress.increment_dirs();

        let listing = {
            let _permit = self.semaphore.acquire().await.ok();
            let dir = root.clone();
            tokio::task::spawn_blocking(move || read_dir_batch(&dir))
                .await
                .map_err(|e| ScanError::Join(e.to_string()))?
        };
        let (children, listing_errors) =
            listing.map_err(|e| ScanError::from_root_io(root.clone(), e))?;

        // Nested problems only, the root itself has been read fine.
        let mut nested = Subtotal::default();
        for (err_path, err) in listing_errors {
            accumulator.record_issue(&mut nested, ScanIssue::from_io(err_path, &err));
        }

        let mut slots: Vec<Option<Entry>> = vec![None; children.len()];
        let mut pending = JoinSet::new();

        for (index, child) in children.into_iter().enumerate() {
            let DirEntryData {
                path,
                name,
                metadata,
            } = child;
            let metadata = match metadata {
                Ok(meta) => meta,
                Err(e) => {
                    accumulator.record_issue(&mut nested, ScanIssue::from_io(path.clone(), &e));
                    slots[index] = Some(Entry::file(path, name, 0));
                    continue;
                }
            };
            let file_type = metadata.file_type();

            if file_type.is_dir() {
                let acc = accumulator.clone();
                pending.spawn(async move {
                    let subtotal = acc.compute_size(path.clone()).await;
                    (index, Entry::directory(path, name, subtotal.bytes), subtotal)
                });
            } else if file_type.is_file() {
                progress.increment_files();
                slots[index] = Some(Entry::file(path, name, metadata.len()));
            } else if file_type.is_symlink() && accumulator.follows_symlinks() {
                match accumulator.resolve_symlink(&path).await {
                    Ok(LinkTarget::Directory(real)) => {
                        let acc = accumulator.clone();
                        pending.spawn(async move {
                            let subtotal = acc.compute_size(real).await;
                            (index, Entry::directory(path, name, subtotal.bytes), subtotal)
                        });
                    }
                    Ok(LinkTarget::File(size)) => {
                        progress.increment_files();
                        slots[index] = Some(Entry::file(path, name, size));
                    }
                    Ok(LinkTarget::Other) => {
                        slots[index] = Some(Entry::file(path, name, 0));
                    }
                    Err(issue) => {
                        accumulator.record_issue(&mut nested, issue);
                        slots[index] = Some(Entry::file(path, name, 0));
                    }
                }
            } else {
                // Unfollowed links, sockets, fifos, devices: listed, never sized.
                slots[index] = Some(Entry::file(path, name, 0));
            }
        }

        while let Some(joined) = pending.join_next().await {
            let (index, entry, subtotal) = joined.map_err(|e| ScanError::Join(e.to_string()))?;
            slots[index] = Some(entry);
            nested.issues.extend(subtotal.issues);
        }

        let entries: Vec<Entry> = slots.into_iter().flatten().collect();
        let total_size: u64 = entries.iter().map(|e| e.size).sum();
        let snapshot = progress.snapshot();

        info!(
            root = %root.display(),
            entries = entries.len(),
            total_size,
            files = snapshot.files_scanned,
            dirs = snapshot.dirs_scanned,
            issues = snapshot.issues_count,
            files_per_second = snapshot.files_per_second as u64,
            elapsed_ms = snapshot.elapsed.as_millis() as u64,
            "scan completed"
        );

        Ok(ScanResult {
            entries,
            total_size,
            total_files: snapshot.files_scanned,
            total_dirs: snapshot.dirs_scanned,
            scan_duration: snapshot.elapsed,
            issues: nested.issues,
            scan_path: root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> Scanner {
        Scanner::new(Settings {
            max_concurrent_io: 4,
            ..Settings::default()
        })
    }

    #[tokio::test]
    async fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = scanner().scan(dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[tokio::test]
    async fn file_root_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"hi").unwrap();
        let err = scanner().scan(file).await.unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn empty_root_yields_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let result = scanner().scan(dir.path()).await.unwrap();
        assert!(result.entries.is_empty());
        assert_eq!(result.total_size, 0);
        assert_eq!(result.total_dirs, 1);
    }

    #[tokio::test]
    async fn entries_follow_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["one", "two", "three"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
            std::fs::write(dir.path().join(name).join("f"), name.as_bytes()).unwrap();
        }
        std::fs::write(dir.path().join("loose.txt"), b"abc").unwrap();

        let listed: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();

        let result = scanner().scan(dir.path()).await.unwrap();
        let scanned: Vec<String> = result.entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(scanned, listed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn top_level_symlink_is_listed_with_zero_size() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("big"), vec![0u8; 64]).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let result = scanner().scan(dir.path()).await.unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].size, 0);
        assert!(!result.entries[0].is_dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn followed_top_level_symlink_is_sized_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("big"), vec![0u8; 64]).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let scanner = Scanner::new(Settings {
            max_concurrent_io: 4,
            follow_symlinks: true,
            ..Settings::default()
        });
        let result = scanner.scan(dir.path()).await.unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].size, 64);
        assert!(result.entries[0].is_dir);
    }
}
