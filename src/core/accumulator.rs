use std::fs::Metadata;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::scan_result::{ScanIssue, ScanIssueKind};

use super::progress::ProgressTracker;

/// What a directory subtree added up to.
#[derive(Debug, Default, Clone)]
pub struct Subtotal {
    pub bytes: u64,
    pub issues: Vec<ScanIssue>,
}

impl Subtotal {
    fn merge(&mut self, other: Subtotal) {
        self.bytes += other.bytes;
        self.issues.extend(other.issues);
    }
}

/// Where a followed symlink leads.
pub(crate) enum LinkTarget {
    Directory(PathBuf),
    File(u64),
    Other,
}

/// Sums regular-file sizes under a directory, one task per subdirectory.
///
/// Every task hands its [`Subtotal`] back to its parent through a [`JoinSet`],
/// so there is no shared result list. Dropping the future returned by
/// [`SizeAccumulator::compute_size`] aborts the whole subtree of tasks.
#[derive(Clone)]
pub struct SizeAccumulator {
    semaphore: Arc<Semaphore>,
    visited: Arc<DashSet<PathBuf>>,
    progress: Arc<ProgressTracker>,
    follow_symlinks: bool,
}

impl SizeAccumulator {
    pub fn new(
        semaphore: Arc<Semaphore>,
        progress: Arc<ProgressTracker>,
        follow_symlinks: bool,
    ) -> Self {
        Self {
            semaphore,
            visited: Arc::new(DashSet::new()),
            progress,
            follow_symlinks,
        }
    }

    /// Total bytes of every regular file below `path`. Unreadable branches
    /// count as zero and come back as issues.
    pub async fn compute_size(&self, path: PathBuf) -> Subtotal {
        accumulate(self.clone(), path).await
    }

    /// Remember `dir` as already walked. Only meaningful when following links.
    pub(crate) async fn mark_visited(&self, dir: &Path) {
        if !self.follow_symlinks {
            return;
        }
        if let Ok(real) = tokio::fs::canonicalize(dir).await {
            self.visited.insert(real);
        }
    }

    pub(crate) fn follows_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub(crate) async fn resolve_symlink(&self, link: &Path) -> Result<LinkTarget, ScanIssue> {
        let real = tokio::fs::canonicalize(link)
            .await
            .map_err(|e| ScanIssue::from_io(link.to_path_buf(), &e))?;
        let meta = tokio::fs::metadata(&real)
            .await
            .map_err(|e| ScanIssue::from_io(link.to_path_buf(), &e))?;
        Ok(if meta.is_dir() {
            LinkTarget::Directory(real)
        } else if meta.is_file() {
            LinkTarget::File(meta.len())
        } else {
            LinkTarget::Other
        })
    }

    pub(crate) fn record_issue(&self, subtotal: &mut Subtotal, issue: ScanIssue) {
        warn!(
            path = %issue.path.display(),
            kind = ?issue.kind,
            "skipping unreadable path: {}",
            issue.message
        );
        self.progress.increment_issues();
        subtotal.issues.push(issue);
    }
}

/// Collected directory entry from batch I/O.
pub(crate) struct DirEntryData {
    pub path: PathBuf,
    pub name: String,
    pub metadata: std::io::Result<Metadata>,
}

/// Read all entries and their metadata from a directory in one blocking call.
/// The second list holds errors raised by the listing itself, which leave no
/// name behind to attach them to.
pub(crate) fn read_dir_batch(
    dir_path: &Path,
) -> std::io::Result<(Vec<DirEntryData>, Vec<(PathBuf, std::io::Error)>)> {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for entry_result in std::fs::read_dir(dir_path)? {
        match entry_result {
            Ok(entry) => {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                let metadata = std::fs::symlink_metadata(&path);
                entries.push(DirEntryData {
                    path,
                    name,
                    metadata,
                });
            }
            Err(e) => errors.push((dir_path.to_path_buf(), e)),
        }
    }

    Ok((entries, errors))
}

fn accumulate(acc: SizeAccumulator, path: PathBuf) -> Pin<Box<dyn Future<Output = Subtotal> + Send>> {
    Box::pin(async move {
        let mut subtotal = Subtotal::default();

        if acc.follow_symlinks {
            match tokio::fs::canonicalize(&path).await {
                Ok(real) => {
                    if !acc.visited.insert(real) {
                        acc.record_issue(
                            &mut subtotal,
                            ScanIssue {
                                path: path.clone(),
                                kind: ScanIssueKind::SymlinkCycle,
                                message: format!("directory already visited: {}", path.display()),
                            },
                        );
                        return subtotal;
                    }
                }
                Err(e) => {
                    acc.record_issue(&mut subtotal, ScanIssue::from_io(path, &e));
                    return subtotal;
                }
            }
        }

        acc.progress.increment_dirs();

        // Permit is held only for the blocking read, never while waiting on children.
        let io_result = {
            // The semaphore is never closed, a missing permit only means no throttling.
            let _permit = acc.semaphore.acquire().await.ok();
            let dir = path.clone();
            tokio::task::spawn_blocking(move || read_dir_batch(&dir)).await
        };

        let (entries, listing_errors) = match io_result {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                acc.record_issue(&mut subtotal, ScanIssue::from_io(path, &e));
                return subtotal;
            }
            Err(e) => {
                acc.record_issue(
                    &mut subtotal,
                    ScanIssue {
                        path,
                        kind: ScanIssueKind::IoError,
                        message: format!("directory read task failed: {e}"),
                    },
                );
                return subtotal;
            }
        };

        for (err_path, err) in listing_errors {
            acc.record_issue(&mut subtotal, ScanIssue::from_io(err_path, &err));
        }

        let mut children = JoinSet::new();

        for entry in entries {
            let metadata = match entry.metadata {
                Ok(meta) => meta,
                Err(e) => {
                    acc.record_issue(&mut subtotal, ScanIssue::from_io(entry.path, &e));
                    continue;
                }
            };
            let file_type = metadata.file_type();

            if file_type.is_file() {
                subtotal.bytes += metadata.len();
                acc.progress.increment_files();
            } else if file_type.is_dir() {
                children.spawn(accumulate(acc.clone(), entry.path));
            } else if file_type.is_symlink() && acc.follow_symlinks {
                match acc.resolve_symlink(&entry.path).await {
                    Ok(LinkTarget::Directory(real)) => {
                        children.spawn(accumulate(acc.clone(), real));
                    }
                    Ok(LinkTarget::File(size)) => {
                        subtotal.bytes += size;
                        acc.progress.increment_files();
                    }
                    Ok(LinkTarget::Other) => {}
                    Err(issue) => acc.record_issue(&mut subtotal, issue),
                }
            }
        }

        while let Some(joined) = children.join_next().await {
            match joined {
                Ok(child) => subtotal.merge(child),
                Err(e) => acc.record_issue(
                    &mut subtotal,
                    ScanIssue {
                        path: path.clone(),
                        kind: ScanIssueKind::IoError,
                        message: format!("subdirectory task failed: {e}"),
                    },
                ),
            }
        }

        debug!(path = %path.display(), bytes = subtotal.bytes, "subtree summed");
        subtotal
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator(follow_symlinks: bool) -> SizeAccumulator {
        SizeAccumulator::new(
            Arc::new(Semaphore::new(4)),
            Arc::new(ProgressTracker::new()),
            follow_symlinks,
        )
    }

    #[tokio::test]
    async fn empty_directory_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let progress = Arc::new(ProgressTracker::new());
        let acc = SizeAccumulator::new(Arc::new(Semaphore::new(4)), Arc::clone(&progress), false);
        let subtotal = acc.compute_size(dir.path().to_path_buf()).await;
        assert_eq!(subtotal.bytes, 0);
        assert!(subtotal.issues.is_empty());

        let snap = progress.snapshot();
        assert_eq!(snap.files_scanned, 0);
        assert_eq!(snap.dirs_scanned, 1);
    }

    #[tokio::test]
    async fn sums_files_at_every_depth() {
        let dir = tempfile::tempdir().unwrap();
        let mut current = dir.path().to_path_buf();
        let mut expected = 0u64;
        for depth in 0..40u64 {
            current = current.join(format!("level{depth}"));
            std::fs::create_dir(&current).unwrap();
            let content = vec![b'x'; (depth + 1) as usize];
            std::fs::write(current.join("data.bin"), &content).unwrap();
            expected += depth + 1;
        }

        let progress = Arc::new(ProgressTracker::new());
        let acc = SizeAccumulator::new(Arc::new(Semaphore::new(4)), Arc::clone(&progress), false);
        let subtotal = acc.compute_size(dir.path().to_path_buf()).await;
        assert_eq!(subtotal.bytes, expected);

        let snap = progress.snapshot();
        assert_eq!(snap.files_scanned, 40);
        assert_eq!(snap.dirs_scanned, 41);
    }

    #[tokio::test]
    async fn wide_trees_finish_under_a_tiny_permit_pool() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..64 {
            let sub = dir.path().join(format!("d{i}"));
            std::fs::create_dir_all(sub.join("inner")).unwrap();
            std::fs::write(sub.join("inner/f"), [0u8; 3]).unwrap();
        }

        let acc = SizeAccumulator::new(
            Arc::new(Semaphore::new(1)),
            Arc::new(ProgressTracker::new()),
            false,
        );
        let subtotal = acc.compute_size(dir.path().to_path_buf()).await;
        assert_eq!(subtotal.bytes, 64 * 3);
    }

    #[tokio::test]
    async fn vanished_directory_degrades_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        let subtotal = accumulator(false).compute_size(gone).await;
        assert_eq!(subtotal.bytes, 0);
        assert_eq!(subtotal.issues.len(), 1);
        assert_eq!(subtotal.issues[0].kind, ScanIssueKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_are_not_followed_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("big.bin"), vec![0u8; 100]).unwrap();
        let walked = dir.path().join("walked");
        std::fs::create_dir(&walked).unwrap();
        std::os::unix::fs::symlink(&target, walked.join("link")).unwrap();

        let subtotal = accumulator(false).compute_size(walked).await;
        assert_eq!(subtotal.bytes, 0);
        assert!(subtotal.issues.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn followed_symlink_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let loop_dir = dir.path().join("loop");
        std::fs::create_dir(&loop_dir).unwrap();
        std::fs::write(loop_dir.join("f.txt"), b"12345").unwrap();
        std::os::unix::fs::symlink(&loop_dir, loop_dir.join("again")).unwrap();

        let subtotal = accumulator(true).compute_size(loop_dir).await;
        assert_eq!(subtotal.bytes, 5);
        assert!(subtotal
            .issues
            .iter()
            .any(|issue| issue.kind == ScanIssueKind::SymlinkCycle));
    }
}
