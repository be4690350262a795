use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by every task of one scan. They feed the file and
/// directory totals of a [`crate::models::scan_result::ScanResult`]; entry
/// sizes are never derived from them.
pub struct ProgressTracker {
    files_scanned: AtomicUsize,
    dirs_scanned: AtomicUsize,
    issues_count: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            files_scanned: AtomicUsize::new(0),
            dirs_scanned: AtomicUsize::new(0),
            issues_count: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_files(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dirs(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_issues(&self) {
        self.issues_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < f64::EPSILON {
            return 0.0;
        }
        self.files_scanned.load(Ordering::Relaxed) as f64 / elapsed
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            dirs_scanned: self.dirs_scanned.load(Ordering::Relaxed),
            issues_count: self.issues_count.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            files_per_second: self.files_per_second(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub files_scanned: usize,
    pub dirs_scanned: usize,
    pub issues_count: usize,
    pub elapsed: Duration,
    pub files_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_work() {
        let tracker = ProgressTracker::new();
        tracker.increment_files();
        tracker.increment_files();
        tracker.increment_dirs();
        tracker.increment_issues();

        let snap = tracker.snapshot();
        assert_eq!(snap.files_scanned, 2);
        assert_eq!(snap.dirs_scanned, 1);
        assert_eq!(snap.issues_count, 1);
    }
}
