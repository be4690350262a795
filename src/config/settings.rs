use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub max_concurrent_io: usize,
    pub follow_symlinks: bool,
    pub shutdown_timeout: Duration,
    pub port_config: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        // Cap concurrency to avoid "too many open files" (EMFILE)
        let max_concurrent_io = cap_by_fd_limit((parallelism * 4).max(4));

        Self {
            max_concurrent_io,
            follow_symlinks: false,
            shutdown_timeout: Duration::from_secs(10),
            port_config: PathBuf::from("./resources/port.config"),
        }
    }
}

/// Cap concurrency based on the system's file descriptor soft limit.
/// Reserves 25% of fds for sockets, stdio and the like.
fn cap_by_fd_limit(max_io: usize) -> usize {
    #[cfg(unix)]
    {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
        if ret == 0 && rlim.rlim_cur != libc::RLIM_INFINITY {
            let usable = rlim.rlim_cur as usize * 3 / 4;
            return max_io.min(usable).max(4);
        }
    }
    max_io
}
