use crate::domain::migration::LockProbe;
use nix::fcntl::{FcntlArg, fcntl};
use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::Path;
use tracing::{debug, warn};

/// dpkg/apt のロックファイルを F_GETLK で問い合わせる
///
/// dpkg and apt take POSIX record locks, which `flock` does not see.
/// `F_GETLK` reports a conflicting lock without acquiring anything, so the
/// probe never blocks a package manager that starts right after it.
pub struct FcntlLockProbe;

impl Default for FcntlLockProbe {
    fn default() -> Self {
        Self
    }
}

impl FcntlLockProbe {
    pub fn new() -> Self {
        Self
    }
}

impl LockProbe for FcntlLockProbe {
    fn is_held(&self, path: &Path) -> bool {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Lock {} not present: {}", path.display(), e);
                return false;
            }
        };

        // SAFETY: flock is a plain C struct; all-zero is a valid value.
        let mut query: libc::flock = unsafe { std::mem::zeroed() };
        query.l_type = libc::F_WRLCK as libc::c_short;
        query.l_whence = libc::SEEK_SET as libc::c_short;

        match fcntl(file.as_raw_fd(), FcntlArg::F_GETLK(&mut query)) {
            Ok(_) => {
                let held = query.l_type != libc::F_UNLCK as libc::c_short;
                if held {
                    debug!("Lock {} held by pid {}", path.display(), query.l_pid);
                }
                held
            }
            Err(e) => {
                warn!("Cannot query lock {}: {}", path.display(), e);
                false
            }
        }
    }
}
