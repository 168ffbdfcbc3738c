//! Process hardening for sensitive data
//!
//! Disables core dumps via `setrlimit(RLIMIT_CORE, 0)` so that a crash while
//! the vault is unlocked never writes mnemonics to disk.
//!
//! Best-effort: failures are logged but don't stop the application, since
//! containers and unprivileged users may not permit the call.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set once core dumps are disabled
static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Call early in startup, before any vault is decrypted. Returns `true` if
/// core dumps are disabled after the call.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.load(Ordering::SeqCst) {
        return true;
    }

    let disabled = platform_disable();
    if disabled {
        CORE_DUMPS_DISABLED.store(true, Ordering::SeqCst);
        log::debug!("Core dumps disabled");
    }
    disabled
}

#[cfg(unix)]
fn platform_disable() -> bool {
    let rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: setrlimit only reads the struct we pass
    let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
    if result != 0 {
        log::warn!(
            "Failed to disable core dumps: {}",
            std::io::Error::last_os_error()
        );
        return false;
    }
    true
}

#[cfg(not(unix))]
fn platform_disable() -> bool {
    log::warn!("Core dump prevention not supported on this platform");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_core_dumps_idempotent() {
        // Sandboxed CI may refuse setrlimit; only a success must be sticky
        let first = disable_core_dumps();
        if first {
            assert!(disable_core_dumps());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_core_limit_zero_after_disable() {
        if !disable_core_dumps() {
            return;
        }
        let mut rlim = libc::rlimit {
            rlim_cur: 1,
            rlim_max: 1,
        };
        let result = unsafe { libc::getrlimit(libc::RLIMIT_CORE, &mut rlim) };
        assert_eq!(result, 0);
        assert_eq!(rlim.rlim_cur, 0);
    }
}
