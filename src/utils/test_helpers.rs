//! Shared setup for unit and integration tests.

use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Routes `tracing` output of the documenter to the test writer, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs the subscriber.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Permission bits do not stop root, so unreadable-directory scans can only
/// be exercised as a regular user.
#[cfg(test)]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
