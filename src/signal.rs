//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared by the Drive listing loop and the path
//! resolver. Both check it between network calls, so an interrupt takes
//! effect after the request in flight returns (bounded by the HTTP timeout).
//! The run then ends with exit code 130.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (128 + 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag to hand to [`crate::duplicates::FinderConfig`] and
    /// [`crate::source::DriveSource`].
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error installing the Ctrl+C hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// The hook is registered once per process. Later calls get the same
/// handler back with its flag cleared, which keeps repeated `run_app` calls
/// in one test binary working.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if ctrlc refuses the hook for a
/// reason other than one being registered already.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Waiting for the current request...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {}
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using an unhooked flag");
        }
        Err(e) => return Err(SignalError::InstallFailed(e)),
    }

    Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raised(handler: &ShutdownHandler) -> bool {
        handler.get_flag().load(Ordering::SeqCst)
    }

    #[test]
    fn test_new_handler_not_requested() {
        assert!(!raised(&ShutdownHandler::new()));
    }

    #[test]
    fn test_reset_clears_flag() {
        let handler = ShutdownHandler::new();
        handler.get_flag().store(true, Ordering::SeqCst);
        assert!(raised(&handler));
        handler.reset();
        assert!(!raised(&handler));
    }

    #[test]
    fn test_flag_is_shared() {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        let cloned = handler.clone();

        flag.store(true, Ordering::SeqCst);
        assert!(raised(&handler));
        assert!(raised(&cloned));
    }

    #[test]
    fn test_install_twice_returns_cleared_handler() {
        let first = install_handler().unwrap();
        first.get_flag().store(true, Ordering::SeqCst);
        let second = install_handler().unwrap();
        assert!(!raised(&second));
        assert!(!raised(&first));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShutdownHandler>();
    }
}
