//! Ctrl+C / SIGTERM handling
//!
//! While a delegate stream is active the handler only raises a flag; the
//! stream notices it, kills the child and reports `Interrupted`. Outside a
//! stream there is nothing to clean up, so the handler exits right away.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set when an interrupt arrived during a stream
static CANCELLED: AtomicBool = AtomicBool::new(false);

/// True while a [`StreamingGuard`] is alive
static STREAMING: AtomicBool = AtomicBool::new(false);

/// Notice printed on interruption.
///
/// ctrlc reports SIGINT and SIGTERM through the same callback, so one notice
/// covers both.
pub const INTERRUPTED_NOTICE: &str = "\n\n🛑 Interrupted by user (or Terminated)";

/// Check if cancellation was requested
pub fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

/// Set up the process-wide signal handler (idempotent)
pub fn install_handler() {
    static HANDLER_SET: AtomicBool = AtomicBool::new(false);

    if HANDLER_SET.swap(true, Ordering::SeqCst) {
        return;
    }

    if let Err(e) = ctrlc::set_handler(move || {
        if STREAMING.load(Ordering::SeqCst) {
            CANCELLED.store(true, Ordering::SeqCst);
        } else {
            println!("{}", INTERRUPTED_NOTICE);
            std::process::exit(0);
        }
    }) {
        tracing::warn!("could not set Ctrl+C handler: {}", e);
    }
}

/// Marks a delegate stream as active for the lifetime of the guard
pub struct StreamingGuard {
    _private: (),
}

impl StreamingGuard {
    pub fn new() -> Self {
        CANCELLED.store(false, Ordering::SeqCst);
        STREAMING.store(true, Ordering::SeqCst);
        Self { _private: () }
    }
}

impl Default for StreamingGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamingGuard {
    fn drop(&mut self) {
        STREAMING.store(false, Ordering::SeqCst);
    }
}
