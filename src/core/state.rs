//! Process-wide shutdown state.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `LISTENING`: Is a long-running command waiting for the signal?

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// A long-running command (e.g. `edit`) handles shutdown gracefully
static LISTENING: AtomicBool = AtomicBool::new(false);

/// Wakes whoever awaits `shutdown_signal()`
static SHUTDOWN_NOTIFY: LazyLock<Notify> = LazyLock::new(Notify::new);

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a listener has been registered:
/// - Before `listen_for_shutdown()`: exit immediately, nothing to clean up
/// - After `listen_for_shutdown()`: set the flag and wake the listener
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if LISTENING.load(Ordering::SeqCst) {
            crate::log!("vitae"; "shutting down...");
            SHUTDOWN_NOTIFY.notify_one();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the caller as the graceful shutdown listener.
pub fn listen_for_shutdown() {
    LISTENING.store(true, Ordering::SeqCst);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Resolve once shutdown has been requested.
pub async fn shutdown_signal() {
    if is_shutdown() {
        return;
    }
    SHUTDOWN_NOTIFY.notified().await;
}
