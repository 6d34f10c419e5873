//! Ctrl+C handling for the top-level role.
//!
//! fzf shares the terminal's process group, so Ctrl+C reaches tuick too.
//! fzf decides what the keypress means; tuick only records it and keeps
//! running long enough to stop the monitor and the reload server.

use std::sync::atomic::{AtomicBool, Ordering};

/// Ctrl+C has been received
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Setup the Ctrl+C handler. Call once, before spawning fzf.
pub fn setup_interrupt_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        crate::debug!("session"; "interrupt received");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if Ctrl+C was received
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}
