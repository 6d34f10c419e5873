//! One-shot latch holding the fzf control port.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct LatchState {
    port: Option<u16>,
    closed: bool,
}

/// Write-once port cell that readers can block on.
///
/// The first `set` wins and wakes every waiter. `close` releases waiters
/// without a port so they can exit when the session ends first.
#[derive(Debug, Default)]
pub struct PortLatch {
    state: Mutex<LatchState>,
    ready: Condvar,
}

impl PortLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the port. Returns `false` if one was already recorded.
    pub fn set(&self, port: u16) -> bool {
        let mut state = self.state.lock();
        if state.port.is_some() {
            return false;
        }
        state.port = Some(port);
        self.ready.notify_all();
        true
    }

    #[cfg(test)]
    pub fn get(&self) -> Option<u16> {
        self.state.lock().port
    }

    /// Block until the port is set, or the latch is closed without one.
    pub fn wait(&self) -> Option<u16> {
        let mut state = self.state.lock();
        while state.port.is_none() && !state.closed {
            self.ready.wait(&mut state);
        }
        state.port
    }

    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }
}
