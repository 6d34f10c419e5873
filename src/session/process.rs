//! Ownership of the running command process.

use parking_lot::Mutex;
use std::{
    io,
    process::{Child, ExitStatus},
};

use crate::debug;

/// The command process currently producing blocks, if any.
///
/// Every operation on the child happens under the lock, so a reload cannot
/// observe a half-terminated command, and the main thread cannot reap a
/// process the server is killing.
#[derive(Debug, Default)]
pub struct CommandSlot {
    child: Mutex<Option<Child>>,
}

impl CommandSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly spawned command.
    pub fn register(&self, child: Child) {
        debug!("session"; "command started (pid {})", child.id());
        let previous = self.child.lock().replace(child);
        if let Some(mut previous) = previous {
            let _ = terminate(&mut previous);
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.child.lock().is_none()
    }

    /// Kill the recorded command, if still running, and wait for it to exit.
    ///
    /// Returns `None` when no command was recorded.
    pub fn terminate_and_wait(&self) -> io::Result<Option<ExitStatus>> {
        let mut slot = self.child.lock();
        match slot.take() {
            Some(mut child) => terminate(&mut child).map(Some),
            None => Ok(None),
        }
    }
}

fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }
    debug!("session"; "terminating command (pid {})", child.id());
    child.kill()?;
    child.wait()
}
