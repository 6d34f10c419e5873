//! External file watcher process and its change-batch output.
//!
//! `watchexec --only-emit-events --emit-events-to=stdio` prints one
//! `kind:path` line per change and a blank line after each debounced batch.

use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Stdio},
};

use super::MonitorError;
use crate::config::WatchConfig;
use crate::debug;
use crate::utils::{exec::Cmd, lines::Lines};

/// What happened to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Modify,
    Remove,
    Rename,
    Other(String),
}

impl ChangeKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "create" => Self::Create,
            "modify" => Self::Modify,
            "remove" => Self::Remove,
            "rename" => Self::Rename,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl MonitorChange {
    /// Parse one `kind:path` line.
    pub fn from_line(line: &str) -> Result<Self, MonitorError> {
        let text = line.trim_end_matches(['\n', '\r']);
        let (kind, path) = text
            .split_once(':')
            .ok_or_else(|| MonitorError::Malformed(text.to_string()))?;
        Ok(Self {
            kind: ChangeKind::from_tag(kind),
            path: PathBuf::from(path),
        })
    }
}

/// Changes observed within one debounce window. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub changes: Vec<MonitorChange>,
}

/// Iterator of change batches read from watcher output.
pub struct MonitorEvents<R> {
    lines: Lines<R>,
}

impl<R: BufRead> MonitorEvents<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Lines::new(reader),
        }
    }
}

impl<R: BufRead> Iterator for MonitorEvents<R> {
    type Item = Result<MonitorEvent, MonitorError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::new();
        for line in self.lines.by_ref() {
            if line.trim_end_matches(['\n', '\r']).is_empty() {
                if batch.is_empty() {
                    continue;
                }
                break;
            }
            batch.push(line);
        }
        if batch.is_empty() {
            return None;
        }
        Some(
            batch
                .iter()
                .map(|line| MonitorChange::from_line(line))
                .collect::<Result<_, _>>()
                .map(|changes| MonitorEvent { changes }),
        )
    }
}

/// Running watcher process.
pub struct FilesystemMonitor {
    child: Child,
    stdout: Option<ChildStdout>,
}

impl FilesystemMonitor {
    /// Start the watcher on `dir`; it stays quiet until the first change.
    pub fn spawn(config: &WatchConfig, dir: &Path) -> Result<Self, MonitorError> {
        let program = which::which(&config.binary)
            .map_err(|_| MonitorError::WatcherNotFound(config.binary.clone()))?;

        let mut cmd = Cmd::new(program)
            .args([
                "--only-emit-events",
                "--emit-events-to=stdio",
                "--no-meta",
                "--postpone",
            ])
            .cwd(dir);
        if let Some(debounce) = config.debounce() {
            cmd = cmd.arg(format!("--debounce={}ms", debounce.as_millis()));
        }
        debug!("monitor"; "{}", cmd.display());

        let mut child = cmd
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdout = child.stdout.take();
        Ok(Self { child, stdout })
    }

    /// Take the change batches; `None` after the first call.
    pub fn take_events(&mut self) -> Option<MonitorEvents<BufReader<ChildStdout>>> {
        self.stdout
            .take()
            .map(|stdout| MonitorEvents::new(BufReader::new(stdout)))
    }

    /// Kill the watcher and reap it.
    pub fn stop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
