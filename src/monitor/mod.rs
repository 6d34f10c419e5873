//! Filesystem monitor thread.
//!
//! Frames the output of an external watcher into change batches and, for each
//! batch, asks fzf to reload. Notifications wait until fzf has reported its
//! control port through the reload server.

mod notify;
mod watcher;

pub use notify::FzfNotifier;
use watcher::{FilesystemMonitor, MonitorEvent};

use std::{
    io,
    path::Path,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use thiserror::Error;

use crate::config::WatchConfig;
use crate::session::PortLatch;
use crate::{debug, log};

/// How long `stop` waits for the thread before leaving it behind.
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("expected `kind:path` change from watcher, received {0:?}")]
    Malformed(String),

    #[error("`{0}` not found, file watching disabled (install watchexec or set [watch] binary)")]
    WatcherNotFound(String),

    #[error("fzf rejected reload request with status {0}")]
    Rejected(u16),

    #[error("reload request failed")]
    Http(#[from] reqwest::Error),

    #[error("watcher I/O error")]
    Io(#[from] io::Error),
}

/// Background thread turning file changes into fzf reloads.
pub struct MonitorThread {
    watcher: Option<FilesystemMonitor>,
    handle: Option<JoinHandle<()>>,
    latch: Arc<PortLatch>,
}

impl MonitorThread {
    /// Spawn the watcher in `dir` and start notifying.
    pub fn start(
        config: &WatchConfig,
        dir: &Path,
        notifier: FzfNotifier,
        latch: Arc<PortLatch>,
    ) -> Result<Self, MonitorError> {
        let mut watcher = FilesystemMonitor::spawn(config, dir)?;
        let Some(events) = watcher.take_events() else {
            watcher.stop();
            return Err(io::Error::other("watcher output not captured").into());
        };
        let mut thread = Self::with_events(events, notifier, latch)?;
        thread.watcher = Some(watcher);
        Ok(thread)
    }

    /// Start notifying for an arbitrary source of change batches.
    pub fn with_events<E>(events: E, notifier: FzfNotifier, latch: Arc<PortLatch>) -> io::Result<Self>
    where
        E: IntoIterator<Item = Result<MonitorEvent, MonitorError>>,
        E::IntoIter: Send + 'static,
    {
        let events = events.into_iter();
        let thread_latch = Arc::clone(&latch);
        let handle = thread::Builder::new()
            .name("tuick-monitor".into())
            .spawn(move || run(events, &notifier, &thread_latch))?;
        Ok(Self {
            watcher: None,
            handle: Some(handle),
            latch,
        })
    }

    /// Kill the watcher and join the thread, giving up after a short wait.
    ///
    /// Closes the port latch first, releasing a batch still waiting for
    /// fzf's port.
    pub fn stop(&mut self) {
        self.latch.close();
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        let Some(handle) = self.handle.take() else {
            return;
        };

        let step = Duration::from_millis(50);
        let mut waited = Duration::ZERO;
        while waited < JOIN_TIMEOUT {
            if handle.is_finished() {
                let _ = handle.join();
                return;
            }
            thread::sleep(step);
            waited += step;
        }
        debug!("monitor"; "thread still busy, not waiting for it");
    }
}

impl Drop for MonitorThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<E>(events: E, notifier: &FzfNotifier, latch: &PortLatch)
where
    E: Iterator<Item = Result<MonitorEvent, MonitorError>>,
{
    for event in events {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                log!("error"; "{err}");
                break;
            }
        };
        for change in &event.changes {
            debug!("monitor"; "{:?} {}", change.kind, change.path.display());
        }

        let Some(port) = latch.wait() else {
            debug!("monitor"; "session ended before fzf was ready");
            break;
        };
        if let Err(err) = notifier.reload(port) {
            log!("warn"; "{err}");
        }
    }
    debug!("monitor"; "stopped");
}

#[cfg(test)]
mod tests {
    use super::watcher::{ChangeKind, MonitorChange};
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use tiny_http::{Response, Server};

    /// Fake fzf `--listen` endpoint.
    fn fake_fzf() -> (Server, u16) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        (server, port)
    }

    /// Receive one request, answer 200, return (body, api key header).
    fn receive(server: &Server, timeout: Duration) -> Option<(String, String)> {
        let mut request = server.recv_timeout(timeout).unwrap()?;
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        let key = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("X-Api-Key"))
            .map(|h| h.value.as_str().to_string())
            .unwrap_or_default();
        request.respond(Response::empty(200)).unwrap();
        Some((body, key))
    }

    fn event(path: &str) -> MonitorEvent {
        MonitorEvent {
            changes: vec![MonitorChange {
                kind: ChangeKind::Modify,
                path: PathBuf::from(path),
            }],
        }
    }

    fn notifier() -> FzfNotifier {
        FzfNotifier::new("fzf-key", "tuick --reload -- mypy .", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_notification_waits_for_port() {
        let (fzf, port) = fake_fzf();
        let latch = Arc::new(PortLatch::new());
        let (tx, rx) = mpsc::channel();
        let mut monitor = MonitorThread::with_events(rx, notifier(), Arc::clone(&latch)).unwrap();

        tx.send(Ok(event("/a.py"))).unwrap();
        assert_eq!(receive(&fzf, Duration::from_millis(200)), None);

        latch.set(port);
        let (body, key) = receive(&fzf, Duration::from_secs(5)).unwrap();
        assert_eq!(body, "reload:tuick --reload -- mypy .");
        assert_eq!(key, "fzf-key");

        drop(tx);
        monitor.stop();
    }

    #[test]
    fn test_one_notification_per_batch() {
        let (fzf, port) = fake_fzf();
        let latch = Arc::new(PortLatch::new());
        latch.set(port);
        let batches = vec![Ok(event("/a")), Ok(event("/b"))];
        let mut monitor = MonitorThread::with_events(batches, notifier(), latch).unwrap();

        assert!(receive(&fzf, Duration::from_secs(5)).is_some());
        assert!(receive(&fzf, Duration::from_secs(5)).is_some());
        assert_eq!(receive(&fzf, Duration::from_millis(100)), None);
        monitor.stop();
    }

    #[test]
    fn test_malformed_batch_stops_thread() {
        let (fzf, port) = fake_fzf();
        let latch = Arc::new(PortLatch::new());
        latch.set(port);
        let batches = vec![Err(MonitorError::Malformed("oops".into())), Ok(event("/a"))];
        let mut monitor = MonitorThread::with_events(batches, notifier(), latch).unwrap();

        assert_eq!(receive(&fzf, Duration::from_millis(200)), None);
        monitor.stop();
    }

    #[test]
    fn test_closed_latch_releases_thread() {
        let latch = Arc::new(PortLatch::new());
        let (tx, rx) = mpsc::channel();
        let mut monitor = MonitorThread::with_events(rx, notifier(), Arc::clone(&latch)).unwrap();
        tx.send(Ok(event("/a"))).unwrap();

        latch.close();
        monitor.handle.take().unwrap().join().unwrap();
    }

    #[test]
    fn test_stop_releases_thread_waiting_for_port() {
        let latch = Arc::new(PortLatch::new());
        let (tx, rx) = mpsc::channel();
        let mut monitor = MonitorThread::with_events(rx, notifier(), Arc::clone(&latch)).unwrap();
        tx.send(Ok(event("/a"))).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        monitor.stop();
        assert_eq!(latch.wait(), None);
        // The thread is gone along with its receiver
        assert!(tx.send(Ok(event("/b"))).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_start_with_watcher_process() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-watchexec");
        std::fs::write(
            &script,
            "#!/bin/sh\nprintf 'create:/tmp/a\\nmodify:/tmp/b\\n\\n'\nexec sleep 30\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let (fzf, port) = fake_fzf();
        let latch = Arc::new(PortLatch::new());
        latch.set(port);
        let config = WatchConfig {
            binary: script.to_string_lossy().into_owned(),
            ..WatchConfig::default()
        };

        let mut monitor = MonitorThread::start(&config, dir.path(), notifier(), latch).unwrap();
        assert!(receive(&fzf, Duration::from_secs(5)).is_some());

        monitor.stop();
        assert!(monitor.handle.is_none());
    }

    #[test]
    fn test_missing_watcher() {
        let config = WatchConfig {
            binary: "no-such-watcher-xyz".into(),
            ..WatchConfig::default()
        };
        let result = MonitorThread::start(
            &config,
            Path::new("."),
            notifier(),
            Arc::new(PortLatch::new()),
        );
        assert!(matches!(result, Err(MonitorError::WatcherNotFound(_))));
    }
}
