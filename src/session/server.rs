//! Reload socket server.
//!
//! Each interaction is a single connection carrying
//! `secret: <api_key>\n<message>\n`; the server answers with one line and
//! closes. Connections are served one at a time on a dedicated thread.
//!
//! | Message          | Effect                                    | Reply |
//! |------------------|-------------------------------------------|-------|
//! | `reload`         | kill and reap the running command         | `go`  |
//! | `fzf_port: <n>`  | record fzf's control port (first wins)    | `ok`  |
//! | `shutdown`       | stop accepting connections                | none  |
//!
//! Anything without the right secret is dropped without a reply.

use std::{
    io::{self, Read, Write},
    net::{Ipv4Addr, TcpListener, TcpStream},
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use super::{CommandSlot, PortLatch, client::send_message};
use crate::{debug, log};

/// Total time allowed for reading one request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest accepted request, secret line included.
const MAX_REQUEST_BYTES: usize = 1024;

#[derive(Debug, PartialEq, Eq)]
enum Request {
    Reload,
    FzfPort(u16),
    Shutdown,
}

enum Flow {
    Continue,
    Stop,
}

/// State shared with the accept loop.
struct Shared {
    api_key: String,
    slot: Arc<CommandSlot>,
    latch: Arc<PortLatch>,
}

/// Handle to the running server thread.
pub struct ReloadServer {
    port: u16,
    api_key: String,
    handle: Option<JoinHandle<()>>,
}

impl ReloadServer {
    /// Bind an ephemeral loopback port and start serving.
    pub fn start(
        api_key: String,
        slot: Arc<CommandSlot>,
        latch: Arc<PortLatch>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        debug!("reload"; "server listening on port {port}");

        let shared = Shared {
            api_key: api_key.clone(),
            slot,
            latch,
        };
        let handle = std::thread::Builder::new()
            .name("tuick-reload-server".into())
            .spawn(move || serve(listener, &shared))?;

        Ok(Self {
            port,
            api_key,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Ask the accept loop to stop and wait for it.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !handle.is_finished()
            && let Err(err) = send_message(self.port, &self.api_key, "shutdown")
        {
            debug!("reload"; "shutdown request failed: {err}");
        }
        let _ = handle.join();
    }
}

impl Drop for ReloadServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn serve(listener: TcpListener, shared: &Shared) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                debug!("reload"; "accept error: {err}");
                continue;
            }
        };
        match handle_connection(stream, shared) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => break,
            Err(err) => debug!("reload"; "connection error: {err}"),
        }
    }
    // Nobody can register the port any more
    shared.latch.close();
    debug!("reload"; "server stopped");
}

fn handle_connection(stream: TcpStream, shared: &Shared) -> io::Result<Flow> {
    let (secret_line, message) = read_request(&stream, REQUEST_TIMEOUT)?;
    let Some(request) = parse_request(&secret_line, &message, &shared.api_key) else {
        return Ok(Flow::Continue);
    };

    let reply = match request {
        Request::Reload => {
            if let Some(status) = shared.slot.terminate_and_wait()? {
                debug!("reload"; "previous command ended: {status}");
            }
            "go"
        }
        Request::FzfPort(port) => {
            if shared.latch.set(port) {
                debug!("reload"; "fzf listening on port {port}");
            } else {
                log!("warn"; "ignoring repeated fzf port {port}");
            }
            "ok"
        }
        Request::Shutdown => return Ok(Flow::Stop),
    };

    (&stream).write_all(format!("{reply}\n").as_bytes())?;
    Ok(Flow::Continue)
}

/// Read the secret line and the message line.
///
/// The whole read shares one deadline, so a client trickling bytes cannot
/// hold the server past `timeout`. A peer closing early yields short lines.
fn read_request(mut stream: &TcpStream, timeout: Duration) -> io::Result<(String, String)> {
    let deadline = Instant::now() + timeout;
    let mut buf = Vec::with_capacity(64);
    let mut chunk = [0u8; 256];

    while buf.iter().filter(|&&b| b == b'\n').count() < 2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "request deadline exceeded"));
        }
        stream.set_read_timeout(Some(remaining))?;
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "request too large"));
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split_inclusive('\n');
    let secret_line = lines.next().unwrap_or_default().to_string();
    let message = lines.next().unwrap_or_default().to_string();
    Ok((secret_line, message))
}

/// Authenticate and decode a request. `None` for anything to be ignored.
fn parse_request(secret_line: &str, message: &str, api_key: &str) -> Option<Request> {
    let secret = secret_line.trim_end_matches(['\n', '\r']).strip_prefix("secret: ");
    if secret != Some(api_key) {
        log!("warn"; "rejected unauthenticated request");
        return None;
    }

    let message = message.trim_end_matches(['\n', '\r']);
    match message {
        "reload" => Some(Request::Reload),
        "shutdown" => Some(Request::Shutdown),
        _ => match message.strip_prefix("fzf_port: ").map(str::parse) {
            Some(Ok(port)) => Some(Request::FzfPort(port)),
            _ => {
                log!("warn"; "unknown session message {message:?}");
                None
            }
        },
    }
}
