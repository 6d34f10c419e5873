//! Client side of the session control protocol, used by child roles.

use std::{
    io::{Read, Write},
    net::{Ipv4Addr, Shutdown, TcpStream},
    time::Duration,
};

use super::{SessionEnv, SessionError};
use crate::debug;

/// Upper bound on waiting for a reply; a reload waits for the previous
/// command to be killed.
const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

/// Send one authenticated message and return the reply line.
///
/// An empty reply means the server closed the connection without answering.
pub fn send_message(port: u16, api_key: &str, message: &str) -> Result<String, SessionError> {
    let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port))?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;
    stream.write_all(format!("secret: {api_key}\n{message}\n").as_bytes())?;
    stream.shutdown(Shutdown::Write)?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply)?;
    Ok(reply.trim_end().to_string())
}

impl SessionEnv {
    /// Send `message` to the session server and require the `expected` reply.
    pub fn request(&self, message: &str, expected: &'static str) -> Result<(), SessionError> {
        debug!("session"; "sending {message:?} to port {}", self.port);
        let reply = send_message(self.port, &self.api_key, message)?;
        if reply == expected {
            Ok(())
        } else {
            Err(SessionError::UnexpectedReply {
                expected,
                got: reply,
            })
        }
    }
}
