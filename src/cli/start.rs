//! Start role: fzf is up, tell the session where to reach it.

use anyhow::{Context, Result};

use crate::debug;
use crate::session::{SessionEnv, fzf_port_from_env};

pub fn run() -> Result<i32> {
    let port = fzf_port_from_env()?;
    let session = SessionEnv::from_env()?;
    session
        .request(&format!("fzf_port: {port}"), "ok")
        .context("Failed to register fzf port")?;
    debug!("session"; "fzf listening on port {port}");
    Ok(0)
}
