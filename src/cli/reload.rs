//! Reload role: rerun COMMAND on fzf's request.
//!
//! The session server must confirm that the previous run is gone before this
//! process starts its own, so two runs never write to fzf at once.

use anyhow::{Context, Result};
use std::io::stdout;

use super::Cli;
use super::source::{command_blocks, stream_chunks};
use crate::config::TuickConfig;
use crate::debug;
use crate::session::SessionEnv;

pub fn run(cli: &Cli, config: &TuickConfig) -> Result<i32> {
    let session = SessionEnv::from_env()?;
    session
        .request("reload", "go")
        .context("Session server refused the reload")?;
    debug!("reload"; "previous run finished, starting {}", cli.command.join(" "));

    let (mut child, chunks) = command_blocks(&cli.command, &[], config, cli.errorformat.as_deref())?;
    let streamed = stream_chunks(&mut stdout().lock(), chunks);

    // Output reader is gone by now, an abandoned command gets SIGPIPE
    let status = child.wait().context("Failed to wait for command")?;
    debug!("reload"; "command exited with {status}");

    streamed.map(|()| 0)
}
