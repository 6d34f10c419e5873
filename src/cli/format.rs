//! Format role: blocks for an enclosing session.
//!
//! Output is wrapped between start and end markers so the outer session's
//! segmenter passes it through untouched.

use anyhow::{Context, Result};
use std::io::{Write, stdout};

use super::Cli;
use super::source::{command_blocks, stream_chunks};
use crate::block::wrap_with_markers;
use crate::config::TuickConfig;
use crate::debug;

pub fn run(cli: &Cli, config: &TuickConfig) -> Result<i32> {
    let (mut child, chunks) = command_blocks(&cli.command, &[], config, cli.errorformat.as_deref())?;
    let mut out = stdout().lock();
    let streamed = write_wrapped(&mut out, chunks);

    let status = child.wait().context("Failed to wait for command")?;
    debug!("format"; "command exited with {status}");
    streamed?;
    Ok(status.code().unwrap_or(1))
}

/// Write `chunks` between markers. A failing source still gets its end
/// marker, so the outer session does not stay inside the span.
fn write_wrapped<W, I>(out: &mut W, chunks: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Result<String>>,
{
    let mut failure = None;
    let chunks = chunks.into_iter().map_while(|chunk| match chunk {
        Ok(chunk) => Some(chunk),
        Err(err) => {
            failure = Some(err);
            None
        }
    });
    stream_chunks(out, wrap_with_markers(chunks).map(Ok))?;
    failure.map_or(Ok(()), Err)
}
