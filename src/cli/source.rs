//! Running COMMAND and turning its output into wire chunks.

use anyhow::{Context, Result, bail};
use std::{
    io::{self, Write},
    process::Child,
};

use crate::block::MixedBlocks;
use crate::config::TuickConfig;
use crate::debug;
use crate::errorformat::{ErrorformatBlocks, ToolFormat};
use crate::utils::exec::Cmd;

/// Lazy sequence of wire-encoded chunks.
pub type Chunks = Box<dyn Iterator<Item = Result<String>> + Send>;

/// Spawn COMMAND and pick the block producer for it.
///
/// Commands handled by a registered or forced errorformat tool go through the
/// helper. Everything else is segmented heuristically, with nested
/// marker-wrapped streams passed through.
pub fn command_blocks(
    command: &[String],
    envs: &[(&str, &str)],
    config: &TuickConfig,
    forced: Option<&str>,
) -> Result<(Child, Chunks)> {
    if command.is_empty() {
        bail!("no command given");
    }

    let cmd = Cmd::from_slice(command)
        .env("FORCE_COLOR", "1")
        .envs(envs.iter().copied());
    debug!("$"; "{}", cmd.display());
    let (mut child, lines) = cmd.spawn_merged()?.into_lines();

    let Some(format) = ToolFormat::resolve(&config.errorformat, forced, command) else {
        return Ok((child, Box::new(MixedBlocks::new(lines).map(Ok))));
    };

    debug!("errorformat"; "parsing output as `{}`", format.name);
    match ErrorformatBlocks::spawn(&config.errorformat.binary, &format, lines) {
        Ok(blocks) => Ok((child, Box::new(blocks.map(|chunk| chunk.map_err(Into::into))))),
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(err.into())
        }
    }
}

/// Write chunks to `out`, flushing each one so the reader sees it at once.
///
/// A closed reader ends streaming quietly: fzf may exit before the command
/// does.
pub fn stream_chunks<W, I>(out: &mut W, chunks: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Result<String>>,
{
    for chunk in chunks {
        let chunk = chunk?;
        match out.write_all(chunk.as_bytes()).and_then(|()| out.flush()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!("stream"; "reader closed the pipe");
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to write blocks"),
        }
    }
    Ok(())
}
