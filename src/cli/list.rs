//! List role: the top-level session.
//!
//! ```text
//! tuick mypy .
//!   ├── ReloadServer      accept loop thread, owns reload ordering
//!   ├── MonitorThread     watcher output → POST reload to fzf
//!   ├── mypy .            first run, output segmented on this thread
//!   └── fzf               spawns tuick --reload/--select/--start/--message
//! ```

use anyhow::{Context, Result, bail};
use std::{
    env,
    iter,
    process::{Child, ExitStatus, Stdio},
    sync::Arc,
};

use super::Cli;
use super::source::{Chunks, command_blocks, stream_chunks};
use crate::config::TuickConfig;
use crate::fzf::{self, Callbacks};
use crate::logger::{LOG_FILE_ENV, SessionLog};
use crate::monitor::{FzfNotifier, MonitorError, MonitorThread};
use crate::session::{
    self, API_KEY_ENV, CommandSlot, FZF_API_KEY_ENV, PORT_ENV, PortLatch, ReloadServer,
    signal::is_interrupted,
};
use crate::utils::shell::quote_command;
use crate::{debug, log};

pub fn run(cli: &Cli, config: &TuickConfig, session_log: &SessionLog) -> Result<i32> {
    let argv0 = env::args().next().unwrap_or_else(|| "tuick".into());
    let myself = fzf::self_command(&argv0);
    let callbacks = Callbacks::new(&myself, cli.verbose, &cli.command);
    let header = quote_command(&cli.command);

    let slot = Arc::new(CommandSlot::new());
    let latch = Arc::new(PortLatch::new());
    let mut server = ReloadServer::start(session::new_api_key(), Arc::clone(&slot), Arc::clone(&latch))
        .context("Failed to start reload server")?;
    debug!("session"; "reload server on port {}", server.port());

    let fzf_api_key = session::new_api_key();
    let mut monitor = start_monitor(config, &fzf_api_key, &callbacks.reload, &latch);

    let result = drive(cli, config, session_log, &server, &slot, &fzf_api_key, &callbacks, &header);

    if let Some(monitor) = monitor.as_mut() {
        monitor.stop();
    }
    server.shutdown();
    match slot.terminate_and_wait() {
        Ok(Some(status)) => debug!("session"; "command exited with {status}"),
        Ok(None) => {}
        Err(err) => debug!("session"; "failed to stop command: {err}"),
    }
    result
}

/// Start the monitor unless disabled; a missing watcher only disables it.
fn start_monitor(
    config: &TuickConfig,
    api_key: &str,
    reload_command: &str,
    latch: &Arc<PortLatch>,
) -> Option<MonitorThread> {
    if !config.watch.enable {
        log!("warn"; "file watching disabled");
        return None;
    }
    let started = env::current_dir()
        .map_err(MonitorError::from)
        .and_then(|dir| {
            let notifier = FzfNotifier::new(api_key, reload_command, config.watch.notify_timeout())?;
            MonitorThread::start(&config.watch, &dir, notifier, Arc::clone(latch))
        });
    match started {
        Ok(monitor) => Some(monitor),
        Err(err) => {
            log!("warn"; "{err}");
            None
        }
    }
}

/// First run and the fzf lifetime; cleanup is left to the caller.
#[allow(clippy::too_many_arguments)]
fn drive(
    cli: &Cli,
    config: &TuickConfig,
    session_log: &SessionLog,
    server: &ReloadServer,
    slot: &CommandSlot,
    fzf_api_key: &str,
    callbacks: &Callbacks,
    header: &str,
) -> Result<i32> {
    let port = server.port().to_string();
    let log_path = session_log.path().to_string_lossy().into_owned();
    let envs = [
        (PORT_ENV, port.as_str()),
        (API_KEY_ENV, server.api_key()),
        (FZF_API_KEY_ENV, fzf_api_key),
        (LOG_FILE_ENV, log_path.as_str()),
    ];

    let (child, mut chunks) = command_blocks(&cli.command, &envs, config, cli.errorformat.as_deref())?;
    let pid = child.id();
    slot.register(child);

    let first = match chunks.next().transpose()? {
        Some(first) => first,
        None => {
            debug!("session"; "no output from command (pid {pid})");
            return Ok(0);
        }
    };
    if is_interrupted() {
        return Ok(0);
    }

    let bindings = fzf::bindings(callbacks, header, cli.verbose);
    let cmd = fzf::command(&config.fzf, &bindings).envs(envs);
    debug!("fzf"; "{}", cmd.display());
    let status = run_fzf(cmd.command().stdin(Stdio::piped()).spawn(), first, chunks)
        .with_context(|| format!("Failed to run `{}`", config.fzf.binary))?;
    debug!("fzf"; "exited with {status}");
    Ok(fzf::exit_code(status))
}

/// Feed fzf the first chunk and the rest of the stream, then wait for it.
fn run_fzf(spawned: std::io::Result<Child>, first: String, rest: Chunks) -> Result<ExitStatus> {
    let mut process = spawned?;
    let Some(mut stdin) = process.stdin.take() else {
        let _ = process.kill();
        let _ = process.wait();
        bail!("fzf input not captured");
    };

    if let Err(err) = stream_chunks(&mut stdin, iter::once(Ok(first)).chain(rest)) {
        log!("error"; "{err:#}");
    }
    // Close fzf's input so it knows the list is complete
    drop(stdin);

    Ok(process.wait()?)
}
