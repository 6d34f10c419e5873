//! Tuick - a text user interface for compilers and checkers.

mod block;
mod cli;
mod config;
mod errorformat;
mod fzf;
mod logger;
mod monitor;
mod session;
mod utils;

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser};
use cli::{Cli, Role};
use config::TuickConfig;
use logger::SessionLog;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Dropped last: the top-level role replays the log after fzf is gone
    let session_log = match SessionLog::setup() {
        Ok(session_log) => session_log,
        Err(err) => {
            log!("error"; "failed to open session log: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &session_log) {
        Ok(code) => exit_code(code),
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, session_log: &SessionLog) -> Result<i32> {
    let role = cli.role();
    if role.needs_command() && cli.command.is_empty() {
        bail!("No command given. Usage: tuick [OPTIONS] -- COMMAND...");
    }
    debug!("tuick"; "{role:?}");

    let config = || TuickConfig::load(cli);
    match role {
        Role::List => {
            session::signal::setup_interrupt_handler()?;
            cli::list::run(cli, &config()?, session_log)
        }
        Role::Reload => cli::reload::run(cli, &config()?),
        Role::Format => cli::format::run(cli, &config()?),
        Role::Select(selection) => cli::select::run(selection, &config()?),
        Role::Start => cli::start::run(),
        Role::Message(message) => Ok(cli::message::run(message)),
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
