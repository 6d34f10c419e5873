//! Command-line interface definitions.

use clap::{ArgGroup, ColorChoice, Parser};
use std::path::PathBuf;

use crate::session;

/// Text user interface for compilers and checkers.
///
/// Runs COMMAND, splits its output into diagnostics and browses them in fzf.
/// Edits to watched files re-run COMMAND automatically.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("role").args(["reload", "start", "message", "select", "format"])))]
pub struct Cli {
    /// Internal: wait for the session, then run COMMAND and print blocks
    #[arg(long)]
    pub reload: bool,

    /// Internal: report fzf's control port to the session
    #[arg(long)]
    pub start: bool,

    /// Internal: log an fzf event (RELOAD, LOAD, ZERO)
    #[arg(long, value_name = "EVENT")]
    pub message: Option<String>,

    /// Internal: open the editor at the location of a selected block
    #[arg(long, value_name = "SELECTION")]
    pub select: Option<String>,

    /// Run COMMAND and print marker-wrapped blocks for an enclosing session
    #[arg(long)]
    pub format: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: tuick.toml, searched upward)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Do not watch files for changes
    #[arg(long)]
    pub no_watch: bool,

    /// Parse output with this errorformat tool name
    #[arg(long, value_name = "NAME")]
    pub errorformat: Option<String>,

    /// Command to run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// What this invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role<'a> {
    /// Top-level session: run COMMAND and browse results in fzf.
    List,
    Reload,
    Start,
    Message(&'a str),
    Select(&'a str),
    Format,
}

impl Role<'_> {
    /// Roles that run COMMAND.
    pub const fn needs_command(&self) -> bool {
        matches!(self, Self::List | Self::Reload | Self::Format)
    }
}

impl Cli {
    /// Selected role; without a role flag, nested invocations format.
    pub fn role(&self) -> Role<'_> {
        self.role_in(session::in_session())
    }

    pub(crate) fn role_in(&self, in_session: bool) -> Role<'_> {
        if self.reload {
            Role::Reload
        } else if self.start {
            Role::Start
        } else if let Some(message) = &self.message {
            Role::Message(message)
        } else if let Some(selection) = &self.select {
            Role::Select(selection)
        } else if self.format || in_session {
            Role::Format
        } else {
            Role::List
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tuick").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_list_role_with_command() {
        let cli = parse(&["-v", "mypy", "--strict", "src"]);
        assert_eq!(cli.role_in(false), Role::List);
        assert!(cli.verbose);
        assert_eq!(cli.command, ["mypy", "--strict", "src"]);
    }

    #[test]
    fn test_command_after_separator() {
        let cli = parse(&["--reload", "--", "ruff", "check", "-v"]);
        assert_eq!(cli.role_in(false), Role::Reload);
        assert!(!cli.verbose);
        assert_eq!(cli.command, ["ruff", "check", "-v"]);
    }

    #[test]
    fn test_value_roles() {
        let cli = parse(&["--select", "a.py\x1f1\x1f\x1f\x1f\x1ftext"]);
        assert_eq!(cli.role_in(false), Role::Select("a.py\x1f1\x1f\x1f\x1f\x1ftext"));
        assert_eq!(parse(&["--message", "ZERO"]).role_in(true), Role::Message("ZERO"));
        assert_eq!(parse(&["--start"]).role_in(true), Role::Start);
    }

    #[test]
    fn test_nested_defaults_to_format() {
        let cli = parse(&["make", "check"]);
        assert_eq!(cli.role_in(true), Role::Format);
        assert!(cli.role_in(true).needs_command());
    }

    #[test]
    fn test_roles_are_exclusive() {
        assert!(Cli::try_parse_from(["tuick", "--reload", "--start"]).is_err());
        assert!(Cli::try_parse_from(["tuick", "--select", "x", "--message", "LOAD"]).is_err());
    }

    #[test]
    fn test_options() {
        let cli = parse(&["--no-watch", "--errorformat", "mypy", "-C", "x.toml", "mypy", "."]);
        assert!(cli.no_watch);
        assert_eq!(cli.errorformat.as_deref(), Some("mypy"));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert_eq!(cli.command, ["mypy", "."]);
    }
}
