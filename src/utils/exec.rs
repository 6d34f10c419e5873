//! External command execution utilities.
//!
//! Provides a Builder-based API for spawning the checked command, the
//! errorformat helper, fzf and the file watcher.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // User command, stdout and stderr merged into one pipe
//! let running = Cmd::from_slice(&["mypy", "src/"])
//!     .env("FORCE_COLOR", "1")
//!     .spawn_merged()?;
//!
//! // Command with custom stdio
//! let child = Cmd::new("fzf").args(["--read0"]).command().stdin(Stdio::piped()).spawn()?;
//! ```

use anyhow::{Context, Result};
use std::{
    ffi::{OsStr, OsString},
    io::{BufReader, PipeReader},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use super::lines::Lines;
use super::shell::quote_command;

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Debug, Clone, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["mypy", "src/"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set one environment variable for the subprocess.
    pub fn env<K: AsRef<OsStr>, V: AsRef<OsStr>>(mut self, key: K, value: V) -> Self {
        self.envs
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self = self.env(k, v);
        }
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Shell-quoted command line, for verbose output.
    pub fn display(&self) -> String {
        let words: Vec<String> = std::iter::once(&self.program)
            .chain(&self.args)
            .map(|w| w.to_string_lossy().to_string())
            .collect();
        quote_command(words)
    }

    /// Build the underlying `std::process::Command`.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Spawn with stdout and stderr merged into a single pipe.
    ///
    /// Tools interleave errors on both streams; reading one pipe keeps their
    /// relative order.
    pub fn spawn_merged(self) -> Result<MergedChild> {
        let name = self.program_name();
        let (reader, writer) = std::io::pipe().context("Failed to create output pipe")?;
        let writer_err = writer
            .try_clone()
            .context("Failed to duplicate output pipe")?;

        // The Command holds the write ends; drop it right after spawning so
        // the reader sees EOF when the child exits.
        let child = {
            let mut cmd = self.command();
            cmd.stdin(Stdio::null())
                .stdout(Stdio::from(writer))
                .stderr(Stdio::from(writer_err));
            cmd.spawn()
                .with_context(|| format!("Failed to execute `{name}`"))?
        };

        Ok(MergedChild {
            child,
            output: reader,
        })
    }
}

/// A running child whose stdout and stderr share one pipe.
pub struct MergedChild {
    pub child: Child,
    pub output: PipeReader,
}

impl MergedChild {
    /// Split into the child handle and a lossy line reader over its output.
    pub fn into_lines(self) -> (Child, Lines<BufReader<PipeReader>>) {
        (self.child, Lines::new(BufReader::new(self.output)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::new("echo")
            .arg("hello")
            .args(["world", "!"])
            .cwd("/tmp");

        assert_eq!(cmd.program, OsString::from("echo"));
        assert_eq!(cmd.args.len(), 3);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_empty_args_kept() {
        let cmd = Cmd::from_slice(&["grep", ""]);
        assert_eq!(cmd.args, [OsString::new()]);
        assert_eq!(cmd.display(), "grep ''");
    }

    #[test]
    fn test_display_quotes() {
        let cmd = Cmd::new("sh").args(["-c", "echo hi"]);
        assert_eq!(cmd.display(), "sh -c 'echo hi'");
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_merged_collects_both_streams() {
        let running = Cmd::new("sh")
            .args(["-c", "echo out; echo err >&2; echo out2"])
            .spawn_merged()
            .unwrap();
        let (mut child, lines) = running.into_lines();
        let lines: Vec<String> = lines.collect();
        child.wait().unwrap();

        assert_eq!(lines, ["out\n", "err\n", "out2\n"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_merged_env() {
        let running = Cmd::new("sh")
            .args(["-c", "echo $TUICK_TEST_VALUE"])
            .env("TUICK_TEST_VALUE", "42")
            .spawn_merged()
            .unwrap();
        let (mut child, lines) = running.into_lines();
        assert_eq!(lines.collect::<Vec<_>>(), ["42\n"]);
        child.wait().unwrap();
    }

    #[test]
    fn test_spawn_missing_program() {
        let err = Cmd::new("definitely-not-a-real-program-xyz")
            .spawn_merged()
            .err()
            .unwrap();
        assert!(err.to_string().contains("definitely-not-a-real-program-xyz"));
    }
}
