//! Structured parsing through the external `errorformat` helper.
//!
//! Command output is fed to the helper with ANSI codes stripped, the JSONL
//! records it prints are optionally grouped, and each record's lines are
//! mapped back to the original colored text before wire encoding.

mod group;

use group::group_by_location;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};
use std::{
    io::{self, BufReader, Read, Write},
    path::Path,
    process::{Child, ChildStdout, ExitStatus, Stdio},
    sync::Arc,
    thread::{self, JoinHandle},
};
use thiserror::Error;

use crate::block::Block;
use crate::config::ErrorformatConfig;
use crate::debug;
use crate::utils::{ansi::strip_ansi, exec::Cmd, lines::Lines};

#[derive(Debug, Error)]
pub enum ErrorformatError {
    #[error(
        "`{0}` not found. Install with:\n  go install github.com/reviewdog/errorformat/cmd/errorformat@latest"
    )]
    NotFound(String),

    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` failed with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("I/O error while talking to `{program}`")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Records
// ============================================================================

/// One JSONL record printed by `errorformat -w=jsonl`.
///
/// Line and column numbers of 0 mean "unknown" and are read as `None`.
#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagnosticRecord {
    pub filename: String,
    #[serde(rename = "lnum", deserialize_with = "positive")]
    pub line: Option<u32>,
    #[serde(rename = "col", deserialize_with = "positive")]
    pub column: Option<u32>,
    #[serde(rename = "end_lnum", deserialize_with = "positive")]
    pub end_line: Option<u32>,
    #[serde(rename = "end_col", deserialize_with = "positive")]
    pub end_column: Option<u32>,
    pub lines: Vec<String>,
    pub text: String,
    #[serde(rename = "type", deserialize_with = "kind_tag")]
    pub kind: String,
    pub valid: bool,
}

fn positive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n > 0))
}

/// `type` is a Go rune: a number holding a character code, 0 when unset.
fn kind_tag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .and_then(char::from_u32)
            .filter(|&c| c != '\0')
            .map(String::from)
            .unwrap_or_default(),
        _ => String::new(),
    })
}

impl DiagnosticRecord {
    /// Parse one output line; blank and malformed lines give `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!("errorformat"; "skipping malformed record: {err}");
                None
            }
        }
    }

    /// Wire block for this record; end positions are never filled in.
    pub fn into_block(self) -> Block {
        Block::new(self.lines.join("\n")).at(self.filename, self.line, self.column)
    }
}

// ============================================================================
// Tool selection
// ============================================================================

/// Helper arguments selected for the current command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFormat {
    pub name: String,
    pub args: Vec<String>,
    pub group: bool,
}

/// Tool name of a command: the file name of its program.
pub fn detect_tool<S: AsRef<str>>(command: &[S]) -> Option<String> {
    let program = command.first()?.as_ref();
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

impl ToolFormat {
    /// Pick the structured path for `command`, if any.
    ///
    /// A name forced on the command line uses its `[errorformat.tools]` entry
    /// when there is one, or the helper's builtin format of that name.
    /// Otherwise only tools registered in the config are parsed.
    pub fn resolve<S: AsRef<str>>(
        config: &ErrorformatConfig,
        forced: Option<&str>,
        command: &[S],
    ) -> Option<Self> {
        let name = match forced {
            Some(name) => name.to_string(),
            None => detect_tool(command)?,
        };
        match config.tools.get(&name) {
            Some(tool) => Some(Self {
                args: tool.args.clone(),
                group: tool.group,
                name,
            }),
            None if forced.is_some() => Some(Self {
                args: vec![format!("-name={name}")],
                // mypy reports notes as separate records
                group: name == "mypy",
                name,
            }),
            None => None,
        }
    }
}

// ============================================================================
// Streaming run
// ============================================================================

type LineMap = Arc<Mutex<FxHashMap<String, String>>>;

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Lazy wire-chunk iterator over a running `errorformat` process.
///
/// A non-zero helper exit is reported as a final `Err` item.
pub struct ErrorformatBlocks {
    program: String,
    child: Child,
    records: Box<dyn Iterator<Item = DiagnosticRecord> + Send>,
    originals: LineMap,
    feeder: Option<JoinHandle<io::Result<()>>>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
}

impl ErrorformatBlocks {
    /// Start the helper and feed it `lines` from a background thread.
    pub fn spawn<I>(binary: &str, format: &ToolFormat, lines: I) -> Result<Self, ErrorformatError>
    where
        I: Iterator<Item = String> + Send + 'static,
    {
        let program = binary.to_string();
        let path = which::which(binary).map_err(|_| ErrorformatError::NotFound(program.clone()))?;

        let cmd = Cmd::new(&path).arg("-w=jsonl").args(&format.args);
        debug!("errorformat"; "{}", cmd.display());
        let mut child = cmd
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ErrorformatError::Spawn {
                program: program.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ErrorformatError::Spawn {
                program,
                source: io::Error::other("missing stdio pipes"),
            });
        };

        let originals = LineMap::default();
        let feeder = thread::spawn({
            let originals = Arc::clone(&originals);
            move || feed(stdin, lines, &originals)
        });
        let stderr = thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        });

        Ok(Self {
            program,
            child,
            records: parse_records(stdout, format.group),
            originals,
            feeder: Some(feeder),
            stderr: Some(stderr),
            finished: false,
        })
    }

    /// Replace each record line with the colored line it was stripped from.
    fn restore(&self, mut record: DiagnosticRecord) -> DiagnosticRecord {
        let originals = self.originals.lock();
        for line in &mut record.lines {
            if let Some(original) = originals.get(line.as_str()) {
                line.clone_from(original);
            }
        }
        record
    }

    fn finish(&mut self) -> Result<(), ErrorformatError> {
        let program = self.program.clone();
        let io_error = |source: io::Error| ErrorformatError::Io {
            program: program.clone(),
            source,
        };

        let status = self.child.wait().map_err(io_error)?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ErrorformatError::Failed {
                program: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            debug!("errorformat"; "{}", stderr.trim());
        }

        match self.feeder.take().map(JoinHandle::join) {
            Some(Ok(Err(err))) => Err(io_error(err)),
            Some(Err(_)) => Err(io_error(io::Error::other("input thread panicked"))),
            _ => Ok(()),
        }
    }
}

impl Iterator for ErrorformatBlocks {
    type Item = Result<String, ErrorformatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(record) = self.records.next() {
            return Some(Ok(self.restore(record).into_block().encode()));
        }
        self.finished = true;
        self.finish().err().map(Err)
    }
}

impl Drop for ErrorformatBlocks {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn parse_records(
    stdout: ChildStdout,
    group: bool,
) -> Box<dyn Iterator<Item = DiagnosticRecord> + Send> {
    let records = Lines::new(BufReader::new(stdout)).filter_map(|line| DiagnosticRecord::parse(&line));
    if group {
        Box::new(group_by_location(records))
    } else {
        Box::new(records)
    }
}

/// Write stripped lines to the helper, remembering their colored originals.
fn feed<W, I>(mut stdin: W, lines: I, originals: &Mutex<FxHashMap<String, String>>) -> io::Result<()>
where
    W: Write,
    I: Iterator<Item = String>,
{
    for line in lines {
        let stripped = strip_ansi(&line);
        originals
            .lock()
            .insert(trim_eol(&stripped).to_string(), trim_eol(&line).to_string());
        match stdin.write_all(stripped.as_bytes()) {
            // The helper exited early; its status tells why.
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => break,
            result => result?,
        }
    }
    stdin.flush().or_else(|err| match err.kind() {
        io::ErrorKind::BrokenPipe => Ok(()),
        _ => Err(err),
    })
}
