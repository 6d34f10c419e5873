//! Logging utilities with colored output and a shared session log file.
//!
//! This module provides:
//! - `log!` macro for formatted output with colored prefixes
//! - `debug!` macro for verbose-only output
//! - `SessionLog` for routing every role's output through one log file
//!
//! The top-level role owns the terminal only until fzf starts. After that,
//! every role fzf spawns (reload, start, select, message) would scribble over
//! the fzf screen if it wrote to stderr. Instead, all roles append to the file
//! named by `TUICK_LOG_FILE`, and the top-level role copies that file to stderr
//! when the session ends.
//!
//! # Example
//!
//! ```ignore
//! log!("reload"; "server listening on port {}", port);
//! debug!("monitor"; "POST {}", url);
//! ```

use owo_colors::{OwoColorize, Stream};
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write, stderr},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};
use tempfile::NamedTempFile;

/// Environment variable naming the shared session log file.
pub const LOG_FILE_ENV: &str = "TUICK_LOG_FILE";

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Log file sink. `None` means stderr.
static SINK: Mutex<Option<File>> = Mutex::new(None);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let line = format!("{prefix} {message}\n");

    let mut sink = SINK.lock();
    match sink.as_mut() {
        Some(file) => {
            file.write_all(line.as_bytes()).ok();
            file.flush().ok();
        }
        None => {
            let mut stderr = stderr().lock();
            stderr.write_all(line.as_bytes()).ok();
            stderr.flush().ok();
        }
    }
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    let paint: fn(&String) -> String = match module_lower {
        "error" => |p| p.bright_red().bold().to_string(),
        "warn" => |p| p.yellow().bold().to_string(),
        "monitor" => |p| p.bright_green().bold().to_string(),
        "reload" | "session" => |p| p.bright_blue().bold().to_string(),
        "$" | ">" => |p| p.bright_white().bold().to_string(),
        _ => |p| p.bright_yellow().bold().to_string(),
    };
    prefix.if_supports_color(Stream::Stderr, paint).to_string()
}

// ============================================================================
// Session Log File
// ============================================================================

/// Where the current process sends its log lines.
///
/// Dropping the owner of a top-level log copies the collected log to stderr.
pub enum SessionLog {
    /// Top-level role: created the file, replays it on drop.
    Owner(NamedTempFile),
    /// Child role: appends to a file created by the top-level role.
    Child(PathBuf),
}

impl SessionLog {
    /// Attach to the session log named in the environment, or create one.
    pub fn setup() -> io::Result<Self> {
        match std::env::var_os(LOG_FILE_ENV) {
            Some(path) if !path.is_empty() => Self::attach(Path::new(&path)),
            _ => Self::create(),
        }
    }

    /// Create a fresh temporary log file and route logging to it.
    pub fn create() -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("tuick-")
            .suffix(".log")
            .tempfile()?;
        // Append mode: child roles write to the same file concurrently
        let sink = OpenOptions::new().append(true).open(file.path())?;
        *SINK.lock() = Some(sink);
        Ok(Self::Owner(file))
    }

    /// Append to an existing session log file.
    pub fn attach(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        *SINK.lock() = Some(file);
        Ok(Self::Child(path.to_path_buf()))
    }

    /// Path to export as `TUICK_LOG_FILE` for child processes.
    pub fn path(&self) -> &Path {
        match self {
            Self::Owner(file) => file.path(),
            Self::Child(path) => path,
        }
    }

    /// Copy everything logged so far to `out`.
    fn replay(file: &mut NamedTempFile, out: &mut impl Write) -> io::Result<()> {
        let handle = file.as_file_mut();
        handle.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        handle.read_to_end(&mut buf)?;
        out.write_all(&buf)?;
        out.flush()
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        // Stop writing to the file before it disappears
        SINK.lock().take();

        if let Self::Owner(file) = self {
            let _ = Self::replay(file, &mut stderr().lock());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
