//! fzf invocation: callback commands, key bindings and exit codes.
//!
//! fzf drives the session by running tuick again in child roles:
//!
//! | Event          | Action                                          |
//! |----------------|-------------------------------------------------|
//! | `start`        | "Running..." header, `tuick --start`            |
//! | `load`         | plain header                                    |
//! | `enter,right`  | `tuick --select {}`                             |
//! | `r`            | "Running..." header, reload with `tuick --reload`|
//! | `q`, `zero`    | abort                                           |
//! | `space`/`backspace` | move down/up                               |

use std::{path::Path, process::ExitStatus};

use crate::block::FIELD_SEP;
use crate::config::FzfConfig;
use crate::utils::{exec::Cmd, shell::quote_command};

/// fzf exit code when the user aborts with Ctrl+C or Esc.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Shell commands fzf runs to call back into tuick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callbacks {
    pub reload: String,
    pub select: String,
    pub start: String,
    pub message: String,
}

impl Callbacks {
    pub fn new<S: AsRef<str>>(myself: &str, verbose: bool, command: &[S]) -> Self {
        let verbose_flag: &[&str] = if verbose { &["-v"] } else { &[] };
        let role = |flag: &'static str| {
            let mut words = vec![myself];
            words.extend_from_slice(verbose_flag);
            words.push(flag);
            words
        };

        let mut reload = role("--reload");
        reload.push("--");
        reload.extend(command.iter().map(|word| word.as_ref()));

        Self {
            reload: quote_command(reload),
            select: quote_command(role("--select")),
            start: quote_command(role("--start")),
            message: quote_command([myself, "--message"]),
        }
    }
}

/// How child roles should invoke this program.
///
/// Shortened to the bare file name when that resolves to the same executable
/// through `PATH`, which keeps the bindings readable in verbose output.
pub fn self_command(argv0: &str) -> String {
    let path = Path::new(argv0);
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return argv0.to_string();
    };
    let same = which::which(name)
        .ok()
        .and_then(|found| found.canonicalize().ok())
        .zip(path.canonicalize().ok())
        .is_some_and(|(found, given)| found == given);
    if same { name.to_string() } else { argv0.to_string() }
}

/// Key bindings for one session.
pub fn bindings(callbacks: &Callbacks, header: &str, verbose: bool) -> Vec<String> {
    let running_header = format!("{header} Running...");
    let verbose_hook = |event: &str, message: &str, plus: bool| {
        verbose.then(|| {
            let plus = if plus { "+" } else { "" };
            format!("{event}:{plus}execute-silent({} {message})", callbacks.message)
        })
    };

    let mut bindings = vec![
        format!("start:change-header({running_header})"),
        format!("start:+execute-silent({})", callbacks.start),
        format!("load:change-header({header})"),
    ];
    bindings.extend(verbose_hook("load", "LOAD", true));
    bindings.push(format!("enter,right:execute({} {{}})", callbacks.select));
    bindings.push(format!("r:change-header({running_header})"));
    bindings.extend(verbose_hook("r", "RELOAD", true));
    bindings.push(format!("r:+reload({})", callbacks.reload));
    bindings.push("q:abort".into());
    bindings.extend(verbose_hook("zero", "ZERO", false));
    bindings.push("zero:+abort".into());
    bindings.push("space:down".into());
    bindings.push("backspace:up".into());
    bindings
}

/// The fzf command reading NUL-terminated blocks from stdin.
///
/// Records are split on the field separator and only the text field is shown;
/// `{}` in bindings still expands to the whole record.
pub fn command(config: &FzfConfig, bindings: &[String]) -> Cmd {
    Cmd::new(&config.binary)
        .args([
            "--listen",
            "--read0",
            "--track",
            "--no-sort",
            "--reverse",
            "--header-border",
            "--ansi",
            "--color=dark",
            "--highlight-line",
            "--wrap",
            "--disabled",
            "--no-input",
        ])
        .arg(format!("--delimiter={FIELD_SEP}"))
        .arg("--with-nth=6..")
        .arg("--bind")
        .arg(bindings.join(","))
        .args(&config.args)
}

/// Session exit code for an fzf exit status.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(0) | Some(EXIT_INTERRUPTED) => 0,
        Some(code) => code,
        // Killed by a signal
        None => 1,
    }
}
