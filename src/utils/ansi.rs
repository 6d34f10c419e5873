//! ANSI escape sequence handling.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// CSI sequences (colors, cursor movement) and OSC sequences (hyperlinks).
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
        .expect("valid ansi regex")
});

/// Strip ANSI escape codes from string.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    ANSI_RE.replace_all(s, "")
}
