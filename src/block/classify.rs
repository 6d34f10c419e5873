//! Line classification for heuristic segmentation.
//!
//! Tools are treated as opaque text. Only generic positional conventions are
//! recognized:
//!
//! ```text
//! src/app.py:12: error: ...        Location (path:line)
//! src/app.py:12:5: error: ...      Location (path:line:col)
//! src/app.py: note: In function    Note (no line number)
//! Found 3 errors in 1 file         Summary
//! ======== / ________ / _ _ _ _    Separator
//! ```
//!
//! Classification runs on ANSI-stripped text.

use regex::Regex;
use std::sync::LazyLock;

use crate::utils::ansi::strip_ansi;

/// `path:line[:col][:end_line:end_col]: message`, path has no colon and
/// is not indented.
const LOCATION_PATTERN: &str = r"^([^\s:][^:]*):(\d+)(?::(\d+))?(?::\d+:\d+)?: .+";

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LOCATION_PATTERN).expect("valid location regex"));

static NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s:][^:]*?) *: note: ").expect("valid note regex"));

static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Found \d+ error").expect("valid summary regex"));

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:={3,}|_{3,}|_ (?:_ )+_)").expect("valid separator regex"));

/// A `path:line[:col]` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub line: u32,
    pub column: Option<u32>,
}

/// What a single output line means for block boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty line: hard boundary, resets all state.
    Blank,
    /// `path: note: ...` context line without a line number.
    Note { path: String },
    /// `path:line[:col]: message` line.
    Location(Location),
    /// `Found N errors ...` summary.
    Summary,
    /// `===`, `___` or `_ _ _` separator.
    Separator,
    /// Anything else: continuation of the current block.
    Text,
}

/// Classify one line (without its terminator).
pub fn classify(line: &str) -> LineKind {
    let plain = strip_ansi(line);
    let plain = plain.as_ref();

    if plain.is_empty() {
        return LineKind::Blank;
    }

    if let Some(caps) = NOTE_RE.captures(plain) {
        return LineKind::Note {
            path: caps[1].to_string(),
        };
    }

    if let Some(location) = LOCATION_RE.captures(plain).and_then(|caps| {
        Some(Location {
            path: caps[1].to_string(),
            line: caps[2].parse().ok()?,
            column: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        })
    }) {
        return LineKind::Location(location);
    }

    if SUMMARY_RE.is_match(plain) {
        LineKind::Summary
    } else if SEPARATOR_RE.is_match(plain) {
        LineKind::Separator
    } else {
        LineKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(path: &str, line: u32, column: Option<u32>) -> LineKind {
        LineKind::Location(Location {
            path: path.into(),
            line,
            column,
        })
    }

    #[test]
    fn test_location_lines() {
        assert_eq!(classify("a.py:1: error: x"), loc("a.py", 1, None));
        assert_eq!(classify("src/m.rs:10:5: warning: y"), loc("src/m.rs", 10, Some(5)));
        assert_eq!(
            classify("my file.py:3:1:3:9: error: span"),
            loc("my file.py", 3, Some(1))
        );
    }

    #[test]
    fn test_location_requires_message() {
        assert_eq!(classify("a.py:1:"), LineKind::Text);
        assert_eq!(classify("a.py:1: "), LineKind::Text);
    }

    #[test]
    fn test_indented_path_is_text() {
        assert_eq!(classify("    a.py:1: error: x"), LineKind::Text);
    }

    #[test]
    fn test_note_line() {
        assert_eq!(
            classify("src/a.py: note: In function \"f\":"),
            LineKind::Note {
                path: "src/a.py".into()
            }
        );
        assert_eq!(
            classify("src/a.py  : note: spaced"),
            LineKind::Note {
                path: "src/a.py".into()
            }
        );
        // A note with a line number is a location
        assert_eq!(classify("a.py:3: note: see"), loc("a.py", 3, None));
    }

    #[test]
    fn test_summary_and_separators() {
        assert_eq!(classify("Found 12 errors in 3 files"), LineKind::Summary);
        assert_eq!(classify("Found 1 error"), LineKind::Summary);
        assert_eq!(classify("===== test session starts ====="), LineKind::Separator);
        assert_eq!(classify("________ test_foo ________"), LineKind::Separator);
        assert_eq!(classify("_ _ _ _ _ _"), LineKind::Separator);
        assert_eq!(classify("=="), LineKind::Text);
    }

    #[test]
    fn test_blank_and_ansi() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("\x1b[0m"), LineKind::Blank);
        assert_eq!(
            classify("\x1b[1ma.py\x1b[0m:2: \x1b[31merror\x1b[0m: bad"),
            loc("a.py", 2, None)
        );
    }
}
