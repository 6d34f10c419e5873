//! File location extraction from a selected block.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use super::classify::{LineKind, classify};
use super::{Block, FIELD_SEP};
use crate::utils::ansi::strip_ansi;

/// Arrow marker used by rust-style renderers: `  --> src/lib.rs:3:5`
static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ *--> ([^:\n]+):(\d+):(\d+)$").expect("valid arrow regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no file location found in {0:?}")]
pub struct LocationNotFound(pub String);

/// File location with optional line and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub path: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Extract the location of a selection passed back by fzf.
///
/// A wire-encoded block carries its location in its fields. Plain text is
/// searched for a `path:line[:col]: message` line, or an arrow marker when the
/// selection spans several lines.
pub fn get_location(selection: &str) -> Result<FileLocation, LocationNotFound> {
    if selection.contains(FIELD_SEP)
        && let Ok(block) = Block::decode(selection)
    {
        if !block.path.is_empty() {
            return Ok(FileLocation {
                path: block.path,
                line: block.line,
                column: block.column,
            });
        }
        return search_text(&block.text).ok_or_else(|| LocationNotFound(selection.to_string()));
    }

    search_text(selection).ok_or_else(|| LocationNotFound(selection.to_string()))
}

fn search_text(text: &str) -> Option<FileLocation> {
    let plain = strip_ansi(text);

    if plain.contains('\n')
        && let Some(caps) = ARROW_RE.captures(&plain)
    {
        return Some(FileLocation {
            path: caps[1].to_string(),
            line: caps[2].parse().ok(),
            column: caps[3].parse().ok(),
        });
    }

    plain.lines().find_map(|line| match classify(line) {
        LineKind::Location(location) => Some(FileLocation {
            path: location.path,
            line: Some(location.line),
            column: location.column,
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(path: &str, line: Option<u32>, column: Option<u32>) -> FileLocation {
        FileLocation {
            path: path.into(),
            line,
            column,
        }
    }

    #[test]
    fn test_location_from_wire_block() {
        let record = Block::new("whatever").at("src/a.py", Some(10), Some(5)).encode();
        assert_eq!(
            get_location(&record),
            Ok(location("src/a.py", Some(10), Some(5)))
        );
    }

    #[test]
    fn test_location_from_plain_line() {
        assert_eq!(
            get_location("src/test.py:10:5: error: Test"),
            Ok(location("src/test.py", Some(10), Some(5)))
        );
    }

    #[test]
    fn test_location_from_arrow_marker() {
        let text = "error[E0308]: mismatched types\n  --> src/main.rs:4:18\n   |";
        assert_eq!(
            get_location(text),
            Ok(location("src/main.rs", Some(4), Some(18)))
        );
    }

    #[test]
    fn test_context_block_falls_back_to_text() {
        let record = Block::new("note\nb.py:7: error: x").encode();
        assert_eq!(get_location(&record), Ok(location("b.py", Some(7), None)));
    }

    #[test]
    fn test_location_never_spans_lines() {
        let record = Block::new("===== FAILURES =====\n    at x.py:3: in f").encode();
        assert!(get_location(&record).is_err());

        let text = "===== FAILURES =====\nx.py:3: in f";
        assert_eq!(get_location(text), Ok(location("x.py", Some(3), None)));
    }

    #[test]
    fn test_no_location() {
        assert!(get_location("plain text without location").is_err());
    }
}
