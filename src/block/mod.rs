//! Diagnostic blocks and their wire format.
//!
//! A block is one displayable diagnostic unit sent to fzf. On the wire it is
//! six fields separated by ASCII Unit Separator, terminated by NUL:
//!
//! ```text
//! path US line US column US end_line US end_column US text NUL
//! ```
//!
//! Numbers are decimal, absent values are empty fields. `text` may span
//! several lines. fzf reads the stream with `--read0` and displays field 6.
//!
//! # Modules
//!
//! - `classify` - Line classification (note, location, summary, separator)
//! - `segment` - Heuristic segmentation of raw tool output into blocks
//! - `markers` - Start/end markers for pre-formatted nested block streams
//! - `mixed` - Raw output interleaved with marker-wrapped block streams
//! - `location` - File location extraction from a selected block

pub mod classify;
pub mod location;
pub mod markers;
pub mod mixed;
pub mod segment;

#[cfg(test)]
mod tests;

pub use location::{FileLocation, get_location};
pub use markers::wrap_with_markers;
pub use mixed::MixedBlocks;
pub use segment::Segmenter;
#[cfg(test)]
pub use segment::split_blocks;

use std::fmt::Write as _;
use thiserror::Error;

/// Separates the fields of a block.
pub const FIELD_SEP: char = '\x1f';

/// Terminates a block.
pub const BLOCK_END: char = '\0';

/// Number of fields in an encoded block.
const FIELD_COUNT: usize = 6;

/// Wire decoding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("expected {FIELD_COUNT} fields, found {0}")]
    MissingFields(usize),

    #[error("invalid {field} field: `{value}`")]
    InvalidNumber { field: &'static str, value: String },
}

/// One diagnostic block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// File path, empty for context-only blocks.
    pub path: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
    /// Display text, never starts or ends with a newline.
    pub text: String,
}

impl Block {
    /// Create a context-only block.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach a file location.
    pub fn at(mut self, path: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        self.path = path.into();
        self.line = line;
        self.column = column;
        self
    }

    /// Encode as a NUL-terminated wire record.
    ///
    /// NUL never appears inside a record, and the path never contains a
    /// field separator, so those characters are dropped if present.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.path.len() + self.text.len() + 16);
        out.extend(
            self.path
                .chars()
                .filter(|&c| c != FIELD_SEP && c != BLOCK_END),
        );
        for value in [self.line, self.column, self.end_line, self.end_column] {
            out.push(FIELD_SEP);
            if let Some(n) = value {
                let _ = write!(out, "{n}");
            }
        }
        out.push(FIELD_SEP);
        out.extend(self.text.chars().filter(|&c| c != BLOCK_END));
        out.push(BLOCK_END);
        out
    }

    /// Decode one wire record, with or without its trailing NUL.
    ///
    /// The text field is taken verbatim, so it may contain field separators.
    pub fn decode(record: &str) -> Result<Self, WireError> {
        let record = record.strip_suffix(BLOCK_END).unwrap_or(record);
        let fields: Vec<&str> = record.splitn(FIELD_COUNT, FIELD_SEP).collect();
        let [path, line, column, end_line, end_column, text] = fields[..] else {
            return Err(WireError::MissingFields(fields.len()));
        };

        Ok(Self {
            path: path.to_string(),
            line: parse_number("line", line)?,
            column: parse_number("column", column)?,
            end_line: parse_number("end_line", end_line)?,
            end_column: parse_number("end_column", end_column)?,
            text: text.to_string(),
        })
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<Option<u32>, WireError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| WireError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Split a NUL-separated stream into decoded blocks.
///
/// Empty records (e.g. after the final terminator) are skipped.
#[cfg(test)]
pub fn decode_stream(stream: &str) -> Result<Vec<Block>, WireError> {
    stream
        .split(BLOCK_END)
        .filter(|record| !record.is_empty())
        .map(Block::decode)
        .collect()
}
