//! Heuristic segmentation of raw tool output into blocks.
//!
//! Used when no structured errorformat definition is available for the tool.
//!
//! ```text
//! lines → classify (LineKind) → Segmenter::step (reducer) → Block
//! ```
//!
//! Block boundaries:
//! - a note line always starts a block and opens a note context
//! - a location line continues an open note for the same path, otherwise it
//!   starts a block when it differs from the previous location
//! - summary and separator lines always start a block
//! - the first non-blank line after a blank line starts a block
//! - any other line continues the current block
//!
//! Lines are joined with `\n`, so a block never starts or ends with a newline.

use super::Block;
use super::classify::{LineKind, Location, classify};

/// Block being accumulated.
#[derive(Debug, Default)]
struct OpenBlock {
    /// First location line seen in the block.
    location: Option<Location>,
    /// Note path when the block was opened by a note line.
    note_path: Option<String>,
    lines: Vec<String>,
}

impl OpenBlock {
    fn push(&mut self, kind: &LineKind, text: &str) {
        match kind {
            LineKind::Location(location) if self.location.is_none() => {
                self.location = Some(location.clone());
            }
            LineKind::Note { path } if self.location.is_none() && self.note_path.is_none() => {
                self.note_path = Some(path.clone());
            }
            _ => {}
        }
        self.lines.push(text.to_string());
    }

    fn into_block(self) -> Block {
        let text = self.lines.join("\n");
        match (self.location, self.note_path) {
            (Some(loc), _) => Block::new(text).at(loc.path, Some(loc.line), loc.column),
            (None, Some(path)) => Block::new(text).at(path, None, None),
            (None, None) => Block::new(text),
        }
    }
}

/// Segmentation state machine.
///
/// Feed lines with [`Segmenter::push`]; a completed block is returned when the
/// next block starts. Call [`Segmenter::finish`] at end of input.
#[derive(Debug, Default)]
pub struct Segmenter {
    current: Option<OpenBlock>,
    previous_location: Option<Location>,
    note_path: Option<String>,
    /// A blank line was seen since the last content line.
    after_blank: bool,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line, with or without its line terminator.
    pub fn push(&mut self, line: &str) -> Option<Block> {
        let text = line.strip_suffix('\n').unwrap_or(line);
        let text = text.strip_suffix('\r').unwrap_or(text);
        let kind = classify(text);
        self.step(&kind, text)
    }

    /// Close the open block, if any, and reset all state.
    pub fn finish(&mut self) -> Option<Block> {
        let block = self.current.take().map(OpenBlock::into_block);
        *self = Self::default();
        block
    }

    /// Reducer: apply one classified line, returning the block it closed.
    pub fn step(&mut self, kind: &LineKind, text: &str) -> Option<Block> {
        if *kind == LineKind::Blank {
            self.previous_location = None;
            self.note_path = None;
            self.after_blank = self.current.is_some();
            return None;
        }

        let starts_block = self.transition(kind) || self.after_blank;
        self.after_blank = false;

        let closed = if starts_block {
            self.current.take().map(OpenBlock::into_block)
        } else {
            None
        };

        self.current.get_or_insert_with(OpenBlock::default).push(kind, text);
        closed
    }

    /// Update location/note context, returning whether `kind` starts a block.
    fn transition(&mut self, kind: &LineKind) -> bool {
        match kind {
            LineKind::Note { path } => {
                self.note_path = Some(path.clone());
                self.previous_location = None;
                true
            }
            LineKind::Location(current) => {
                if self.note_path.as_deref() == Some(current.path.as_str()) {
                    // Continuation of the open note block
                    self.previous_location = Some(current.clone());
                    return false;
                }
                let starts = self
                    .previous_location
                    .as_ref()
                    .is_some_and(|previous| previous != current);
                self.previous_location = Some(current.clone());
                self.note_path = None;
                starts
            }
            LineKind::Summary | LineKind::Separator => {
                self.previous_location = None;
                self.note_path = None;
                true
            }
            LineKind::Text | LineKind::Blank => false,
        }
    }
}

/// Lazy block iterator over a line source.
#[cfg(test)]
pub struct SplitBlocks<I> {
    lines: I,
    segmenter: Segmenter,
    done: bool,
}

#[cfg(test)]
impl<I> Iterator for SplitBlocks<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.done {
            return None;
        }
        for line in self.lines.by_ref() {
            if let Some(block) = self.segmenter.push(line.as_ref()) {
                return Some(block);
            }
        }
        self.done = true;
        self.segmenter.finish()
    }
}

/// Split raw lines into blocks.
///
/// Each call starts from a fresh state; the input is consumed lazily.
#[cfg(test)]
pub fn split_blocks<I>(lines: I) -> SplitBlocks<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    SplitBlocks {
        lines: lines.into_iter(),
        segmenter: Segmenter::new(),
        done: false,
    }
}
