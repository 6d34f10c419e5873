//! Start/end markers around pre-formatted block streams.
//!
//! A nested `tuick --format` run writes its blocks between STX (0x02) and
//! ETX (0x03). The outer run sees those bytes inside otherwise raw output and
//! passes the wrapped span through instead of segmenting it again.

use std::collections::VecDeque;
use std::iter;

/// Opens a wrapped span.
pub const START_MARKER: char = '\x02';

/// Closes a wrapped span.
pub const END_MARKER: char = '\x03';

/// Wrap a block stream between start and end markers.
pub fn wrap_with_markers<I>(chunks: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = String>,
{
    iter::once(START_MARKER.to_string())
        .chain(chunks)
        .chain(iter::once(END_MARKER.to_string()))
}

/// A piece of input, inside or outside markers. Markers are not included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub wrapped: bool,
    pub content: String,
}

impl Span {
    fn new(wrapped: bool, content: &str) -> Self {
        Self {
            wrapped,
            content: content.to_string(),
        }
    }
}

/// Demultiplexer over a chunk stream.
///
/// Spans are yielded as soon as their chunk is read, so a single span that
/// crosses chunk boundaries arrives as consecutive fragments with the same
/// `wrapped` flag.
pub struct SplitAtMarkers<I> {
    chunks: I,
    wrapped: bool,
    pending: VecDeque<Span>,
}

impl<I> SplitAtMarkers<I> {
    /// True while inside a wrapped span. After exhaustion, true means the
    /// input ended without a closing marker.
    pub fn is_open(&self) -> bool {
        self.wrapped
    }

    fn scan(&mut self, chunk: &str) {
        let mut start = 0;
        for (i, c) in chunk.char_indices() {
            if c != START_MARKER && c != END_MARKER {
                continue;
            }
            if i > start {
                self.pending.push_back(Span::new(self.wrapped, &chunk[start..i]));
            }
            self.wrapped = c == START_MARKER;
            start = i + c.len_utf8();
        }
        if start < chunk.len() {
            self.pending.push_back(Span::new(self.wrapped, &chunk[start..]));
        }
    }
}

impl<I> Iterator for SplitAtMarkers<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            if let Some(span) = self.pending.pop_front() {
                return Some(span);
            }
            let chunk = self.chunks.next()?;
            self.scan(chunk.as_ref());
        }
    }
}

/// Split a chunk stream at start/end markers.
pub fn split_at_markers<I>(chunks: I) -> SplitAtMarkers<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    SplitAtMarkers {
        chunks: chunks.into_iter(),
        wrapped: false,
        pending: VecDeque::new(),
    }
}
