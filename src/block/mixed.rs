//! Raw output interleaved with marker-wrapped block streams.
//!
//! Raw spans are re-assembled into lines and segmented; wrapped spans are
//! already wire-encoded and pass through untouched. The open raw block is
//! closed before a wrapped span so records never interleave.

use std::collections::VecDeque;

use super::Segmenter;
use super::markers::{Span, SplitAtMarkers, split_at_markers};

/// Lazy wire-chunk iterator over command output lines.
pub struct MixedBlocks<I> {
    spans: SplitAtMarkers<I>,
    segmenter: Segmenter,
    /// Raw text not yet terminated by a newline.
    partial: String,
    out: VecDeque<String>,
    done: bool,
}

impl<I> MixedBlocks<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    pub fn new<T>(lines: T) -> Self
    where
        T: IntoIterator<IntoIter = I, Item = I::Item>,
    {
        Self {
            spans: split_at_markers(lines),
            segmenter: Segmenter::new(),
            partial: String::new(),
            out: VecDeque::new(),
            done: false,
        }
    }

    fn feed_raw(&mut self, content: &str) {
        self.partial.push_str(content);
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if let Some(block) = self.segmenter.push(&line) {
                self.out.push_back(block.encode());
            }
        }
    }

    /// Flush the unterminated raw line and the open block.
    fn flush_raw(&mut self) {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            if let Some(block) = self.segmenter.push(&line) {
                self.out.push_back(block.encode());
            }
        }
        if let Some(block) = self.segmenter.finish() {
            self.out.push_back(block.encode());
        }
    }
}

impl<I> Iterator for MixedBlocks<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(chunk) = self.out.pop_front() {
                return Some(chunk);
            }
            if self.done {
                return None;
            }
            match self.spans.next() {
                Some(Span {
                    wrapped: false,
                    content,
                }) => self.feed_raw(&content),
                Some(Span {
                    wrapped: true,
                    content,
                }) => {
                    self.flush_raw();
                    self.out.push_back(content);
                }
                None => {
                    self.flush_raw();
                    if self.spans.is_open() {
                        crate::log!("warn"; "nested block stream ended without end marker");
                    }
                    self.done = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, decode_stream};

    fn run(lines: &[&str]) -> String {
        MixedBlocks::new(lines.iter().copied()).collect()
    }

    #[test]
    fn test_raw_only_matches_segmenter() {
        let stream = run(&["a.py:1: error: x\n", "a.py:2: error: y\n"]);
        let blocks = decode_stream(&stream).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "a.py:1: error: x");
        assert_eq!(blocks[1].line, Some(2));
    }

    #[test]
    fn test_wrapped_span_passes_through() {
        let nested = Block::new("inner").at("b.py", Some(3), None).encode();
        let wrapped = format!("\x02{nested}\x03");
        let stream = run(&["a.py:1: error: x\n", wrapped.as_str(), "a.py:1: error: again\n"]);

        let blocks = decode_stream(&stream).unwrap();
        let texts: Vec<_> = blocks.iter().map(|b| b.text.as_str()).collect();
        // The raw block is closed before the nested one, and the next raw
        // line starts fresh even with the same location.
        assert_eq!(texts, ["a.py:1: error: x", "inner", "a.py:1: error: again"]);
        assert_eq!(blocks[1].path, "b.py");
    }

    #[test]
    fn test_partial_line_before_marker() {
        let nested = Block::new("n").encode();
        let input = format!("no newline\x02{nested}\x03");
        let stream = run(&[input.as_str()]);
        let blocks = decode_stream(&stream).unwrap();
        assert_eq!(blocks[0].text, "no newline");
        assert_eq!(blocks[1].text, "n");
    }

    #[test]
    fn test_unclosed_marker_still_yields_content() {
        let nested = Block::new("dangling").encode();
        let input = format!("\x02{nested}");
        let stream = run(&[input.as_str()]);
        assert_eq!(decode_stream(&stream).unwrap()[0].text, "dangling");
    }
}
