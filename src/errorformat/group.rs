//! Grouping of errorformat records by location.
//!
//! Notes (records without a line number) are merged into the following
//! record for the same file. Consecutive records sharing the same
//! `(filename, line, column)` are merged into one.
//!
//! A located record is only yielded once the next record with a different
//! location arrives, or at end of input, since until then more records may
//! still merge into it.

use std::collections::VecDeque;

use super::DiagnosticRecord;

type Key<'a> = (&'a str, Option<u32>, Option<u32>);

fn key(record: &DiagnosticRecord) -> Key<'_> {
    (&record.filename, record.line, record.column)
}

/// Iterator adapter returned by [`group_by_location`].
pub struct GroupByLocation<I> {
    records: I,
    pending_note: Option<DiagnosticRecord>,
    pending_block: Option<DiagnosticRecord>,
    ready: VecDeque<DiagnosticRecord>,
    done: bool,
}

impl<I> GroupByLocation<I> {
    fn add_note(&mut self, note: DiagnosticRecord) {
        match self.pending_note.as_mut() {
            Some(pending) if pending.filename == note.filename => {
                pending.lines.extend(note.lines);
            }
            Some(_) => {
                // Notes for another file: not expected from real tools.
                if let Some(old) = self.pending_note.replace(note) {
                    self.ready.push_back(old);
                }
            }
            None => self.pending_note = Some(note),
        }
    }

    fn add_located(&mut self, mut record: DiagnosticRecord) {
        if let Some(note) = self.pending_note.take() {
            if note.filename == record.filename {
                let mut lines = note.lines;
                lines.append(&mut record.lines);
                record.lines = lines;
            } else {
                self.ready.push_back(note);
            }
        }

        match self.pending_block.as_mut() {
            Some(block) if key(block) == key(&record) => {
                block.lines.append(&mut record.lines);
            }
            _ => {
                if let Some(previous) = self.pending_block.replace(record) {
                    self.ready.push_back(previous);
                }
            }
        }
    }

    fn flush(&mut self) {
        self.ready.extend(self.pending_block.take());
        self.ready.extend(self.pending_note.take());
    }
}

impl<I> Iterator for GroupByLocation<I>
where
    I: Iterator<Item = DiagnosticRecord>,
{
    type Item = DiagnosticRecord;

    fn next(&mut self) -> Option<DiagnosticRecord> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(record);
            }
            if self.done {
                return None;
            }
            match self.records.next() {
                Some(record) if record.line.is_none() => self.add_note(record),
                Some(record) => self.add_located(record),
                None => {
                    self.flush();
                    self.done = true;
                }
            }
        }
    }
}

/// Merge notes and same-location records.
pub fn group_by_location<I>(records: I) -> GroupByLocation<I::IntoIter>
where
    I: IntoIterator<Item = DiagnosticRecord>,
{
    GroupByLocation {
        records: records.into_iter(),
        pending_note: None,
        pending_block: None,
        ready: VecDeque::new(),
        done: false,
    }
}
