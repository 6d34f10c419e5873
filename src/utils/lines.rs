//! Line reading over process pipes.

use std::io::{BufRead, ErrorKind};

/// Lossy line iterator that keeps line terminators.
///
/// Invalid UTF-8 is replaced rather than rejected, so any byte stream yields
/// some text. A read error ends the iteration.
pub struct Lines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.clear();
        loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => return Some(String::from_utf8_lossy(&self.buf).into_owned()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    crate::debug!("exec"; "read error: {}", e);
                    return None;
                }
            }
        }
    }
}
