//! Newline-delimited scanning with an explicit line size bound.

use std::io::{BufRead, ErrorKind};
use thiserror::Error;

/// Default upper bound on a single line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Errors yielded by [`BoundedLines`].
#[derive(Error, Debug)]
pub enum LineError {
    /// The line exceeded the configured bound and was discarded.
    ///
    /// Scanning continues with the following line.
    #[error("line of {len} bytes exceeds the {max} byte limit")]
    TooLong {
        /// Length of the discarded line, terminator excluded.
        len: usize,
        /// The configured bound.
        max: usize,
    },

    /// Reading or decoding the underlying stream failed.
    ///
    /// This ends the scan; a partially read line is dropped.
    #[error("stream decode failed: {0}")]
    Decode(#[from] std::io::Error),
}

impl LineError {
    /// Returns true if scanning stops after this error.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Iterator over the `\n`-terminated lines of a reader.
///
/// A trailing `\r` is stripped from each line and does not count towards
/// the bound. A final line without a terminator is still yielded. Empty
/// lines are yielded as empty buffers. Lines longer than `max_line_bytes`
/// are skipped without being buffered in full and reported as
/// [`LineError::TooLong`].
#[derive(Debug)]
pub struct BoundedLines<R> {
    reader: R,
    max_line_bytes: usize,
    done: bool,
}

impl<R: BufRead> BoundedLines<R> {
    /// Creates a scanner over `reader`.
    pub const fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            max_line_bytes,
            done: false,
        }
    }

    /// Returns the configured line bound.
    #[must_use]
    pub const fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    fn finish_line(
        &self,
        mut line: Vec<u8>,
        len: usize,
        ends_with_cr: bool,
    ) -> Result<Vec<u8>, LineError> {
        let len = len - usize::from(ends_with_cr);
        if len > self.max_line_bytes {
            return Err(LineError::TooLong {
                len,
                max: self.max_line_bytes,
            });
        }
        if ends_with_cr {
            line.pop();
        }
        Ok(line)
    }
}

impl<R: BufRead> Iterator for BoundedLines<R> {
    type Item = Result<Vec<u8>, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut line = Vec::new();
        // Bytes seen for this line; exceeds `line.len()` once the line is oversized
        let mut len = 0usize;
        let mut ends_with_cr = false;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(LineError::Decode(e)));
                }
            };

            if available.is_empty() {
                self.done = true;
                if len == 0 {
                    return None;
                }
                return Some(self.finish_line(line, len, ends_with_cr));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let take = newline.unwrap_or(available.len());

            if take > 0 {
                ends_with_cr = available[take - 1] == b'\r';
            }

            let total = len + take;
            // One spare byte keeps a CRLF line sitting exactly at the bound
            if total <= self.max_line_bytes.saturating_add(1) {
                line.extend_from_slice(&available[..take]);
            } else if !line.is_empty() {
                line = Vec::new();
            }
            len = total;

            let consumed = take + usize::from(newline.is_some());
            self.reader.consume(consumed);

            if newline.is_some() {
                return Some(self.finish_line(line, len, ends_with_cr));
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for BoundedLines<R> {}
