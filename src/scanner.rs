//! Stream-oriented scanner for W3C Extended Log Format lines.
//!
//! The scanner consumes raw bytes from any `Read` implementation, in whatever
//! chunk sizes the reader produces, and emits one logical line at a time as
//! an ordered list of raw string fields. Fields are separated by runs of
//! whitespace; a field may be wrapped in double quotes to preserve embedded
//! whitespace. The result is independent of how the input was chunked.

use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};

/// Fixed size of the scan buffer, and therefore the hard ceiling on the
/// length of one logical line.
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// Consecutive `Interrupted` reads tolerated before giving up.
const MAX_INTERRUPTS: u32 = 100;

/// Outcome of trying to split one line out of the buffered bytes.
enum Split {
    /// A terminating newline was found. `consumed` bytes can be dropped from
    /// the buffer; `fields` may be empty for a blank line.
    Line {
        consumed: usize,
        fields: Vec<String>,
    },
    /// The buffered bytes hold no terminating newline yet. `fields` is what
    /// the region would yield if the input ended here (flush semantics).
    NoEndline { fields: Vec<String> },
    /// The buffered bytes end inside an open quoted field.
    QuoteLeftOpen,
}

fn is_sep(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r')
}

fn token(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Quote-aware splitting of the next logical line out of `data`.
fn split_line(data: &[u8]) -> Split {
    let mut fields = Vec::new();
    let mut i = 0;
    loop {
        while i < data.len() && is_sep(data[i]) {
            i += 1;
        }
        if i == data.len() {
            return Split::NoEndline { fields };
        }
        match data[i] {
            b'\n' => {
                return Split::Line {
                    consumed: i + 1,
                    fields,
                }
            }
            b'"' => {
                i += 1;
                let start = i;
                while i < data.len() && data[i] != b'"' {
                    i += 1;
                }
                if i == data.len() {
                    return Split::QuoteLeftOpen;
                }
                fields.push(token(&data[start..i]));
                i += 1;
            }
            _ => {
                let start = i;
                while i < data.len() && !is_sep(data[i]) && data[i] != b'\n' {
                    i += 1;
                }
                fields.push(token(&data[start..i]));
                if i == data.len() {
                    // The token may continue in the next chunk; report the
                    // region as incomplete and let the caller retry or flush.
                    return Split::NoEndline { fields };
                }
            }
        }
    }
}

/// Incremental tokenizer over a byte stream.
///
/// One `Scanner` serves exactly one input stream, sequentially. The internal
/// buffer is allocated once at [`MAX_LINE_SIZE`] and never grows; the
/// unconsumed suffix is compacted to the front when the parsed-off prefix
/// accumulates, so memory use is bounded independent of file size.
///
/// # Examples
///
/// ```
/// use w3clog_parser::Scanner;
///
/// let mut scanner = Scanner::new("a b c\nd e\n".as_bytes());
/// while scanner.scan()? {
///     println!("{:?}", scanner.fields());
/// }
/// # Ok::<(), w3clog_parser::Error>(())
/// ```
pub struct Scanner<R> {
    reader: R,
    fields: Vec<String>,
    buf: Box<[u8]>,
    /// Offset of the first unconsumed byte.
    start: usize,
    /// Offset one past the last filled byte.
    end: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> Scanner<R> {
    /// Create a scanner reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            fields: Vec::new(),
            buf: vec![0u8; MAX_LINE_SIZE].into_boxed_slice(),
            start: 0,
            end: 0,
            eof: false,
            done: false,
        }
    }

    /// Advance to the next logical line.
    ///
    /// Returns `Ok(true)` when a line with at least one field is available
    /// through [`fields`](Self::fields), `Ok(false)` on clean end of stream,
    /// and an error on any fatal condition ([`Error::QuoteLeftOpen`],
    /// [`Error::LineTooLong`], [`Error::NoProgress`], [`Error::Io`]). After
    /// `Ok(false)` or an error, further calls return `Ok(false)`.
    pub fn scan(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let mut interrupts = 0u32;
        loop {
            if self.end > self.start {
                match split_line(&self.buf[self.start..self.end]) {
                    Split::Line { consumed, fields } => {
                        self.start += consumed;
                        if !fields.is_empty() {
                            self.fields = fields;
                            return Ok(true);
                        }
                        // Blank region consumed; try again without reading.
                        continue;
                    }
                    Split::NoEndline { fields } => {
                        if self.eof {
                            // No more data will arrive: the buffered
                            // remainder is the final implicit line.
                            self.done = true;
                            self.start = self.end;
                            if !fields.is_empty() {
                                self.fields = fields;
                                return Ok(true);
                            }
                            return Ok(false);
                        }
                    }
                    Split::QuoteLeftOpen => {
                        if self.eof {
                            self.done = true;
                            return Err(Error::QuoteLeftOpen);
                        }
                    }
                }
            } else if self.eof {
                self.done = true;
                return Ok(false);
            }

            // Compact when the tail is exhausted or the parsed-off prefix
            // takes up more than half the arena.
            if self.start > 0 && (self.end == self.buf.len() || self.start > self.buf.len() / 2) {
                self.buf.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.start = 0;
            }
            if self.end == self.buf.len() {
                // One still-incomplete line fills the whole arena.
                self.done = true;
                return Err(Error::LineTooLong(MAX_LINE_SIZE));
            }

            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => self.eof = true,
                Ok(n) => {
                    self.end += n;
                    interrupts = 0;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    interrupts += 1;
                    if interrupts >= MAX_INTERRUPTS {
                        self.done = true;
                        return Err(Error::NoProgress);
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Err(Error::Io(e));
                }
            }
        }
    }

    /// The fields of the line produced by the most recent successful
    /// [`scan`](Self::scan).
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}
