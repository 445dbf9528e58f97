//! Test utilities for building W3C extended log content.
#![allow(dead_code)]

use std::io::Read;

/// Builder for W3C extended log file content.
pub struct LogBuilder {
    content: String,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Add a `#Name: value` directive line.
    pub fn directive(mut self, name: &str, value: &str) -> Self {
        self.content.push('#');
        self.content.push_str(name);
        self.content.push_str(": ");
        self.content.push_str(value);
        self.content.push('\n');
        self
    }

    /// Add the `#Fields:` directive.
    pub fn fields(self, names: &str) -> Self {
        self.directive("Fields", names)
    }

    /// Add one data line (newline appended).
    pub fn line(mut self, line: &str) -> Self {
        self.content.push_str(line);
        self.content.push('\n');
        self
    }

    /// Append raw text without a newline.
    pub fn raw(mut self, text: &str) -> Self {
        self.content.push_str(text);
        self
    }

    pub fn build(self) -> String {
        self.content
    }
}

/// Reader handing out its bytes in fixed-size chunks, to exercise scanning
/// across arbitrary read boundaries.
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        assert!(chunk > 0);
        Self {
            data: data.into(),
            pos: 0,
            chunk,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
