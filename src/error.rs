//! Error types for the W3C extended log parser library.

use thiserror::Error;

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning or parsing a log file.
///
/// Only a handful of conditions are fatal to the parse of one file: a quoted
/// field left open when the input runs out, a logical line that exceeds the
/// scanner's buffer ceiling, a reader that stalls without delivering bytes,
/// and a header block without a usable `#Fields` directive. A clean end of
/// stream is not an error; it is reported as `Ok(false)` / `Ok(None)` by the
/// scanning and iteration APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// A quoted field was still open when the input ended.
    #[error("quoted field left open at end of input")]
    QuoteLeftOpen,

    /// A single logical line did not fit in the scanner buffer.
    #[error("log line longer than {0} bytes")]
    LineTooLong(usize),

    /// The underlying reader kept returning without delivering any bytes.
    #[error("input reader stalled without making progress")]
    NoProgress,

    /// A data line or the end of the stream was reached before any
    /// `#Fields:` directive.
    #[error("header has no #Fields directive")]
    MissingFieldsDirective,

    /// The `#Fields:` directive was present but named no columns.
    #[error("#Fields directive does not name any column")]
    EmptyHeader,

    /// I/O error while reading the input stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error while writing a record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
