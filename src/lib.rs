//! # W3C Extended Log Parser
//!
//! A Rust library for parsing [W3C Extended Log Format] access logs — the
//! self-describing, whitespace-delimited, directive-headed text format used
//! by web and proxy servers — into typed, queryable records, with export to
//! JSON Lines and CSV.
//!
//! [W3C Extended Log Format]: https://www.w3.org/TR/WD-logfile.html
//!
//! ## Features
//!
//! - **Streaming**: incremental scanning over any `Read`, with a fixed
//!   64 KiB buffer regardless of file size and identical results for any
//!   read-chunking of the input
//! - **Quote-aware**: fields wrapped in double quotes keep their embedded
//!   whitespace
//! - **Typed columns**: each column's semantic type (date, time, timestamp,
//!   IP, URI, number, boolean, text) is inferred from its W3C field name
//! - **Record recycling**: steady-state iteration without per-line
//!   allocation through [`FileParser::next_to`]
//! - **Schema generation**: Postgres `CREATE TABLE` DDL and Elasticsearch
//!   index mappings derived from the same type table
//!
//! ## Quick Start
//!
//! ```
//! use w3clog_parser::FileParser;
//!
//! let log = "#Fields: date time c-ip cs-method\n\
//!            2020-01-01 00:00:01 10.0.0.1 GET\n";
//!
//! let mut parser = FileParser::new(log.as_bytes());
//! parser.parse_header()?;
//!
//! while let Some(line) = parser.next()? {
//!     println!("{}", String::from_utf8_lossy(&line.to_json_vec()?));
//! }
//! # Ok::<(), w3clog_parser::Error>(())
//! ```
//!
//! ## Typed Access
//!
//! Fields come back already coerced to their column's [`Kind`]:
//!
//! ```
//! use w3clog_parser::{FileParser, Value};
//!
//! let log = "#Fields: date sc-bytes c-ip\n2020-01-01 1234 10.0.0.1\n";
//! let mut parser = FileParser::new(log.as_bytes());
//! parser.parse_header()?;
//!
//! let line = parser.next()?.unwrap();
//! assert_eq!(line.get("sc-bytes"), Some(&Value::Int64(1234)));
//! assert_eq!(line.get_as_string("c-ip"), Some("10.0.0.1"));
//! # Ok::<(), w3clog_parser::Error>(())
//! ```
//!
//! A lone `-` is the format's "not present" marker; such fields, and fields
//! that fail coercion, are reported as absent rather than failing the
//! record.
//!
//! ## Low-Level Access
//!
//! The [`Scanner`] underneath the parser can be driven directly when only
//! raw tokens are needed:
//!
//! ```
//! use w3clog_parser::Scanner;
//!
//! let mut scanner = Scanner::new("a \"b c\" d\n".as_bytes());
//! while scanner.scan()? {
//!     assert_eq!(scanner.fields(), ["a", "b c", "d"]);
//! }
//! # Ok::<(), w3clog_parser::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, Error>`. A clean end of stream is not an
//! error: [`Scanner::scan`] reports it as `Ok(false)` and
//! [`FileParser::next`] as `Ok(None)`. Fatal conditions are an open quoted
//! field at end of input, a logical line above the 64 KiB ceiling, a stalled
//! reader, and a header block without a usable `#Fields:` directive.

// Public API modules
pub mod error;
pub mod parser;
pub mod scanner;

// Re-export commonly used types
pub use error::{Error, Result};
pub use header::Directive;
pub use line::{Column, Line, Schema, NOT_PRESENT};
pub use models::{guess_type, Kind, Value};
pub use parser::FileParser;
pub use scanner::Scanner;

// Internal modules (public but not part of the high-level API)
pub mod formats;
pub mod header;
pub mod line;
pub mod models;
