//! Directive-block parsing and schema discovery.
//!
//! A W3C extended log file opens with a block of `#`-prefixed directive
//! lines. Only the `#Fields:` directive contributes to the schema; the
//! others (`#Software`, `#Version`, `#Date`, ...) are read and retained but
//! need not be understood.

use crate::error::{Error, Result};
use crate::line::Schema;
use crate::models::Kind;
use crate::scanner::Scanner;
use std::io::Read;
use std::sync::Arc;

/// A non-`Fields` directive from the header block, e.g. `#Software: ...`.
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: String,
    pub value: String,
}

/// Parsed header block of one log file.
#[derive(Debug)]
pub(crate) struct Header {
    pub schema: Arc<Schema>,
    pub directives: Vec<Directive>,
    pub has_gmt_time: bool,
    /// First ordinary line of the file, already tokenized. The scanner has
    /// consumed it while looking for the end of the directive block, so the
    /// parser must emit it before scanning further.
    pub pending: Option<Vec<String>>,
}

/// Consume every directive line preceding the first ordinary line and build
/// the schema from the `#Fields:` directive.
pub(crate) fn parse_header<R: Read>(scanner: &mut Scanner<R>) -> Result<Header> {
    let mut field_names: Option<Vec<String>> = None;
    let mut directives = Vec::new();
    let mut pending = None;

    loop {
        if !scanner.scan()? {
            break;
        }
        let tokens = scanner.fields();
        let first = tokens[0].as_str();
        if !first.starts_with('#') {
            pending = Some(tokens.to_vec());
            break;
        }
        let name = first.trim_start_matches('#').trim_end_matches(':');
        if name.eq_ignore_ascii_case("fields") {
            // First #Fields wins if a concatenated file repeats the header.
            field_names.get_or_insert_with(|| tokens[1..].to_vec());
        } else {
            directives.push(Directive {
                name: name.to_string(),
                value: tokens[1..].join(" "),
            });
        }
    }

    let field_names = field_names.ok_or(Error::MissingFieldsDirective)?;
    if field_names.is_empty() {
        return Err(Error::EmptyHeader);
    }
    let schema = Arc::new(Schema::new(field_names));
    let has_gmt_time = schema.columns().iter().any(|c| c.kind == Kind::Timestamp);

    Ok(Header {
        schema,
        directives,
        has_gmt_time,
        pending,
    })
}
