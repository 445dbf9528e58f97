//! High-level API for parsing one W3C extended log file.

use crate::error::{Error, Result};
use crate::header::{parse_header, Directive, Header};
use crate::line::{Line, Schema};
use crate::scanner::Scanner;
use std::io::Read;
use std::sync::Arc;

/// Parser for one W3C extended log file.
///
/// A `FileParser` serves exactly one input stream, sequentially:
/// [`parse_header`](Self::parse_header) establishes the schema from the
/// directive block, then [`next`](Self::next) / [`next_to`](Self::next_to)
/// materialize successive records until clean end of stream.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use w3clog_parser::FileParser;
///
/// let file = File::open("access.log")?;
/// let mut parser = FileParser::new(file);
/// parser.parse_header()?;
/// while let Some(line) = parser.next()? {
///     println!("{}", String::from_utf8_lossy(&line.to_json_vec()?));
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FileParser<R> {
    scanner: Scanner<R>,
    schema: Arc<Schema>,
    directives: Vec<Directive>,
    has_gmt_time: bool,
    pending: Option<Vec<String>>,
    header_parsed: bool,
}

impl<R: Read> FileParser<R> {
    /// Create a parser reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            scanner: Scanner::new(reader),
            schema: Arc::new(Schema::default()),
            directives: Vec::new(),
            has_gmt_time: false,
            pending: None,
            header_parsed: false,
        }
    }

    /// Read the leading directive block and establish the column schema.
    ///
    /// Must be called before line iteration. Calling it again after a
    /// successful parse is a no-op.
    pub fn parse_header(&mut self) -> Result<()> {
        if self.header_parsed {
            return Ok(());
        }
        let Header {
            schema,
            directives,
            has_gmt_time,
            pending,
        } = parse_header(&mut self.scanner)?;
        self.schema = schema;
        self.directives = directives;
        self.has_gmt_time = has_gmt_time;
        self.pending = pending;
        self.header_parsed = true;
        Ok(())
    }

    /// Column names in file order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.names()
    }

    /// The schema discovered from the `#Fields:` directive.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether the header already carries a combined date-time column, such
    /// as `gmttime`. Sinks that need one synthesize it otherwise.
    pub fn has_gmt_time(&self) -> bool {
        self.has_gmt_time
    }

    /// Header directives other than `#Fields`, in file order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Parse the next data line into a freshly allocated [`Line`].
    ///
    /// Returns `Ok(None)` on clean end of stream.
    pub fn next(&mut self) -> Result<Option<Line>> {
        self.next_to(None)
    }

    /// Parse the next data line, recycling `recycled` when given instead of
    /// allocating.
    ///
    /// The recycled line is cleared before repopulation, so a column absent
    /// in the new input line never retains a stale value from a previous
    /// one. Returns `Ok(None)` on clean end of stream.
    pub fn next_to(&mut self, recycled: Option<Line>) -> Result<Option<Line>> {
        if !self.header_parsed {
            return Err(Error::MissingFieldsDirective);
        }
        let mut line = match recycled {
            Some(mut line) => {
                line.reset(&self.schema);
                line
            }
            None => Line::new(Arc::clone(&self.schema)),
        };
        if let Some(tokens) = self.pending.take() {
            fill(&mut line, &tokens);
            return Ok(Some(line));
        }
        loop {
            if !self.scanner.scan()? {
                return Ok(None);
            }
            let tokens = self.scanner.fields();
            if tokens[0].starts_with('#') {
                // Repeated header block from concatenated rotated files.
                continue;
            }
            fill(&mut line, tokens);
            return Ok(Some(line));
        }
    }
}

/// Populate `line` positionally. Tokens beyond the schema width are ignored;
/// columns without a token stay absent.
fn fill(line: &mut Line, tokens: &[String]) {
    let width = line.schema().len();
    for (i, token) in tokens.iter().take(width).enumerate() {
        line.set(i, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use std::io::Cursor;

    fn parser_for(input: &str) -> FileParser<Cursor<String>> {
        let mut parser = FileParser::new(Cursor::new(input.to_string()));
        parser.parse_header().unwrap();
        parser
    }

    #[test]
    fn test_next_before_header_is_an_error() {
        let mut parser = FileParser::new(Cursor::new(String::new()));
        assert!(matches!(
            parser.next(),
            Err(Error::MissingFieldsDirective)
        ));
    }

    #[test]
    fn test_first_data_line_is_not_lost() {
        let mut parser = parser_for("#Fields: date c-ip\n2020-01-01 10.0.0.1\n2020-01-02 10.0.0.2\n");
        let first = parser.next().unwrap().unwrap();
        assert_eq!(
            first.get("date"),
            Value::coerce(crate::models::Kind::Date, "2020-01-01").as_ref()
        );
        let second = parser.next().unwrap().unwrap();
        assert_eq!(second.get_as_string("c-ip"), Some("10.0.0.2"));
        assert!(parser.next().unwrap().is_none());
    }

    #[test]
    fn test_short_and_long_data_lines() {
        let mut parser = parser_for("#Fields: date c-ip cs-method\n2020-01-01\n2020-01-02 10.0.0.1 GET extra\n");
        let short = parser.next().unwrap().unwrap();
        assert!(short.get("c-ip").is_none());
        assert!(short.get("cs-method").is_none());
        let long = parser.next().unwrap().unwrap();
        assert_eq!(long.get_as_string("cs-method"), Some("GET"));
    }

    #[test]
    fn test_repeated_header_block_is_skipped() {
        let input = "#Fields: date c-ip\n2020-01-01 10.0.0.1\n#Software: rotated\n#Fields: date c-ip\n2020-01-02 10.0.0.2\n";
        let mut parser = parser_for(input);
        assert!(parser.next().unwrap().is_some());
        let after = parser.next().unwrap().unwrap();
        assert_eq!(after.get_as_string("date"), Some("2020-01-02"));
        assert!(parser.next().unwrap().is_none());
    }
}
