//! Schema and reusable record model for parsed log lines.

use crate::error::Result;
use crate::models::{guess_type, Kind, Value};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// W3C marker for a field with no value.
pub const NOT_PRESENT: &str = "-";

/// One column of a schema: its W3C field name and the kind guessed from it.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: Kind,
}

/// Ordered column layout discovered from the `#Fields:` directive.
///
/// Order is significant: it defines the positional correspondence between the
/// raw tokens of a data line and the columns. Kinds are assigned once, via
/// [`guess_type`], and never change for the life of the file.
#[derive(Debug, Default)]
pub struct Schema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from ordered column names, guessing each kind.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let name = name.into();
            let kind = guess_type(&name);
            // Duplicate names are undefined behavior per the format; the
            // index keeps the first occurrence.
            index.entry(name.clone()).or_insert(columns.len());
            columns.push(Column { name, kind });
        }
        Self { columns, index }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in file order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Position of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// One parsed data line: per column, the raw token plus the value coerced to
/// the column's [`Kind`], when present and parseable.
///
/// A `Line` can be recycled across parse steps through
/// [`FileParser::next_to`](crate::FileParser::next_to); it is fully cleared
/// before repopulation, so a column absent in the new input line never leaks
/// a stale value from a previous one.
#[derive(Debug, Clone)]
pub struct Line {
    schema: Arc<Schema>,
    /// Raw token per column; empty when the line had no token for it.
    raws: Vec<String>,
    values: Vec<Option<Value>>,
}

impl Line {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        let n = schema.len();
        Self {
            schema,
            raws: vec![String::new(); n],
            values: vec![None; n],
        }
    }

    /// Reset every column to absent.
    pub(crate) fn clear(&mut self) {
        for raw in &mut self.raws {
            raw.clear();
        }
        for value in &mut self.values {
            *value = None;
        }
    }

    /// Prepare this line for reuse under `schema`, rebuilding the slots when
    /// the line was allocated against a different schema.
    pub(crate) fn reset(&mut self, schema: &Arc<Schema>) {
        if Arc::ptr_eq(&self.schema, schema) {
            self.clear();
        } else {
            *self = Line::new(Arc::clone(schema));
        }
    }

    /// Store the raw token for column `idx` and coerce it to the column's
    /// kind. The `-` marker and unparseable tokens leave the column absent.
    pub(crate) fn set(&mut self, idx: usize, raw: &str) {
        self.raws[idx].clear();
        self.raws[idx].push_str(raw);
        self.values[idx] = if raw == NOT_PRESENT {
            None
        } else {
            Value::coerce(self.schema.columns[idx].kind, raw)
        };
    }

    /// The schema this line was parsed against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Typed value of a column, or `None` when the field was absent (`-`,
    /// missing, or unparseable) or the column is unknown to this schema.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values[self.schema.position(name)?].as_ref()
    }

    /// All present fields, keyed by column name.
    pub fn get_all(&self) -> HashMap<&str, &Value> {
        self.schema
            .columns
            .iter()
            .zip(&self.values)
            .filter_map(|(col, value)| value.as_ref().map(|v| (col.name.as_str(), v)))
            .collect()
    }

    /// Raw textual form of a column regardless of kind, or `None` when the
    /// column is unknown to this schema. An absent field yields its raw
    /// marker (`-`) or the empty string.
    pub fn get_as_string(&self, name: &str) -> Option<&str> {
        Some(self.raws[self.schema.position(name)?].as_str())
    }

    /// The calendar date of this line, taken from the first date or
    /// timestamp column that is present.
    pub fn get_date(&self) -> Option<NaiveDate> {
        self.values.iter().flatten().find_map(|v| v.date())
    }

    /// Column names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schema.names()
    }

    /// Serialize to one compact JSON object with one key per present column.
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Write this line to `out`, as a JSON object or as a CSV line (fields
    /// in schema order, absent fields empty), followed by a newline.
    pub fn write_to<W: Write>(&self, out: &mut W, as_json: bool) -> Result<()> {
        if as_json {
            serde_json::to_writer(&mut *out, self)?;
            out.write_all(b"\n")?;
        } else {
            self.write_csv(out)?;
        }
        Ok(())
    }

    fn write_csv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            if let Some(value) = value {
                write_csv_field(out, &value.to_string())?;
            }
        }
        out.write_all(b"\n")
    }
}

fn write_csv_field<W: Write>(out: &mut W, field: &str) -> std::io::Result<()> {
    if field.contains(['"', ',', '\n', '\r']) {
        out.write_all(b"\"")?;
        out.write_all(field.replace('"', "\"\"").as_bytes())?;
        out.write_all(b"\"")
    } else {
        out.write_all(field.as_bytes())
    }
}

impl Serialize for Line {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let present = self.values.iter().flatten().count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (col, value) in self.schema.columns.iter().zip(&self.values) {
            if let Some(value) = value {
                map.serialize_entry(&col.name, value)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(["date", "time", "c-ip", "sc-bytes", "cs-method"]))
    }

    fn populate(line: &mut Line, tokens: &[&str]) {
        for (i, tok) in tokens.iter().enumerate() {
            line.set(i, tok);
        }
    }

    #[test]
    fn test_get_and_get_all() {
        let mut line = Line::new(schema());
        populate(&mut line, &["2020-01-01", "00:00:01", "10.0.0.1", "-", "GET"]);
        assert_eq!(
            line.get("cs-method"),
            Some(&Value::String("GET".to_string()))
        );
        assert_eq!(line.get("sc-bytes"), None);
        assert_eq!(line.get("no-such-column"), None);
        let all = line.get_all();
        assert_eq!(all.len(), 4);
        assert!(!all.contains_key("sc-bytes"));
    }

    #[test]
    fn test_get_as_string_returns_raw() {
        let mut line = Line::new(schema());
        populate(&mut line, &["2020-01-01", "00:00:01", "10.0.0.1", "-", "GET"]);
        assert_eq!(line.get_as_string("sc-bytes"), Some("-"));
        assert_eq!(line.get_as_string("c-ip"), Some("10.0.0.1"));
        assert_eq!(line.get_as_string("bogus"), None);
    }

    #[test]
    fn test_clear_resets_every_column() {
        let mut line = Line::new(schema());
        populate(&mut line, &["2020-01-01", "00:00:01", "10.0.0.1", "42", "GET"]);
        line.clear();
        assert!(line.get_all().is_empty());
        assert_eq!(line.get_as_string("c-ip"), Some(""));
    }

    #[test]
    fn test_unparseable_field_is_absent() {
        let mut line = Line::new(schema());
        populate(&mut line, &["2020-01-01", "bad-time", "bad-ip", "abc", "GET"]);
        assert_eq!(line.get("time"), None);
        assert_eq!(line.get("c-ip"), None);
        assert_eq!(line.get("sc-bytes"), None);
        // Raw forms survive coercion failure.
        assert_eq!(line.get_as_string("c-ip"), Some("bad-ip"));
    }

    #[test]
    fn test_csv_escaping() {
        let mut line = Line::new(Arc::new(Schema::new(["cs(User-Agent)", "cs-method"])));
        populate(&mut line, &["Mozilla, \"like Gecko\"", "GET"]);
        let mut out = Vec::new();
        line.write_to(&mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"Mozilla, \"\"like Gecko\"\"\",GET\n"
        );
    }

    #[test]
    fn test_json_object_has_only_present_fields() {
        let mut line = Line::new(schema());
        populate(&mut line, &["2020-01-01", "-", "-", "-", "-"]);
        let json: serde_json::Value =
            serde_json::from_slice(&line.to_json_vec().unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["date"], "2020-01-01");
    }
}
