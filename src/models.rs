//! Column kinds, name-based type guessing, and typed field values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

/// Semantic type of a column, assigned once at header-parse time from the
/// column's W3C field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Date,
    Time,
    Timestamp,
    Ip,
    Uri,
    Float64,
    Int64,
    Bool,
    String,
}

impl Kind {
    /// Short lowercase label, used to suffix CSV column headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Date => "date",
            Kind::Time => "time",
            Kind::Timestamp => "timestamp",
            Kind::Ip => "ip",
            Kind::Uri => "uri",
            Kind::Float64 => "float64",
            Kind::Int64 => "int64",
            Kind::Bool => "bool",
            Kind::String => "string",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guess the semantic type of a column from its W3C field name.
///
/// This is a pure function of the name: the same name always yields the same
/// [`Kind`], independent of any data observed. It is the single source of
/// truth for column typing; the Postgres DDL and Elasticsearch mapping
/// generators dispatch on its result. Unrecognized names are never rejected,
/// they default to [`Kind::String`].
///
/// # Examples
///
/// ```
/// use w3clog_parser::{guess_type, Kind};
///
/// assert_eq!(guess_type("date"), Kind::Date);
/// assert_eq!(guess_type("c-ip"), Kind::Ip);
/// assert_eq!(guess_type("sc-bytes"), Kind::Int64);
/// assert_eq!(guess_type("cs-method"), Kind::String);
/// ```
pub fn guess_type(name: &str) -> Kind {
    let lower = name.trim().to_ascii_lowercase();
    let name = lower.as_str();
    if name == "date" || name == "gmtdate" || name == "localdate" || name.ends_with("-date") {
        return Kind::Date;
    }
    if name == "time" || name.ends_with("-time") {
        return Kind::Time;
    }
    if name == "gmttime"
        || name == "localtime"
        || name == "timestamp"
        || name == "datetime"
        || name.ends_with("timestamp")
        || name.ends_with("-datetime")
    {
        return Kind::Timestamp;
    }
    if name == "ip" || name.ends_with("-ip") {
        return Kind::Ip;
    }
    if name.contains("uri") || name.contains("url") || name.contains("referer") || name.contains("referrer") {
        return Kind::Uri;
    }
    if name == "time-taken" || name == "duration" || name.ends_with("-seconds") {
        return Kind::Float64;
    }
    if name == "bytes"
        || name == "port"
        || name == "status"
        || name.ends_with("-bytes")
        || name.ends_with("-port")
        || name.ends_with("-status")
        || name.ends_with("-count")
        || name.ends_with("-len")
    {
        return Kind::Int64;
    }
    if name == "cached" || name.ends_with("-cached") {
        return Kind::Bool;
    }
    Kind::String
}

/// A field value already coerced to its column's native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(DateTime<Utc>),
    Ip(IpAddr),
    Uri(String),
    Float64(f64),
    Int64(i64),
    Bool(bool),
    String(String),
}

impl Value {
    /// Best-effort coercion of a raw token to `kind`'s native representation.
    ///
    /// Returns `None` when the token cannot be parsed as `kind`; the field is
    /// then treated as absent rather than failing the whole record.
    pub fn coerce(kind: Kind, raw: &str) -> Option<Value> {
        match kind {
            Kind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            Kind::Time => NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
                .ok()
                .map(Value::Time),
            Kind::Timestamp => parse_timestamp(raw).map(Value::Timestamp),
            Kind::Ip => raw.parse::<IpAddr>().ok().map(Value::Ip),
            Kind::Uri => Some(Value::Uri(raw.to_string())),
            Kind::Float64 => raw.parse::<f64>().ok().map(Value::Float64),
            Kind::Int64 => raw.parse::<i64>().ok().map(Value::Int64),
            Kind::Bool => parse_bool(raw).map(Value::Bool),
            Kind::String => Some(Value::String(raw.to_string())),
        }
    }

    /// The [`Kind`] this value belongs to.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Date(_) => Kind::Date,
            Value::Time(_) => Kind::Time,
            Value::Timestamp(_) => Kind::Timestamp,
            Value::Ip(_) => Kind::Ip,
            Value::Uri(_) => Kind::Uri,
            Value::Float64(_) => Kind::Float64,
            Value::Int64(_) => Kind::Int64,
            Value::Bool(_) => Kind::Bool,
            Value::String(_) => Kind::String,
        }
    }

    /// The calendar date carried by this value, if it has one.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Timestamp(ts) => Some(ts.date_naive()),
            _ => None,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Naive forms are assumed to be UTC, matching the gmttime convention.
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "TRUE" | "True" | "1" => Some(true),
        "false" | "FALSE" | "False" | "0" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Value {
    /// Canonical textual form: ISO dates and times, RFC 3339 timestamps,
    /// standard IP notation. The same rules feed both CSV output and string
    /// keys derived from values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            Value::Ip(ip) => write!(f, "{}", ip),
            Value::Uri(s) => f.write_str(s),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Date(_) | Value::Time(_) | Value::Timestamp(_) | Value::Ip(_) => {
                serializer.collect_str(self)
            }
            Value::Uri(s) => serializer.serialize_str(s),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}
