//! Postgres DDL generation for access-log tables.

use crate::models::{guess_type, Kind};

/// Rewrite a W3C field name into a usable Postgres identifier.
///
/// Field names may contain `-`, `(` and `)` (e.g. `cs(User-Agent)`), none of
/// which survive as unquoted column names.
pub fn pg_key(name: &str) -> String {
    name.replace('-', "_").replace(['(', ')'], "$")
}

/// SQL column definition for a guessed kind.
fn column_type(kind: Kind) -> &'static str {
    match kind {
        Kind::Date => "DATE DEFAULT '0001-01-01'",
        Kind::Time => "TIME WITHOUT TIME ZONE DEFAULT '00:00:00'",
        Kind::Timestamp => "TIMESTAMP WITH TIME ZONE DEFAULT '0001-01-01 00:00:00 -0:00'",
        Kind::Ip => "INET DEFAULT '0.0.0.0'",
        Kind::Uri => "TEXT DEFAULT ''",
        Kind::Float64 => "DOUBLE PRECISION DEFAULT 0",
        Kind::Int64 => "BIGINT DEFAULT 0",
        Kind::Bool => "BOOLEAN DEFAULT FALSE",
        Kind::String => "TEXT DEFAULT ''",
    }
}

/// Build the `CREATE TABLE` statement for storing access logs with the given
/// field names. Columns are typed via [`guess_type`] and prefixed with a
/// `BIGSERIAL` primary key.
pub fn create_table_ddl<I, S>(table: &str, field_names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut columns = vec!["id BIGSERIAL PRIMARY KEY".to_string()];
    for name in field_names {
        let name = name.as_ref();
        columns.push(format!(
            "{} {}",
            pg_key(name),
            column_type(guess_type(name))
        ));
    }
    format!("CREATE TABLE {} (\n    {}\n);", table, columns.join(",\n    "))
}
