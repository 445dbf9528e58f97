//! Elasticsearch index settings and mappings for access-log indices.

use crate::models::{guess_type, Kind};
use serde_json::{json, Map, Value};

/// Index-level options for the generated body.
#[derive(Debug, Clone)]
pub struct EsIndexOptions {
    pub shards: u32,
    pub replicas: u32,
    pub check_on_startup: bool,
    pub refresh_interval_secs: u64,
}

impl Default for EsIndexOptions {
    fn default() -> Self {
        Self {
            shards: 1,
            replicas: 0,
            check_on_startup: false,
            refresh_interval_secs: 1,
        }
    }
}

fn field_mapping(kind: Kind) -> Value {
    match kind {
        Kind::Date => json!({
            "type": "date",
            "format": "strict_date",
            "store": true,
        }),
        Kind::Time => json!({
            "type": "date",
            "format": "strict_time_no_millis||strict_time||strict_hour_minute_second||strict_hour_minute_second_fraction",
            "store": true,
        }),
        Kind::Timestamp => json!({
            "type": "date",
            "format": "strict_date_time_no_millis||strict_date_time",
            "store": true,
        }),
        Kind::Ip => json!({"type": "ip", "store": true}),
        Kind::Uri => json!({"type": "keyword", "store": true}),
        Kind::Float64 => json!({"type": "double", "store": true}),
        Kind::Int64 => json!({"type": "long", "store": true}),
        Kind::Bool => json!({"type": "boolean", "store": true}),
        Kind::String => json!({
            "type": "text",
            "store": true,
            "copy_to": "fulltext",
            "fields": {"raw": {"type": "keyword"}},
        }),
    }
}

/// Build the index creation body (settings + mappings) for the given field
/// names. Every string column copies into a synthesized `fulltext` field,
/// and an `@timestamp` date field is always present for sinks that
/// synthesize a timestamp.
pub fn index_body<I, S>(opts: &EsIndexOptions, field_names: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut properties = Map::new();
    for name in field_names {
        let name = name.as_ref();
        properties.insert(name.to_string(), field_mapping(guess_type(name)));
    }
    properties.insert("@timestamp".to_string(), field_mapping(Kind::Timestamp));
    properties.insert("fulltext".to_string(), json!({"type": "text", "store": true}));

    json!({
        "settings": {
            "number_of_shards": opts.shards,
            "number_of_replicas": opts.replicas,
            "shard": {"check_on_startup": opts.check_on_startup},
            "refresh_interval": format!("{}s", opts.refresh_interval_secs),
        },
        "mappings": {
            "accesslogs": {"properties": properties},
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_body_mappings() {
        let body = index_body(&EsIndexOptions::default(), ["date", "c-ip", "cs-method"]);
        let props = &body["mappings"]["accesslogs"]["properties"];
        assert_eq!(props["c-ip"]["type"], "ip");
        assert_eq!(props["date"]["format"], "strict_date");
        assert_eq!(props["cs-method"]["copy_to"], "fulltext");
        assert_eq!(props["cs-method"]["fields"]["raw"]["type"], "keyword");
        assert_eq!(props["@timestamp"]["type"], "date");
        assert_eq!(props["fulltext"]["type"], "text");
    }

    #[test]
    fn test_index_body_settings() {
        let opts = EsIndexOptions {
            shards: 3,
            replicas: 2,
            check_on_startup: true,
            refresh_interval_secs: 30,
        };
        let body = index_body(&opts, ["date"]);
        assert_eq!(body["settings"]["number_of_shards"], 3);
        assert_eq!(body["settings"]["number_of_replicas"], 2);
        assert_eq!(body["settings"]["shard"]["check_on_startup"], true);
        assert_eq!(body["settings"]["refresh_interval"], "30s");
    }
}
