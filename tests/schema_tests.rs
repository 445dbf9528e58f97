mod common;

use common::LogBuilder;
use std::io::Write;
use w3clog_parser::formats::elastic::{index_body, EsIndexOptions};
use w3clog_parser::formats::postgres::{create_table_ddl, pg_key};
use w3clog_parser::{guess_type, FileParser, Kind};

// ============================================================================
// TYPE GUESSING
// ============================================================================

#[test]
fn test_guess_type_representative_names() {
    let table = [
        ("date", Kind::Date),
        ("time", Kind::Time),
        ("gmttime", Kind::Timestamp),
        ("localtime", Kind::Timestamp),
        ("c-ip", Kind::Ip),
        ("s-ip", Kind::Ip),
        ("cs-uri-stem", Kind::Uri),
        ("cs-uri-query", Kind::Uri),
        ("cs(Referer)", Kind::Uri),
        ("time-taken", Kind::Float64),
        ("sc-bytes", Kind::Int64),
        ("cs-bytes", Kind::Int64),
        ("s-port", Kind::Int64),
        ("c-port", Kind::Int64),
        ("sc-status", Kind::Int64),
        ("cached", Kind::Bool),
        ("cs-method", Kind::String),
        ("cs(User-Agent)", Kind::String),
        ("s-sitename", Kind::String),
        ("x-edge-location", Kind::String),
    ];
    for (name, expected) in table {
        assert_eq!(guess_type(name), expected, "wrong kind for {name}");
    }
}

#[test]
fn test_guess_type_is_deterministic() {
    for _ in 0..3 {
        assert_eq!(guess_type("c-ip"), Kind::Ip);
        assert_eq!(guess_type("unknown-column"), Kind::String);
    }
}

// ============================================================================
// POSTGRES DDL
// ============================================================================

#[test]
fn test_create_table_statement() {
    let ddl = create_table_ddl("accesslogs", ["date", "time", "c-ip"]);
    let expected = "CREATE TABLE accesslogs (\n    \
                    id BIGSERIAL PRIMARY KEY,\n    \
                    date DATE DEFAULT '0001-01-01',\n    \
                    time TIME WITHOUT TIME ZONE DEFAULT '00:00:00',\n    \
                    c_ip INET DEFAULT '0.0.0.0'\n);";
    assert_eq!(ddl, expected);
}

#[test]
fn test_pg_key_sanitizes_w3c_names() {
    assert_eq!(pg_key("cs(User-Agent)"), "cs$User_Agent$");
    assert_eq!(pg_key("x-edge-result-type"), "x_edge_result_type");
}

#[test]
fn test_ddl_covers_every_kind() {
    let ddl = create_table_ddl(
        "t",
        [
            "date",
            "time",
            "gmttime",
            "c-ip",
            "cs-uri-stem",
            "time-taken",
            "sc-bytes",
            "cached",
            "cs-method",
        ],
    );
    for fragment in [
        "DATE DEFAULT",
        "TIME WITHOUT TIME ZONE",
        "TIMESTAMP WITH TIME ZONE",
        "INET",
        "DOUBLE PRECISION",
        "BIGINT",
        "BOOLEAN",
        "TEXT",
    ] {
        assert!(ddl.contains(fragment), "missing {fragment} in:\n{ddl}");
    }
}

// ============================================================================
// ELASTICSEARCH MAPPING
// ============================================================================

#[test]
fn test_es_mapping_per_kind() {
    let body = index_body(
        &EsIndexOptions::default(),
        ["date", "time", "gmttime", "c-ip", "cs-uri-stem", "time-taken", "sc-bytes", "cached", "cs-method"],
    );
    let props = &body["mappings"]["accesslogs"]["properties"];
    assert_eq!(props["date"]["type"], "date");
    assert_eq!(props["date"]["format"], "strict_date");
    assert_eq!(props["gmttime"]["format"], "strict_date_time_no_millis||strict_date_time");
    assert_eq!(props["c-ip"]["type"], "ip");
    assert_eq!(props["cs-uri-stem"]["type"], "keyword");
    assert_eq!(props["time-taken"]["type"], "double");
    assert_eq!(props["sc-bytes"]["type"], "long");
    assert_eq!(props["cached"]["type"], "boolean");
    assert_eq!(props["cs-method"]["type"], "text");
    assert_eq!(props["cs-method"]["copy_to"], "fulltext");
}

#[test]
fn test_es_settings_reflect_options() {
    let body = index_body(
        &EsIndexOptions {
            shards: 5,
            replicas: 1,
            check_on_startup: false,
            refresh_interval_secs: 10,
        },
        ["date"],
    );
    assert_eq!(body["settings"]["number_of_shards"], 5);
    assert_eq!(body["settings"]["number_of_replicas"], 1);
    assert_eq!(body["settings"]["refresh_interval"], "10s");
}

// ============================================================================
// SCHEMA FROM A REAL FILE
// ============================================================================

#[test]
fn test_schema_extracted_from_file_on_disk() {
    let content = LogBuilder::new()
        .directive("Software", "proxy")
        .fields("date time c-ip sc-status")
        .line("2020-01-01 00:00:01 10.0.0.1 200")
        .build();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();

    let reader = std::fs::File::open(file.path()).unwrap();
    let mut parser = FileParser::new(reader);
    parser.parse_header().unwrap();

    let names: Vec<_> = parser.field_names().map(String::from).collect();
    assert_eq!(names, ["date", "time", "c-ip", "sc-status"]);

    let ddl = create_table_ddl("accesslogs", &names);
    assert!(ddl.contains("sc_status BIGINT DEFAULT 0"));

    let line = parser.next().unwrap().unwrap();
    assert_eq!(line.get_as_string("sc-status"), Some("200"));
    assert!(parser.next().unwrap().is_none());
}
