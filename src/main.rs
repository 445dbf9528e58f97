//! Command-line interface for the W3C extended log parser.
//!
//! Subcommands cover parsing to JSON Lines / CSV, bulk conversion of log
//! directories, and offline Postgres / Elasticsearch schema generation.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use w3clog_parser::formats::elastic::{self, EsIndexOptions};
use w3clog_parser::formats::postgres;
use w3clog_parser::{guess_type, FileParser, Line};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Parse W3C Extended Log Format access logs",
    long_about = "Parse W3C Extended Log Format access logs into typed records,\n\
                  export them as JSON Lines or CSV, and generate matching\n\
                  Postgres and Elasticsearch schemas."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Parse access log files and print the lines as JSON or CSV")]
    Parse {
        /// The files to parse
        #[arg(long = "filename", required = true)]
        filenames: Vec<String>,

        /// Print the logs as JSON (the default)
        #[arg(long)]
        json: bool,

        /// Print the logs as CSV
        #[arg(long)]
        csv: bool,
    },

    #[command(about = "Parse every log file under an input directory")]
    ParseDir {
        /// Input directory
        #[arg(long)]
        input: String,

        /// Output directory (stdout when omitted)
        #[arg(long)]
        output: Option<String>,

        /// Only select input files with this extension
        #[arg(long, default_value = "log")]
        ext: String,

        /// Print the logs as JSON (the default)
        #[arg(long)]
        json: bool,

        /// Print the logs as CSV
        #[arg(long)]
        csv: bool,

        /// When exporting to CSV, suffix the field names with the data type
        #[arg(long)]
        suffix: bool,
    },

    #[command(about = "Print a CREATE TABLE statement with an adequate schema for access logs")]
    PgSchema {
        /// Space-separated field names that will be present in the logs
        #[arg(long)]
        fields: Option<String>,

        /// Log file from which to extract the field names
        #[arg(long)]
        filename: Option<String>,

        /// Name of the table to be created
        #[arg(long, default_value = "accesslogs")]
        tablename: String,
    },

    #[command(about = "Print an Elasticsearch mapping that can store access logs")]
    EsSchema {
        /// Space-separated field names that will be present in the logs
        #[arg(long)]
        fields: Option<String>,

        /// Log file from which to extract the field names
        #[arg(long)]
        filename: Option<String>,

        /// Number of shards for the index
        #[arg(long, default_value_t = 1)]
        shards: u32,

        /// Number of replicas for the index
        #[arg(long, default_value_t = 0)]
        replicas: u32,

        /// Whether to check the index on startup
        #[arg(long)]
        check: bool,

        /// Refresh interval in seconds
        #[arg(long, default_value_t = 1)]
        refresh: u64,
    },

    #[command(about = "Count unique lines per day across a directory of logs")]
    Unique {
        /// Input directory
        #[arg(long)]
        input: String,

        /// Only select input files with this extension
        #[arg(long, default_value = "log")]
        ext: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp(None)
        .init();

    match Cli::parse().command {
        Commands::Parse {
            filenames,
            json,
            csv,
        } => cmd_parse(filenames, as_json(json, csv)?),
        Commands::ParseDir {
            input,
            output,
            ext,
            json,
            csv,
            suffix,
        } => cmd_parse_dir(input, output, ext, as_json(json, csv)?, suffix),
        Commands::PgSchema {
            fields,
            filename,
            tablename,
        } => cmd_pg_schema(fields, filename, tablename),
        Commands::EsSchema {
            fields,
            filename,
            shards,
            replicas,
            check,
            refresh,
        } => cmd_es_schema(
            fields,
            filename,
            EsIndexOptions {
                shards,
                replicas,
                check_on_startup: check,
                refresh_interval_secs: refresh,
            },
        ),
        Commands::Unique { input, ext } => cmd_unique(input, ext),
    }
}

/// JSON is the default; `--json` and `--csv` are exclusive.
fn as_json(json: bool, csv: bool) -> Result<bool> {
    if json && csv {
        bail!("--json and --csv are exclusive");
    }
    Ok(!csv)
}

/// Rewrite a field name for a CSV header cell.
fn sanitize(header: &str) -> String {
    header.replace(['(', ')', '-'], "_")
}

/// Parse one stream and write every record to `out`.
fn parse_to<R: Read, W: Write>(reader: R, out: &mut W, json: bool, suffix: bool) -> Result<()> {
    let mut parser = FileParser::new(BufReader::new(reader));
    parser.parse_header()?;
    if !json {
        let header = parser
            .field_names()
            .map(|name| {
                if suffix {
                    format!("{}_{}", sanitize(name), guess_type(name))
                } else {
                    sanitize(name)
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}", header)?;
    }
    let mut recycled: Option<Line> = None;
    while let Some(line) = parser.next_to(recycled.take())? {
        line.write_to(out, json)?;
        recycled = Some(line);
    }
    Ok(())
}

fn cmd_parse(filenames: Vec<String>, json: bool) -> Result<()> {
    let stdout = io::stdout();
    for fname in filenames {
        let fname = fname.trim();
        let file = match File::open(fname) {
            Ok(f) => f,
            Err(e) => {
                error!("error opening '{}': {}", fname, e);
                continue;
            }
        };
        let mut out = BufWriter::new(stdout.lock());
        if let Err(e) = parse_to(file, &mut out, json, false) {
            error!("error parsing '{}': {}", fname, e);
        }
        out.flush()?;
    }
    Ok(())
}

/// Regular files under `root` carrying the given extension, sorted.
fn find_files(root: &Path, ext: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            ext.is_empty() || path.extension().and_then(|e| e.to_str()) == Some(ext)
        })
        .collect();
    files.sort();
    files
}

fn cmd_parse_dir(
    input: String,
    output: Option<String>,
    ext: String,
    json: bool,
    suffix: bool,
) -> Result<()> {
    let input = fs::canonicalize(&input).with_context(|| format!("opening '{}'", input))?;
    if let Some(out) = &output {
        if let Ok(meta) = fs::metadata(out) {
            if !meta.is_dir() {
                bail!("output is not a directory");
            }
        }
    }
    let files = find_files(&input, &ext);
    if files.is_empty() {
        info!("no file to process");
        return Ok(());
    }
    info!("will process {} file(s)", files.len());

    for path in &files {
        info!("processing: {}", path.display());
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("error opening '{}': {}", path.display(), e);
                continue;
            }
        };
        let result = match &output {
            None => {
                let stdout = io::stdout();
                let mut out = BufWriter::new(stdout.lock());
                let r = parse_to(file, &mut out, json, suffix);
                out.flush()?;
                r
            }
            Some(outdir) => {
                let rel = path.strip_prefix(&input).unwrap_or(path);
                let out_path = PathBuf::from(format!(
                    "{}.{}",
                    Path::new(outdir).join(rel).display(),
                    if json { "jsonlines" } else { "csv" }
                ));
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = BufWriter::new(File::create(&out_path)?);
                let r = parse_to(file, &mut out, json, suffix);
                out.flush()?;
                if r.is_ok() {
                    info!("written: {}", out_path.display());
                }
                r
            }
        };
        if let Err(e) = result {
            error!("error parsing '{}': {}", path.display(), e);
        }
    }
    Ok(())
}

/// Field names from `--fields` or from a log file's header; the two options
/// are exclusive.
fn schema_field_names(fields: Option<String>, filename: Option<String>) -> Result<Vec<String>> {
    let names = match (fields, filename) {
        (Some(_), Some(_)) => bail!("--fields and --filename are exclusive"),
        (None, None) => bail!("specify fields with --fields or --filename"),
        (Some(line), None) => line.split_whitespace().map(String::from).collect(),
        (None, Some(fname)) => {
            let file =
                File::open(&fname).with_context(|| format!("opening '{}'", fname))?;
            let mut parser = FileParser::new(BufReader::new(file));
            parser.parse_header()?;
            parser.field_names().map(String::from).collect::<Vec<_>>()
        }
    };
    if names.is_empty() {
        bail!("field names not found");
    }
    Ok(names)
}

fn valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn cmd_pg_schema(
    fields: Option<String>,
    filename: Option<String>,
    tablename: String,
) -> Result<()> {
    let tablename = tablename.trim();
    if !valid_table_name(tablename) {
        bail!("invalid table name");
    }
    let names = schema_field_names(fields, filename)?;
    println!("{}", postgres::create_table_ddl(tablename, &names));
    Ok(())
}

fn cmd_es_schema(
    fields: Option<String>,
    filename: Option<String>,
    opts: EsIndexOptions,
) -> Result<()> {
    let names = schema_field_names(fields, filename)?;
    let body = elastic::index_body(&opts, &names);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn cmd_unique(input: String, ext: String) -> Result<()> {
    let input = fs::canonicalize(&input).with_context(|| format!("opening '{}'", input))?;
    let files = find_files(&input, &ext);
    if files.is_empty() {
        info!("no file to process");
        return Ok(());
    }

    // date => hashes of the lines seen on that date
    let mut uniques: HashMap<String, HashSet<u64>> = HashMap::new();
    // date => number of lines
    let mut totals: HashMap<String, u64> = HashMap::new();

    for path in &files {
        if let Err(e) = unique_file(path, &mut uniques, &mut totals) {
            error!("error processing '{}': {}", path.display(), e);
            continue;
        }
        info!(
            "{} unique lines / {}",
            count_unique(&uniques),
            count_total(&totals)
        );
    }

    info!(
        "summary: {} unique lines / {}",
        count_unique(&uniques),
        count_total(&totals)
    );
    let mut dates: Vec<&String> = uniques.keys().collect();
    dates.sort();
    for date in dates {
        let unique = uniques[date].len() as u64;
        let total = totals[date].max(1);
        info!(
            "{}: {} unique lines / {} ({}% duplicates)",
            date,
            unique,
            total,
            100 - 100 * unique / total
        );
    }
    Ok(())
}

fn unique_file(
    path: &Path,
    uniques: &mut HashMap<String, HashSet<u64>>,
    totals: &mut HashMap<String, u64>,
) -> Result<()> {
    let file = File::open(path)?;
    let mut parser = FileParser::new(BufReader::new(file));
    parser.parse_header()?;
    let mut recycled: Option<Line> = None;
    while let Some(line) = parser.next_to(recycled.take())? {
        let date = line
            .get_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        *totals.entry(date.clone()).or_insert(0) += 1;
        let mut hasher = DefaultHasher::new();
        hasher.write(&line.to_json_vec()?);
        uniques.entry(date).or_default().insert(hasher.finish());
        recycled = Some(line);
    }
    Ok(())
}

fn count_unique(uniques: &HashMap<String, HashSet<u64>>) -> u64 {
    uniques.values().map(|h| h.len() as u64).sum()
}

fn count_total(totals: &HashMap<String, u64>) -> u64 {
    totals.values().sum()
}
