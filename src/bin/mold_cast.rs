//! mold-cast: Cast flat NDJSON records into nested documents
//!
//! Usage:
//!   # Read from file, output to stdout
//!   mold-cast records.jsonl --rules rules.json
//!
//!   # Read from stdin, output to stdout
//!   echo '{"id": 1, "address_city": "Moscow"}' | mold-cast --rules rules.json
//!
//!   # Write per-record-type files into a directory
//!   mold-cast records.jsonl --rules rules.json --output-dir ./documents
//!
//!   # Keep null/zero/empty values in the output
//!   mold-cast records.jsonl --rules rules.json --keep-empty
//!
//! The rules file is a JSON `RulesProfile`: a default rules block plus
//! per-record-type overrides.

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use mold::cast::{
    CastOptions, CompactionOptions, DocumentCaster, DocumentWriter, MultiWriter, RulesProfile,
    ValueRecord,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mold-cast")]
#[command(about = "Cast flat NDJSON records into nested documents", long_about = None)]
struct Args {
    /// Input file with one JSON record per line (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Rules file: JSON with a `default` rules block and per-type overrides
    #[arg(long, short = 'r')]
    rules: Option<String>,

    /// Record type used to resolve rules for the incoming records
    #[arg(long, default_value = "record")]
    record_type: String,

    /// Output directory for per-record-type .jsonl files
    /// If omitted, writes a single document stream to stdout
    #[arg(long, short = 'o')]
    output_dir: Option<String>,

    /// Skip related-object embedding entirely
    #[arg(long)]
    no_related: bool,

    /// Disable all compaction passes (keep null/empty/zero values)
    #[arg(long)]
    keep_empty: bool,

    /// Also drop group containers that end up empty
    #[arg(long, conflicts_with = "keep_empty")]
    drop_empty_groups: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Resolve the rules profile once, before any record is read
    let profile = match &args.rules {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .context(format!("Failed to read rules file: {}", path))?;
            serde_json::from_str::<RulesProfile>(&content)
                .context(format!("Failed to parse rules file: {}", path))?
        }
        None => RulesProfile::default(),
    };

    let mut compaction = if args.keep_empty {
        CompactionOptions::none()
    } else {
        CompactionOptions::default()
    };
    if args.drop_empty_groups {
        compaction.empty_containers = true;
    }

    let options = CastOptions {
        compaction,
        inspect_related: !args.no_related,
    };

    let caster = DocumentCaster::new(profile.compile()).with_options(options);

    let reader: Box<dyn Read> = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).context(format!("Failed to open input: {}", file_path))?,
        ))
    } else {
        Box::new(std::io::stdin())
    };

    if let Some(output_dir) = &args.output_dir {
        let mut writer = MultiWriter::new(output_dir)?;
        process_reader(reader, &caster, &args.record_type, |record_type, doc| {
            writer.write_document(record_type, doc)
        })?;
        writer.flush()?;
    } else {
        let stdout = std::io::stdout();
        let mut writer = DocumentWriter::new(stdout.lock());
        process_reader(reader, &caster, &args.record_type, |_, doc| {
            writer.write_document(doc)
        })?;
        writer.flush()?;
    }

    Ok(())
}

/// Parse the input with SIMD-accelerated JSON parsing when possible and cast
/// every record through the sink
fn process_reader(
    reader: Box<dyn Read>,
    caster: &DocumentCaster,
    record_type: &str,
    mut sink: impl FnMut(&str, &mold::cast::Document) -> Result<()>,
) -> Result<()> {
    // Read entire input for SIMD parsing
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content)?;

    // Try SIMD parsing first (faster) - use OwnedValue to avoid borrow issues
    match simd_json::to_owned_value(&mut content.clone()) {
        Ok(simd_json::OwnedValue::Array(arr)) => {
            // JSON array of records
            for elem in arr.iter() {
                let json_str = simd_json::to_string(elem)?;
                let value: Value = serde_json::from_str(&json_str)?;
                cast_one(caster, record_type, value, &mut sink)?;
            }
        }
        Ok(elem) => {
            // Single JSON record
            let json_str = simd_json::to_string(&elem)?;
            let value: Value = serde_json::from_str(&json_str)?;
            cast_one(caster, record_type, value, &mut sink)?;
        }
        Err(_) => {
            // Fallback to serde_json for NDJSON input
            let content_str = String::from_utf8_lossy(&content);
            for line in content_str.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line)
                    .context("Failed to parse NDJSON line")?;
                cast_one(caster, record_type, value, &mut sink)?;
            }
        }
    }

    Ok(())
}

fn cast_one(
    caster: &DocumentCaster,
    record_type: &str,
    value: Value,
    sink: &mut impl FnMut(&str, &mold::cast::Document) -> Result<()>,
) -> Result<()> {
    let record = ValueRecord::from_value(record_type, value);
    let doc = caster.cast(&record);
    sink(record_type, &doc)
}
