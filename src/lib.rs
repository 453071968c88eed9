//! # Mold - Record Casting Toolkit
//!
//! A library for casting flat records (named fields plus relations) into
//! nested key/value documents, the shape APIs like to respond with.
//!
//! ## Modules
//!
//! - **cast**: the transformation engine - grouping rules, field encoders,
//!   compaction, and related-object embedding
//!
//! ## Quick Start
//!
//! ```rust
//! use mold::cast::{DocumentCaster, GroupingRules, PrefixRule, RulesProfile, ValueRecord};
//! use serde_json::json;
//!
//! let rules = GroupingRules {
//!     prefixes: vec![PrefixRule::new("address_")],
//!     ..Default::default()
//! };
//!
//! let caster = DocumentCaster::new(RulesProfile::new(rules).compile());
//!
//! let record = ValueRecord::from_value("delivery", json!({
//!     "id": 1,
//!     "address_country": "Russia",
//!     "address_city": "Moscow"
//! }));
//!
//! let doc = caster.cast(&record);
//!
//! // doc = {"id": 1, "address": {"country": "Russia", "city": "Moscow"}}
//! assert_eq!(doc["address"]["city"], "Moscow");
//! ```
//!
//! ## Grouping
//!
//! Fields are placed by a fixed precedence: skipped names first, then
//! prefix-derived groups, postfix-derived groups, explicitly configured
//! groups, and finally the top level. Semantically empty values (null, empty
//! string, `false`, zero, empty containers) are compacted away by default;
//! each pass can be toggled per call.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{BufRead, Write};

pub mod cast;

// Re-export commonly used types for convenience
pub use cast::{
    CastOptions, CompactionOptions, Document, DocumentCaster, DocumentWriter, EncoderRegistry,
    Field, FieldEncoder, FieldKind, GroupingRules, MultiWriter, PostfixRule, PrefixRule, Record,
    RulesProfile, ValueRecord,
};

/// Main entry point: cast a stream of newline-delimited JSON records into
/// documents
pub fn cast_stream<R: BufRead, W: Write>(
    reader: R,
    writer: &mut DocumentWriter<W>,
    caster: &DocumentCaster,
    record_type: &str,
) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).context("Failed to parse JSON")?;

        let record = ValueRecord::from_value(record_type, value);
        let doc = caster.cast(&record);
        writer.write_document(&doc)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_casting() {
        let rules = GroupingRules {
            prefixes: vec![PrefixRule::new("address_")],
            ..Default::default()
        };
        let caster = DocumentCaster::new(RulesProfile::new(rules).compile());

        let input = "{\"id\": 1, \"address_city\": \"Moscow\"}\n\
                     {\"id\": 2, \"address_city\": \"Kiev\"}\n";

        let mut buffer = Vec::new();
        {
            let mut writer = DocumentWriter::new(&mut buffer);
            cast_stream(input.as_bytes(), &mut writer, &caster, "delivery").unwrap();
        }

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, json!({"id": 1, "address": {"city": "Moscow"}}));
    }
}
