//! Per-field-kind value encoders
//!
//! Most fields go into the document as their raw value. Fields whose kind
//! needs richer treatment (timestamps, file references, data-layer-specific
//! types) are claimed by an encoder registered here. The registry is an
//! ordered list: first encoder whose capability test matches wins, and no
//! match means the raw value is used.
//!
//! Encoders are the only engine components allowed to perform I/O, and they
//! must recover their own failures into placeholder values so that one bad
//! field can never abort a whole document.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cast::types::{Field, FieldKind, Record};

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}:\d{2}(?:\.\d+)?)(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Whether a string looks like an ISO-8601 datetime or date
pub(crate) fn looks_like_timestamp(s: &str) -> bool {
    ISO_DATETIME_REGEX.is_match(s) || ISO_DATE_REGEX.is_match(s)
}

/// A pluggable encoder for one kind of field value.
///
/// Stateless with respect to calls; registries are shared read-only
/// configuration, so implementations must be `Send + Sync`.
pub trait FieldEncoder: Send + Sync {
    /// Capability test: can this encoder produce a value for the field?
    fn matches(&self, field: &Field) -> bool;

    /// Encode the field value. Failures must be converted into structured
    /// placeholder values (e.g. `{"error": "file not found"}`), never
    /// propagated.
    fn encode(&self, field: &Field, record: &dyn Record) -> Value;
}

/// Ordered encoder list; registration order is evaluation order
#[derive(Default)]
pub struct EncoderRegistry {
    encoders: Vec<Box<dyn FieldEncoder>>,
}

impl EncoderRegistry {
    /// An empty registry: every field keeps its raw value
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in timestamp and file-reference encoders
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TimestampEncoder);
        registry.register(FileRefEncoder::new());
        registry
    }

    pub fn register(&mut self, encoder: impl FieldEncoder + 'static) -> &mut Self {
        self.encoders.push(Box::new(encoder));
        self
    }

    /// Encoded value from the first matching encoder, or `None` when no
    /// registered encoder claims the field
    pub fn dispatch(&self, field: &Field, record: &dyn Record) -> Option<Value> {
        self.encoders
            .iter()
            .find(|encoder| encoder.matches(field))
            .map(|encoder| encoder.encode(field, record))
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

/// Splits ISO-8601 timestamp strings into their parts:
/// `{"iso": ..., "date": ..., "time": ..., "offset": ...}`.
pub struct TimestampEncoder;

impl FieldEncoder for TimestampEncoder {
    fn matches(&self, field: &Field) -> bool {
        field.kind == FieldKind::Timestamp
    }

    fn encode(&self, field: &Field, _record: &dyn Record) -> Value {
        let Some(raw) = field.value.as_str() else {
            return placeholder("invalid timestamp");
        };

        if let Some(caps) = ISO_DATETIME_REGEX.captures(raw) {
            let mut out = Map::new();
            out.insert("iso".to_string(), Value::String(raw.to_string()));
            out.insert("date".to_string(), Value::String(caps[1].to_string()));
            out.insert("time".to_string(), Value::String(caps[2].to_string()));
            if let Some(offset) = caps.get(3) {
                out.insert(
                    "offset".to_string(),
                    Value::String(offset.as_str().to_string()),
                );
            }
            return Value::Object(out);
        }

        if ISO_DATE_REGEX.is_match(raw) {
            let mut out = Map::new();
            out.insert("iso".to_string(), Value::String(raw.to_string()));
            out.insert("date".to_string(), Value::String(raw.to_string()));
            return Value::Object(out);
        }

        placeholder("invalid timestamp")
    }
}

/// Encodes file-reference fields into `{"original": path, "<version>": path}`
/// maps, deriving one path per configured version name.
///
/// With a base directory configured, the backing file is checked on disk and
/// a missing file encodes as `{"error": "file not found"}`.
pub struct FileRefEncoder {
    base_dir: Option<PathBuf>,
    versions: Vec<String>,
}

impl FileRefEncoder {
    pub fn new() -> Self {
        FileRefEncoder {
            base_dir: None,
            versions: Vec::new(),
        }
    }

    /// Check referenced files against this directory during encoding
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Derived version names (e.g. `thumbnail`, `medium`, `large`)
    pub fn with_versions(mut self, versions: Vec<String>) -> Self {
        self.versions = versions;
        self
    }

    /// `photos/cat.jpg` + `thumbnail` -> `photos/cat_thumbnail.jpg`
    fn version_path(path: &str, version: &str) -> String {
        match path.rsplit_once('.') {
            Some((stem, ext)) => format!("{}_{}.{}", stem, version, ext),
            None => format!("{}_{}", path, version),
        }
    }
}

impl Default for FileRefEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldEncoder for FileRefEncoder {
    fn matches(&self, field: &Field) -> bool {
        field.kind == FieldKind::FileRef
    }

    fn encode(&self, field: &Field, _record: &dyn Record) -> Value {
        let Some(path) = field.value.as_str() else {
            return placeholder("not a file reference");
        };

        if let Some(base) = &self.base_dir {
            if !base.join(path).exists() {
                return placeholder("file not found");
            }
        }

        let mut out = Map::new();
        out.insert("original".to_string(), Value::String(path.to_string()));
        for version in &self.versions {
            out.insert(
                version.clone(),
                Value::String(Self::version_path(path, version)),
            );
        }
        Value::Object(out)
    }
}

fn placeholder(message: &str) -> Value {
    let mut out = Map::new();
    out.insert("error".to_string(), Value::String(message.to_string()));
    Value::Object(out)
}
