use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cast::compact::CompactionOptions;
use crate::cast::embed::EmbedContext;

/// The output of a cast: a nested string-keyed document.
///
/// Values are primitives, sequences, or nested documents. A document is built
/// fresh per call and holds no reference back to the record it came from.
pub type Document = Map<String, Value>;

/// Stable identity of a record, used for cycle detection during
/// related-object embedding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type tag carried by a field. Encoder dispatch is a tag match, not
/// runtime type introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Ordinary scalar value, used as-is when no encoder claims it
    Plain,
    /// ISO-8601 timestamp string
    Timestamp,
    /// Reference to a backing file (path or URL fragment)
    FileRef,
    /// Extension point for data layers with their own field types
    Custom(String),
}

/// A named value on a record
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: Value,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Field {
            name: name.into(),
            value,
            kind: FieldKind::Plain,
        }
    }

    pub fn tagged(name: impl Into<String>, value: Value, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            value,
            kind,
        }
    }
}

/// Cardinality of a relation between records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToMany,
    ManyToOne,
    OneToOne,
    ManyToMany,
}

/// The record(s) on the far side of a relation
pub enum RelationTarget<'a> {
    One(&'a dyn Record),
    Many(Vec<&'a dyn Record>),
}

/// A relation from one record to others.
///
/// `name` is the accessor name the related documents are embedded under.
/// An empty name means the data layer could not resolve a usable inverse
/// name; such relations are skipped.
pub struct RelationDescriptor<'a> {
    pub kind: RelationKind,
    pub name: String,
    pub target: RelationTarget<'a>,
}

/// The entity being cast into a document.
///
/// Implemented by the embedding data layer; the engine never mutates a
/// record. [`crate::cast::ValueRecord`] is the bundled JSON-backed
/// implementation.
pub trait Record {
    /// Type key used to resolve per-type grouping rules
    fn record_type(&self) -> &str;

    /// Stable identity, unique within one cast call's relation graph
    fn identity(&self) -> RecordId;

    /// Own fields, in the record's natural order
    fn fields(&self) -> Vec<Field>;

    /// Relations to other records
    fn relations(&self) -> Vec<RelationDescriptor<'_>>;

    /// Replacement for the default related-object embedding, if this record
    /// provides one. Capability is declared here rather than probed per call.
    fn related_strategy(&self) -> Option<&dyn RelatedFieldStrategy> {
        None
    }

    /// Hook run on the finished document just before it is returned
    fn pre_finish_hook(&self) -> Option<&dyn PreFinishHook> {
        None
    }
}

/// Custom related-object embedding for records that opt out of the default
/// strategy. The context keeps the visited-identity set threaded, so custom
/// strategies stay cycle-safe.
pub trait RelatedFieldStrategy {
    fn embed(&self, record: &dyn Record, doc: &mut Document, ctx: &mut EmbedContext<'_>);
}

/// Final adjustment of a document before it leaves the caster
pub trait PreFinishHook {
    fn apply(&self, doc: &mut Document);
}

/// Per-call casting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastOptions {
    /// Which compaction passes run, and in what configuration
    pub compaction: CompactionOptions,

    /// Whether related objects are embedded at all
    pub inspect_related: bool,
}

impl Default for CastOptions {
    fn default() -> Self {
        CastOptions {
            compaction: CompactionOptions::default(),
            inspect_related: true,
        }
    }
}
