//! Record casting - shape flat records into nested documents
//!
//! This module turns flat records (named fields plus relations) into nested
//! key/value documents ready for an external serializer. Grouping rules
//! decide where each field lands, encoders handle field kinds that need more
//! than their raw value, compaction strips semantically empty entries, and
//! related records are embedded with cycle protection.

pub mod caster;
pub mod compact;
pub mod embed;
pub mod encoders;
pub mod profile;
pub mod rules;
pub mod types;
pub mod value_record;
pub mod writer;

pub use caster::DocumentCaster;
pub use compact::{is_semantically_empty, CompactionOptions};
pub use embed::EmbedContext;
pub use encoders::{EncoderRegistry, FieldEncoder, FileRefEncoder, TimestampEncoder};
pub use profile::{CompiledRules, RulesIssue, RulesOverride, RulesProfile};
pub use rules::{Destination, GroupingRules, PostfixRule, PrefixRule, RulesError};
pub use types::{
    CastOptions, Document, Field, FieldKind, PreFinishHook, Record, RecordId,
    RelatedFieldStrategy, RelationDescriptor, RelationKind, RelationTarget,
};
pub use value_record::ValueRecord;
pub use writer::{DocumentWriter, MultiWriter};
