//! The core document caster
//!
//! Drives one whole transformation: resolves the record type's grouping
//! rules, pre-creates group containers, places every field through the
//! classification precedence and the encoder registry, then hands the
//! document to compaction and related-object embedding.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::cast::compact;
use crate::cast::embed::{self, EmbedContext};
use crate::cast::encoders::EncoderRegistry;
use crate::cast::profile::CompiledRules;
use crate::cast::rules::Destination;
use crate::cast::types::{CastOptions, Document, Field, Record, RecordId};

/// Casts records into nested documents.
///
/// Holds read-only configuration (compiled rules, encoder registry, cast
/// options); safe to share across threads once built.
pub struct DocumentCaster {
    rules: CompiledRules,
    encoders: EncoderRegistry,
    options: CastOptions,
}

impl DocumentCaster {
    /// Caster with the built-in encoders and default options
    pub fn new(rules: CompiledRules) -> Self {
        DocumentCaster {
            rules,
            encoders: EncoderRegistry::with_defaults(),
            options: CastOptions::default(),
        }
    }

    pub fn with_encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn with_options(mut self, options: CastOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn options(&self) -> &CastOptions {
        &self.options
    }

    /// Cast a record into a document.
    ///
    /// Total: encoding failures become placeholder values and relation
    /// problems degrade to omission, so a document always comes back.
    pub fn cast(&self, record: &dyn Record) -> Document {
        let mut visited = HashSet::new();
        self.cast_guarded(record, self.options.inspect_related, &mut visited)
    }

    /// One casting pass with explicit recursion state. `inspect_related` is
    /// disabled for nested calls; `visited` carries the identities on the
    /// current relation path.
    pub(crate) fn cast_guarded(
        &self,
        record: &dyn Record,
        inspect_related: bool,
        visited: &mut HashSet<RecordId>,
    ) -> Document {
        let rules = self.rules.resolve(record.record_type());
        let mut doc = Document::new();

        // Configured groups exist before any field lands and before any
        // compaction decision.
        for key in rules.group_container_keys() {
            doc.insert(key.to_string(), Value::Object(Map::new()));
        }

        for field in record.fields() {
            match rules.classify(&field.name) {
                Destination::Skip => continue,
                Destination::Prefixed { group, sub_key }
                | Destination::Postfixed { group, sub_key } => {
                    let value = self.encode_field(&field, record);
                    insert_into_group(&mut doc, &group, sub_key, value);
                }
                Destination::Grouped { group } => {
                    let value = self.encode_field(&field, record);
                    insert_into_group(&mut doc, &group, field.name.clone(), value);
                }
                Destination::TopLevel => {
                    let value = self.encode_field(&field, record);
                    doc.insert(field.name.clone(), value);
                }
            }
        }

        compact::run(&mut doc, rules, &self.options.compaction);

        if inspect_related {
            visited.insert(record.identity());
            let mut ctx = EmbedContext::new(self, visited);
            match record.related_strategy() {
                Some(strategy) => strategy.embed(record, &mut doc, &mut ctx),
                None => embed::embed_default(record, &mut doc, &mut ctx),
            }
        }

        if let Some(hook) = record.pre_finish_hook() {
            hook.apply(&mut doc);
        }

        doc
    }

    fn encode_field(&self, field: &Field, record: &dyn Record) -> Value {
        self.encoders
            .dispatch(field, record)
            .unwrap_or_else(|| field.value.clone())
    }
}

/// Write a value under `group[sub_key]`. A destination key colliding with an
/// earlier non-group value is overwritten by a fresh container; within a
/// group, a later field mapping to an occupied sub-key overwrites it.
fn insert_into_group(doc: &mut Document, group: &str, sub_key: String, value: Value) {
    let slot = doc
        .entry(group.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(container) = slot {
        container.insert(sub_key, value);
    }
}
