//! Related-object embedding
//!
//! Walks a record's relation descriptors and embeds the related records'
//! documents. A visited-identity set is threaded through every recursive
//! call: a record already on the current path is embedded as a lightweight
//! identity reference instead of a full document, which turns cyclic relation
//! graphs into bounded traversals. Nested documents are cast with relation
//! inspection disabled, so embedding expands exactly one level.
//!
//! No relation failure aborts the document: unsupported cardinalities and
//! unresolvable accessor names degrade to omission with a diagnostic.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::cast::caster::DocumentCaster;
use crate::cast::types::{Document, Record, RecordId, RelationKind, RelationTarget};

/// Recursion state handed to embedding code, including custom
/// [`RelatedFieldStrategy`](crate::cast::types::RelatedFieldStrategy)
/// implementations.
pub struct EmbedContext<'a> {
    caster: &'a DocumentCaster,
    visited: &'a mut HashSet<RecordId>,
}

impl<'a> EmbedContext<'a> {
    pub(crate) fn new(caster: &'a DocumentCaster, visited: &'a mut HashSet<RecordId>) -> Self {
        EmbedContext { caster, visited }
    }

    /// Cast a related record with relation inspection disabled.
    ///
    /// A record whose identity is already on the current path comes back as
    /// `{"id": <identity>}` instead of a full document.
    pub fn cast_nested(&mut self, record: &dyn Record) -> Value {
        let id = record.identity();
        if self.visited.contains(&id) {
            warn!(
                record_type = record.record_type(),
                id = %id,
                "cyclic relation, embedding identity reference"
            );
            return identity_reference(&id);
        }

        self.visited.insert(id.clone());
        let doc = self.caster.cast_guarded(record, false, self.visited);
        self.visited.remove(&id);
        Value::Object(doc)
    }
}

fn identity_reference(id: &RecordId) -> Value {
    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(id.0.clone()));
    Value::Object(out)
}

/// Default embedding: one document (or sequence of documents) per supported
/// relation, keyed by the relation's accessor name
pub(crate) fn embed_default(record: &dyn Record, doc: &mut Document, ctx: &mut EmbedContext<'_>) {
    for relation in record.relations() {
        if relation.name.is_empty() {
            debug!(
                kind = ?relation.kind,
                record_type = record.record_type(),
                "relation without a usable accessor name, skipping"
            );
            continue;
        }

        match (relation.kind, relation.target) {
            (RelationKind::ManyToMany, _) => {
                warn!(
                    relation = %relation.name,
                    "many-to-many relations are not supported, skipping"
                );
            }
            (RelationKind::OneToMany, RelationTarget::Many(children)) => {
                let docs: Vec<Value> = children
                    .into_iter()
                    .map(|child| ctx.cast_nested(child))
                    .collect();
                doc.insert(relation.name, Value::Array(docs));
            }
            (RelationKind::ManyToOne | RelationKind::OneToOne, RelationTarget::One(child)) => {
                let nested = ctx.cast_nested(child);
                doc.insert(relation.name, nested);
            }
            (kind, _) => {
                warn!(
                    relation = %relation.name,
                    ?kind,
                    "relation target does not match its cardinality, skipping"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::caster::DocumentCaster;
    use crate::cast::profile::CompiledRules;
    use crate::cast::rules::GroupingRules;
    use crate::cast::types::{Field, RelationDescriptor};
    use crate::cast::value_record::ValueRecord;
    use serde_json::json;

    fn caster() -> DocumentCaster {
        DocumentCaster::new(CompiledRules::from(GroupingRules::default()))
    }

    #[test]
    fn one_to_many_embeds_each_child() {
        let record = ValueRecord::from_value(
            "order",
            json!({
                "id": 1,
                "order_positions": [
                    {"id": 10, "quantity": 2},
                    {"id": 11, "quantity": 1},
                    {"id": 12, "quantity": 5}
                ]
            }),
        );

        let doc = caster().cast(&record);

        assert_eq!(
            Value::Object(doc),
            json!({
                "id": 1,
                "order_positions": [
                    {"id": 10, "quantity": 2},
                    {"id": 11, "quantity": 1},
                    {"id": 12, "quantity": 5}
                ]
            })
        );
    }

    #[test]
    fn nested_documents_do_not_expand_their_own_relations() {
        let record = ValueRecord::from_value(
            "customer",
            json!({
                "id": 1,
                "orders": [
                    {"id": 10, "positions": [{"id": 100, "quantity": 2}]}
                ]
            }),
        );

        let doc = caster().cast(&record);

        // The grandchild relation is not expanded inside the child document.
        assert_eq!(
            Value::Object(doc),
            json!({"id": 1, "orders": [{"id": 10}]})
        );
    }

    #[test]
    fn one_to_one_embeds_single_document() {
        let record = ValueRecord::from_value(
            "order",
            json!({"id": 1, "customer": {"id": 7, "name": "Alice"}}),
        );

        let doc = caster().cast(&record);

        assert_eq!(
            Value::Object(doc),
            json!({"id": 1, "customer": {"id": 7, "name": "Alice"}})
        );
    }

    /// Record with a relation pointing back at itself
    struct SelfReferential;

    impl Record for SelfReferential {
        fn record_type(&self) -> &str {
            "node"
        }
        fn identity(&self) -> RecordId {
            RecordId::new("node:1")
        }
        fn fields(&self) -> Vec<Field> {
            vec![Field::new("id", json!(1))]
        }
        fn relations(&self) -> Vec<RelationDescriptor<'_>> {
            vec![RelationDescriptor {
                kind: RelationKind::OneToOne,
                name: "parent".to_string(),
                target: RelationTarget::One(self),
            }]
        }
    }

    #[test]
    fn cycle_falls_back_to_identity_reference() {
        let doc = caster().cast(&SelfReferential);

        assert_eq!(
            Value::Object(doc),
            json!({"id": 1, "parent": {"id": "node:1"}})
        );
    }

    /// Relation kinds the embedder refuses or skips
    struct Awkward {
        children: Vec<ValueRecord>,
    }

    impl Record for Awkward {
        fn record_type(&self) -> &str {
            "awkward"
        }
        fn identity(&self) -> RecordId {
            RecordId::new("awkward:1")
        }
        fn fields(&self) -> Vec<Field> {
            vec![Field::new("id", json!(1))]
        }
        fn relations(&self) -> Vec<RelationDescriptor<'_>> {
            vec![
                RelationDescriptor {
                    kind: RelationKind::ManyToMany,
                    name: "tags".to_string(),
                    target: RelationTarget::Many(
                        self.children.iter().map(|c| c as &dyn Record).collect(),
                    ),
                },
                RelationDescriptor {
                    kind: RelationKind::OneToMany,
                    name: String::new(),
                    target: RelationTarget::Many(
                        self.children.iter().map(|c| c as &dyn Record).collect(),
                    ),
                },
                RelationDescriptor {
                    kind: RelationKind::OneToOne,
                    name: "broken".to_string(),
                    target: RelationTarget::Many(Vec::new()),
                },
            ]
        }
    }

    #[test]
    fn unsupported_relations_are_omitted_not_fatal() {
        let record = Awkward {
            children: vec![ValueRecord::from_value("tag", json!({"id": 5}))],
        };

        let doc = caster().cast(&record);

        // Only the own field survives; every awkward relation is omitted.
        assert_eq!(Value::Object(doc), json!({"id": 1}));
    }
}
