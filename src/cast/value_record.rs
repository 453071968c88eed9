//! JSON-object-backed records
//!
//! `ValueRecord` adapts a plain JSON object to the [`Record`] contract so the
//! CLI and tests have a data layer to work against. Scalar members become
//! fields, arrays of objects become one-to-many relations, and nested
//! objects become one-to-one relations. ISO-looking timestamp strings are
//! tagged for the timestamp encoder; other kinds can be re-tagged by hand.

use serde_json::Value;

use crate::cast::encoders::looks_like_timestamp;
use crate::cast::types::{
    Field, FieldKind, Record, RecordId, RelationDescriptor, RelationKind, RelationTarget,
};

struct OwnedRelation {
    kind: RelationKind,
    name: String,
    children: Vec<ValueRecord>,
}

/// A record materialized from a JSON object
pub struct ValueRecord {
    record_type: String,
    id: RecordId,
    fields: Vec<Field>,
    relations: Vec<OwnedRelation>,
}

impl ValueRecord {
    /// Build a record (and its related records, recursively) from a JSON
    /// value. Non-object values produce a record with no fields.
    pub fn from_value(record_type: impl Into<String>, value: Value) -> Self {
        let mut counter = 0u64;
        Self::build(record_type.into(), value, &mut counter)
    }

    fn build(record_type: String, value: Value, counter: &mut u64) -> Self {
        let Value::Object(members) = value else {
            *counter += 1;
            return ValueRecord {
                id: RecordId::new(format!("{}:_gen_{}", record_type, counter)),
                record_type,
                fields: Vec::new(),
                relations: Vec::new(),
            };
        };

        let mut fields = Vec::new();
        let mut relations = Vec::new();

        for (name, member) in members {
            match member {
                Value::Array(items) if is_record_array(&items) => {
                    let child_type = format!("{}_{}", record_type, name);
                    let children = items
                        .into_iter()
                        .map(|item| Self::build(child_type.clone(), item, counter))
                        .collect();
                    relations.push(OwnedRelation {
                        kind: RelationKind::OneToMany,
                        name,
                        children,
                    });
                }
                Value::Object(_) => {
                    let child_type = format!("{}_{}", record_type, name);
                    let child = Self::build(child_type, member, counter);
                    relations.push(OwnedRelation {
                        kind: RelationKind::OneToOne,
                        name,
                        children: vec![child],
                    });
                }
                scalar => fields.push(tag_field(name, scalar)),
            }
        }

        let id = identity_of(&record_type, &fields, counter);
        ValueRecord {
            record_type,
            id,
            fields,
            relations,
        }
    }

    /// Re-tag a field so a specific encoder claims it
    pub fn with_field_kind(mut self, name: &str, kind: FieldKind) -> Self {
        for field in &mut self.fields {
            if field.name == name {
                field.kind = kind.clone();
            }
        }
        self
    }
}

impl Record for ValueRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn identity(&self) -> RecordId {
        self.id.clone()
    }

    fn fields(&self) -> Vec<Field> {
        self.fields.clone()
    }

    fn relations(&self) -> Vec<RelationDescriptor<'_>> {
        self.relations
            .iter()
            .map(|relation| {
                let target = match (relation.kind, relation.children.as_slice()) {
                    (RelationKind::OneToOne | RelationKind::ManyToOne, [child, ..]) => {
                        RelationTarget::One(child)
                    }
                    _ => RelationTarget::Many(
                        relation.children.iter().map(|c| c as &dyn Record).collect(),
                    ),
                };
                RelationDescriptor {
                    kind: relation.kind,
                    name: relation.name.clone(),
                    target,
                }
            })
            .collect()
    }
}

/// An array counts as related records when most of its elements are objects
fn is_record_array(items: &[Value]) -> bool {
    if items.is_empty() {
        return false;
    }
    let objects = items.iter().filter(|item| item.is_object()).count();
    objects > items.len() / 2
}

fn tag_field(name: String, value: Value) -> Field {
    let kind = match &value {
        Value::String(s) if looks_like_timestamp(s) => FieldKind::Timestamp,
        _ => FieldKind::Plain,
    };
    Field::tagged(name, value, kind)
}

/// Identity from the record's own `id` field, or a synthetic one
fn identity_of(record_type: &str, fields: &[Field], counter: &mut u64) -> RecordId {
    for field in fields {
        if field.name != "id" {
            continue;
        }
        match &field.value {
            Value::Number(n) => return RecordId::new(format!("{}:{}", record_type, n)),
            Value::String(s) => return RecordId::new(format!("{}:{}", record_type, s)),
            _ => {}
        }
    }

    *counter += 1;
    RecordId::new(format!("{}:_gen_{}", record_type, counter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_become_fields_in_order() {
        let record = ValueRecord::from_value(
            "person",
            json!({"id": 1, "name": "Alice", "tags": ["a", "b"]}),
        );

        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "tags"]);
        // A scalar array stays a plain field, not a relation.
        assert!(record.relations.is_empty());
    }

    #[test]
    fn object_arrays_become_one_to_many_relations() {
        let record = ValueRecord::from_value(
            "customer",
            json!({
                "id": 1,
                "orders": [{"id": 10}, {"id": 11}]
            }),
        );

        assert_eq!(record.relations.len(), 1);
        let relation = &record.relations[0];
        assert_eq!(relation.kind, RelationKind::OneToMany);
        assert_eq!(relation.name, "orders");
        assert_eq!(relation.children.len(), 2);
        assert_eq!(relation.children[0].record_type(), "customer_orders");
    }

    #[test]
    fn nested_objects_become_one_to_one_relations() {
        let record =
            ValueRecord::from_value("order", json!({"id": 1, "customer": {"id": 7}}));

        assert_eq!(record.relations.len(), 1);
        assert_eq!(record.relations[0].kind, RelationKind::OneToOne);

        let relations = record.relations();
        match &relations[0].target {
            RelationTarget::One(child) => assert_eq!(child.identity().0, "order_customer:7"),
            RelationTarget::Many(_) => panic!("expected a single target"),
        }
    }

    #[test]
    fn mixed_arrays_follow_the_majority() {
        let record = ValueRecord::from_value(
            "mixed",
            json!({"items": [{"id": 1}, {"id": 2}, "stray"]}),
        );
        assert_eq!(record.relations.len(), 1);

        let record = ValueRecord::from_value(
            "mixed",
            json!({"items": [{"id": 1}, "stray", "stray"]}),
        );
        assert!(record.relations.is_empty());
    }

    #[test]
    fn identity_prefers_the_id_field() {
        let record = ValueRecord::from_value("person", json!({"id": 42}));
        assert_eq!(record.identity().0, "person:42");

        let record = ValueRecord::from_value("person", json!({"id": "abc"}));
        assert_eq!(record.identity().0, "person:abc");

        let record = ValueRecord::from_value("person", json!({"name": "x"}));
        assert_eq!(record.identity().0, "person:_gen_1");
    }

    #[test]
    fn iso_strings_are_tagged_as_timestamps() {
        let record = ValueRecord::from_value(
            "event",
            json!({"starts_at": "2024-05-01T12:30:00Z", "name": "launch"}),
        );

        let starts_at = record.fields.iter().find(|f| f.name == "starts_at").unwrap();
        assert_eq!(starts_at.kind, FieldKind::Timestamp);

        let name = record.fields.iter().find(|f| f.name == "name").unwrap();
        assert_eq!(name.kind, FieldKind::Plain);
    }

    #[test]
    fn with_field_kind_retags() {
        let record = ValueRecord::from_value("doc", json!({"photo": "cat.jpg"}))
            .with_field_kind("photo", FieldKind::FileRef);

        assert_eq!(record.fields[0].kind, FieldKind::FileRef);
    }
}
