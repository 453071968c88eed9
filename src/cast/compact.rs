//! Document compaction: removal of semantically empty entries
//!
//! Five independently toggleable passes run in a fixed order over the
//! assembled document. "Semantically empty" follows a truthiness check, so
//! legitimate zeros and `false` values are removed too; callers who need to
//! keep them turn the relevant pass off.

use serde_json::Value;

use crate::cast::rules::GroupingRules;
use crate::cast::types::Document;

/// Which compaction passes run. Field defaults: everything on except
/// [`empty_containers`](Self::empty_containers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionOptions {
    /// Drop semantically empty top-level values (group containers exempt)
    pub top_level: bool,
    /// Drop semantically empty entries inside explicit groups
    pub explicit_groups: bool,
    /// Drop semantically empty entries inside prefix-derived groups
    pub prefix_groups: bool,
    /// Drop semantically empty entries inside postfix-derived groups
    pub postfix_groups: bool,
    /// Drop group containers that ended up empty
    pub empty_containers: bool,
}

impl Default for CompactionOptions {
    fn default() -> Self {
        CompactionOptions {
            top_level: true,
            explicit_groups: true,
            prefix_groups: true,
            postfix_groups: true,
            empty_containers: false,
        }
    }
}

impl CompactionOptions {
    /// Every pass disabled: the raw assembled document survives untouched
    pub fn none() -> Self {
        CompactionOptions {
            top_level: false,
            explicit_groups: false,
            prefix_groups: false,
            postfix_groups: false,
            empty_containers: false,
        }
    }

    /// Every pass enabled, including container removal
    pub fn all() -> Self {
        CompactionOptions {
            top_level: true,
            explicit_groups: true,
            prefix_groups: true,
            postfix_groups: true,
            empty_containers: true,
        }
    }
}

/// Truthiness-style emptiness: null, empty string, `false`, numeric zero,
/// empty array, empty object.
pub fn is_semantically_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Run the enabled passes in their fixed order
pub(crate) fn run(doc: &mut Document, rules: &GroupingRules, options: &CompactionOptions) {
    if options.top_level {
        compact_top_level(doc, rules);
    }
    if options.explicit_groups {
        for key in rules.explicit_group_keys() {
            compact_group(doc, key);
        }
    }
    if options.prefix_groups {
        for key in rules.prefix_group_keys() {
            compact_group(doc, key);
        }
    }
    if options.postfix_groups {
        for key in rules.postfix_group_keys() {
            compact_group(doc, key);
        }
    }
    if options.empty_containers {
        drop_empty_containers(doc, rules);
    }
}

/// Pass 1. Group containers are exempt here; whether a still-empty container
/// survives is pass 5's decision.
fn compact_top_level(doc: &mut Document, rules: &GroupingRules) {
    let to_clear: Vec<String> = doc
        .iter()
        .filter(|(key, value)| {
            is_semantically_empty(value)
                && !rules.group_container_keys().any(|container| container == key.as_str())
        })
        .map(|(key, _)| key.clone())
        .collect();

    for key in to_clear {
        doc.remove(&key);
    }
}

/// Passes 2-4, scoped to one group container
fn compact_group(doc: &mut Document, group_key: &str) {
    let Some(Value::Object(group)) = doc.get_mut(group_key) else {
        return;
    };

    let to_clear: Vec<String> = group
        .iter()
        .filter(|(_, value)| is_semantically_empty(value))
        .map(|(key, _)| key.clone())
        .collect();

    for key in to_clear {
        group.remove(&key);
    }
}

/// Pass 5: remove configured group containers that are now empty objects,
/// regardless of which rule namespace produced them
fn drop_empty_containers(doc: &mut Document, rules: &GroupingRules) {
    let to_clear: Vec<String> = rules
        .group_container_keys()
        .filter(|key| matches!(doc.get(*key), Some(Value::Object(o)) if o.is_empty()))
        .map(str::to_string)
        .collect();

    for key in to_clear {
        doc.remove(&key);
    }
}
