//! Destination classification for field names
//!
//! Given a field name, `GroupingRules` decides where the field lands in the
//! output document: skipped, inside a prefix- or postfix-derived group,
//! inside an explicitly configured group, or at the top level. Precedence is
//! fixed and first match wins, so classification is deterministic even for
//! overlapping configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

fn default_separator() -> String {
    "_".to_string()
}

/// Groups every field whose name starts with `prefix` under a cleaned key.
///
/// The separator is only used to clean the group key; sub-keys are derived by
/// exact literal prefix removal, so a prefix configured without its trailing
/// separator leaves the separator on the sub-keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl PrefixRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        PrefixRule {
            prefix: prefix.into(),
            separator: default_separator(),
        }
    }

    pub fn with_separator(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        PrefixRule {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    /// Group key with the separator stripped once from the trailing edge,
    /// e.g. prefix `price_` with separator `_` becomes `price`.
    pub fn group_key(&self) -> &str {
        self.prefix
            .strip_suffix(&self.separator)
            .unwrap_or(&self.prefix)
    }
}

/// Groups every field whose name ends with `postfix`; mirror of [`PrefixRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostfixRule {
    pub postfix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl PostfixRule {
    pub fn new(postfix: impl Into<String>) -> Self {
        PostfixRule {
            postfix: postfix.into(),
            separator: default_separator(),
        }
    }

    pub fn with_separator(postfix: impl Into<String>, separator: impl Into<String>) -> Self {
        PostfixRule {
            postfix: postfix.into(),
            separator: separator.into(),
        }
    }

    /// Group key with the separator stripped once from the leading edge,
    /// e.g. postfix `_name` with separator `_` becomes `name`.
    pub fn group_key(&self) -> &str {
        self.postfix
            .strip_prefix(&self.separator)
            .unwrap_or(&self.postfix)
    }
}

/// Where a single field lands in the output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Excluded from the document entirely
    Skip,
    /// Inside a prefix-derived group, under the name minus the prefix
    Prefixed { group: String, sub_key: String },
    /// Inside a postfix-derived group, under the name minus the postfix
    Postfixed { group: String, sub_key: String },
    /// Inside an explicitly configured group, under the full field name
    Grouped { group: String },
    /// Top-level key named after the field
    TopLevel,
}

/// Configuration issue found by eager validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("group key `{key}` is produced by both a {first} rule and a {second} rule")]
    GroupKeyCollision {
        key: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("field `{field}` is listed in explicit groups `{first}` and `{second}`")]
    DuplicateGroupMember {
        field: String,
        first: String,
        second: String,
    },

    #[error("rule literal `{literal}` cleans to an empty group key")]
    EmptyGroupKey { literal: String },
}

/// Per-record-type classification rules: which fields are skipped and how the
/// rest are grouped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingRules {
    /// Field names excluded from the document
    pub skip: BTreeSet<String>,

    /// Explicit grouping: group key to member field names
    pub groups: BTreeMap<String, BTreeSet<String>>,

    /// Prefix-derived grouping, matched in configuration order
    pub prefixes: Vec<PrefixRule>,

    /// Postfix-derived grouping, matched in configuration order
    pub postfixes: Vec<PostfixRule>,
}

impl GroupingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a field name. Precedence: skip, prefix (configuration
    /// order, no longest-match), postfix, explicit group, top level.
    pub fn classify(&self, field_name: &str) -> Destination {
        if self.skip.contains(field_name) {
            return Destination::Skip;
        }

        for rule in &self.prefixes {
            if field_name.starts_with(&rule.prefix) {
                let sub_key = field_name
                    .strip_prefix(&rule.prefix)
                    .unwrap_or(field_name)
                    .to_string();
                return Destination::Prefixed {
                    group: rule.group_key().to_string(),
                    sub_key,
                };
            }
        }

        for rule in &self.postfixes {
            if field_name.ends_with(&rule.postfix) {
                let sub_key = field_name
                    .strip_suffix(&rule.postfix)
                    .unwrap_or(field_name)
                    .to_string();
                return Destination::Postfixed {
                    group: rule.group_key().to_string(),
                    sub_key,
                };
            }
        }

        for (group, members) in &self.groups {
            if members.contains(field_name) {
                return Destination::Grouped {
                    group: group.clone(),
                };
            }
        }

        Destination::TopLevel
    }

    /// Keys of the explicitly configured groups
    pub fn explicit_group_keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| k.as_str())
    }

    /// Cleaned keys of the prefix-derived groups
    pub fn prefix_group_keys(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(|r| r.group_key())
    }

    /// Cleaned keys of the postfix-derived groups
    pub fn postfix_group_keys(&self) -> impl Iterator<Item = &str> {
        self.postfixes.iter().map(|r| r.group_key())
    }

    /// Every group container key the caster pre-creates, across all three
    /// rule namespaces
    pub fn group_container_keys(&self) -> impl Iterator<Item = &str> {
        self.explicit_group_keys()
            .chain(self.prefix_group_keys())
            .chain(self.postfix_group_keys())
    }

    /// Collect every configuration issue. Classification works without
    /// validation; this exists so callers can fail at startup instead of
    /// relying on precedence to paper over a colliding setup.
    pub fn check(&self) -> Vec<RulesError> {
        let mut issues = Vec::new();

        let mut destinations: Vec<(&'static str, String, String)> = Vec::new();
        for key in self.explicit_group_keys() {
            destinations.push(("group", key.to_string(), key.to_string()));
        }
        for rule in &self.prefixes {
            destinations.push(("prefix", rule.prefix.clone(), rule.group_key().to_string()));
        }
        for rule in &self.postfixes {
            destinations.push(("postfix", rule.postfix.clone(), rule.group_key().to_string()));
        }

        let mut seen: BTreeMap<String, &'static str> = BTreeMap::new();
        for (namespace, literal, key) in destinations {
            if key.is_empty() {
                issues.push(RulesError::EmptyGroupKey { literal });
                continue;
            }
            match seen.get(&key) {
                Some(&first) => issues.push(RulesError::GroupKeyCollision {
                    key,
                    first,
                    second: namespace,
                }),
                None => {
                    seen.insert(key, namespace);
                }
            }
        }

        let mut member_of: BTreeMap<&str, &str> = BTreeMap::new();
        for (group, members) in &self.groups {
            for member in members {
                match member_of.get(member.as_str()) {
                    Some(first) => issues.push(RulesError::DuplicateGroupMember {
                        field: member.clone(),
                        first: first.to_string(),
                        second: group.clone(),
                    }),
                    None => {
                        member_of.insert(member, group);
                    }
                }
            }
        }

        issues
    }

    /// First configuration issue, if any
    pub fn validate(&self) -> Result<(), RulesError> {
        match self.check().into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> GroupingRules {
        GroupingRules {
            skip: ["created_at".to_string()].into(),
            groups: [(
                "contacts".to_string(),
                ["tel".to_string(), "email".to_string()].into(),
            )]
            .into(),
            prefixes: vec![PrefixRule::new("address_")],
            postfixes: vec![PostfixRule::new("_name")],
        }
    }

    #[test]
    fn skip_wins_over_everything() {
        let mut rules = rules();
        rules.skip.insert("address_country".to_string());

        assert_eq!(rules.classify("address_country"), Destination::Skip);
        assert_eq!(rules.classify("created_at"), Destination::Skip);
    }

    #[test]
    fn prefix_match_strips_literal_prefix() {
        let rules = rules();

        assert_eq!(
            rules.classify("address_city"),
            Destination::Prefixed {
                group: "address".to_string(),
                sub_key: "city".to_string(),
            }
        );
    }

    #[test]
    fn prefix_without_separator_keeps_separator_on_sub_key() {
        let rules = GroupingRules {
            prefixes: vec![PrefixRule::new("price")],
            ..Default::default()
        };

        // `price` cleans to `price` (no trailing separator to strip) and the
        // sub-key keeps the underscore, exactly as literal removal behaves.
        assert_eq!(
            rules.classify("price_base"),
            Destination::Prefixed {
                group: "price".to_string(),
                sub_key: "_base".to_string(),
            }
        );
    }

    #[test]
    fn first_configured_prefix_wins_over_longer_match() {
        let rules = GroupingRules {
            prefixes: vec![PrefixRule::new("a_"), PrefixRule::new("a_b_")],
            ..Default::default()
        };

        assert_eq!(
            rules.classify("a_b_c"),
            Destination::Prefixed {
                group: "a".to_string(),
                sub_key: "b_c".to_string(),
            }
        );
    }

    #[test]
    fn prefix_beats_explicit_group() {
        let mut rules = rules();
        rules
            .groups
            .get_mut("contacts")
            .unwrap()
            .insert("address_city".to_string());

        match rules.classify("address_city") {
            Destination::Prefixed { group, .. } => assert_eq!(group, "address"),
            other => panic!("expected prefix destination, got {:?}", other),
        }
    }

    #[test]
    fn postfix_beats_explicit_group() {
        let mut rules = rules();
        rules
            .groups
            .get_mut("contacts")
            .unwrap()
            .insert("first_name".to_string());

        match rules.classify("first_name") {
            Destination::Postfixed { group, sub_key } => {
                assert_eq!(group, "name");
                assert_eq!(sub_key, "first");
            }
            other => panic!("expected postfix destination, got {:?}", other),
        }
    }

    #[test]
    fn unmatched_fields_are_top_level() {
        assert_eq!(rules().classify("nickname"), Destination::TopLevel);
    }

    #[test]
    fn container_keys_cover_all_namespaces() {
        let rules = rules();
        let keys: Vec<&str> = rules.group_container_keys().collect();
        assert_eq!(keys, vec!["contacts", "address", "name"]);
    }

    #[test]
    fn check_reports_cross_namespace_collision() {
        let rules = GroupingRules {
            groups: [("address".to_string(), ["x".to_string()].into())].into(),
            prefixes: vec![PrefixRule::new("address_")],
            ..Default::default()
        };

        let issues = rules.check();
        assert_eq!(
            issues,
            vec![RulesError::GroupKeyCollision {
                key: "address".to_string(),
                first: "group",
                second: "prefix",
            }]
        );
        assert!(rules.validate().is_err());
    }

    #[test]
    fn check_reports_duplicate_group_membership() {
        let rules = GroupingRules {
            groups: [
                ("a".to_string(), ["tel".to_string()].into()),
                ("b".to_string(), ["tel".to_string()].into()),
            ]
            .into(),
            ..Default::default()
        };

        assert_eq!(
            rules.check(),
            vec![RulesError::DuplicateGroupMember {
                field: "tel".to_string(),
                first: "a".to_string(),
                second: "b".to_string(),
            }]
        );
    }

    #[test]
    fn valid_rules_pass_validation() {
        assert_eq!(rules().check(), Vec::new());
        assert!(rules().validate().is_ok());
    }

    #[test]
    fn rules_round_trip_through_serde() {
        let json = r#"{
            "skip": ["id"],
            "groups": {"contacts": ["tel", "email"]},
            "prefixes": [{"prefix": "address_"}],
            "postfixes": [{"postfix": "_name", "separator": "_"}]
        }"#;

        let rules: GroupingRules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.prefixes[0].separator, "_");
        assert_eq!(rules.classify("id"), Destination::Skip);

        let back = serde_json::to_string(&rules).unwrap();
        let again: GroupingRules = serde_json::from_str(&back).unwrap();
        assert_eq!(rules, again);
    }
}
