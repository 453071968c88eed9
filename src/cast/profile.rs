//! Rules resolution: global defaults with per-record-type overrides
//!
//! A [`RulesProfile`] is the declarative form (what a rules file contains):
//! one default [`GroupingRules`] plus per-type override blocks. Compiling it
//! composes each override with the default, parameter by parameter, so that
//! lookup during casting is a plain map access against read-only data.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::cast::rules::{GroupingRules, PostfixRule, PrefixRule, RulesError};

/// Partial rules for one record type. Each present parameter replaces the
/// default wholesale, matching how per-type settings shadow global ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesOverride {
    pub skip: Option<BTreeSet<String>>,
    pub groups: Option<BTreeMap<String, BTreeSet<String>>>,
    pub prefixes: Option<Vec<PrefixRule>>,
    pub postfixes: Option<Vec<PostfixRule>>,
}

impl RulesOverride {
    /// Compose this override over a base configuration
    pub fn apply_to(&self, base: &GroupingRules) -> GroupingRules {
        GroupingRules {
            skip: self.skip.clone().unwrap_or_else(|| base.skip.clone()),
            groups: self.groups.clone().unwrap_or_else(|| base.groups.clone()),
            prefixes: self
                .prefixes
                .clone()
                .unwrap_or_else(|| base.prefixes.clone()),
            postfixes: self
                .postfixes
                .clone()
                .unwrap_or_else(|| base.postfixes.clone()),
        }
    }
}

/// Declarative rules profile, usually loaded from a JSON rules file:
///
/// ```json
/// {
///     "default": {"skip": ["id"]},
///     "types": {
///         "customer": {"prefixes": [{"prefix": "address_"}]}
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesProfile {
    pub default: GroupingRules,
    pub types: BTreeMap<String, RulesOverride>,
}

impl RulesProfile {
    pub fn new(default: GroupingRules) -> Self {
        RulesProfile {
            default,
            types: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, record_type: impl Into<String>, rules: RulesOverride) -> Self {
        self.types.insert(record_type.into(), rules);
        self
    }

    /// Compose every override with the default. Done once at startup; the
    /// result is read-only shared configuration.
    pub fn compile(self) -> CompiledRules {
        let by_type = self
            .types
            .iter()
            .map(|(record_type, over)| (record_type.clone(), over.apply_to(&self.default)))
            .collect();

        CompiledRules {
            default: self.default,
            by_type,
        }
    }
}

/// A configuration issue, attributed to the scope it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesIssue {
    /// `"default"` or the record-type name
    pub scope: String,
    pub error: RulesError,
}

impl std::fmt::Display for RulesIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.scope, self.error)
    }
}

/// Fully resolved rules, one [`GroupingRules`] per known record type plus the
/// default for everything else
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    default: GroupingRules,
    by_type: HashMap<String, GroupingRules>,
}

impl CompiledRules {
    /// Rules for a record type, falling back to the default
    pub fn resolve(&self, record_type: &str) -> &GroupingRules {
        self.by_type.get(record_type).unwrap_or(&self.default)
    }

    /// Every configuration issue across all scopes, sorted by scope for a
    /// stable report
    pub fn check(&self) -> Vec<RulesIssue> {
        let mut issues: Vec<RulesIssue> = self
            .default
            .check()
            .into_iter()
            .map(|error| RulesIssue {
                scope: "default".to_string(),
                error,
            })
            .collect();

        let mut scopes: Vec<(&String, &GroupingRules)> = self.by_type.iter().collect();
        scopes.sort_by(|a, b| a.0.cmp(b.0));

        for (record_type, rules) in scopes {
            issues.extend(rules.check().into_iter().map(|error| RulesIssue {
                scope: record_type.clone(),
                error,
            }));
        }

        issues
    }
}

impl From<GroupingRules> for CompiledRules {
    fn from(default: GroupingRules) -> Self {
        RulesProfile::new(default).compile()
    }
}
