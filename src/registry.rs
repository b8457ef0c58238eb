//! Rule registration and the kind-to-rules dispatch table.

use crate::cache;
use crate::pattern::{Captures, Pattern, PatternError};
use crate::rule::{Finding, FnRule, Rule, RuleId};
use crate::ts::Node;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("rule `{rule}` has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("rule `{rule}` pattern `{pattern}` matches only {pattern_kinds:?}, which the rule never receives (it asks for {kinds:?})")]
    UnreachablePattern {
        rule: String,
        pattern: String,
        pattern_kinds: Vec<String>,
        kinds: Vec<String>,
    },

    #[error("rule `{rule}` is registered more than once")]
    DuplicateRule { rule: String },

    #[error("rule id must not be empty")]
    EmptyRuleId,
}

/// A rule plus what registration computed for it.
pub struct RegisteredRule {
    rule: Box<dyn Rule>,
    id: RuleId,
    index: usize,
    patterns: Vec<Arc<Pattern>>,
}

impl RegisteredRule {
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// Position in registration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }

    pub fn patterns(&self) -> &[Arc<Pattern>] {
        &self.patterns
    }

    /// Run the rule against one node. The first matching pattern supplies the
    /// captures; a rule without patterns sees every node it is offered.
    pub fn evaluate(&self, node: &Node<'_>) -> Option<Finding> {
        if self.patterns.is_empty() {
            return self.rule.check(node, &Captures::new());
        }
        let captures = self.patterns.iter().find_map(|p| p.matches(*node))?;
        self.rule.check(node, &captures)
    }
}

/// Immutable rule set shared by every dispatch pass.
pub struct Registry {
    rules: Vec<RegisteredRule>,
    by_kind: HashMap<&'static str, Vec<usize>>,
    every_kind: Vec<usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding the rules shipped with this crate.
    pub fn bundled() -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        for rule in crate::rules::bundled() {
            builder = builder.register_boxed(rule)?;
        }
        Ok(builder.build())
    }

    pub fn rules(&self) -> &[RegisteredRule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&RegisteredRule> {
        self.rules.get(index)
    }

    /// Indices of rules interested in `kind`, in registration order.
    ///
    /// Kinds no rule names get the rules that want every kind.
    pub fn rules_for(&self, kind: &str) -> &[usize] {
        self.by_kind
            .get(kind)
            .map_or(self.every_kind.as_slice(), Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    rules: Vec<RegisteredRule>,
    seen: HashSet<String>,
}

impl RegistryBuilder {
    pub fn register<R: Rule + 'static>(self, rule: R) -> Result<Self, RegistryError> {
        self.register_boxed(Box::new(rule))
    }

    /// Register a closure for `kinds`, gated by `patterns`.
    pub fn register_fn<F>(
        self,
        id: &str,
        kinds: &[&'static str],
        patterns: &[&'static str],
        callback: F,
    ) -> Result<Self, RegistryError>
    where
        F: Fn(&Node<'_>, &Captures<'_>) -> Option<Finding> + Send + Sync + 'static,
    {
        self.register(FnRule::new(id, kinds, patterns, callback))
    }

    /// Compile the rule's patterns and append it. Any invalid pattern fails
    /// here, before a single source is analyzed.
    pub fn register_boxed(mut self, rule: Box<dyn Rule>) -> Result<Self, RegistryError> {
        let id = rule.id().to_string();
        if id.is_empty() {
            return Err(RegistryError::EmptyRuleId);
        }
        if !self.seen.insert(id.clone()) {
            return Err(RegistryError::DuplicateRule { rule: id });
        }

        let patterns = rule
            .patterns()
            .iter()
            .map(|text| {
                cache::get_or_compile_pattern(text).map_err(|source| {
                    RegistryError::InvalidPattern {
                        rule: id.clone(),
                        pattern: (*text).to_string(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let kinds = rule.interested_kinds();
        if !kinds.is_empty() {
            for pattern in &patterns {
                let Some(pattern_kinds) = pattern.root_kinds() else {
                    continue;
                };
                if !pattern_kinds.iter().any(|kind| kinds.iter().any(|k| k == kind)) {
                    return Err(RegistryError::UnreachablePattern {
                        rule: id,
                        pattern: pattern.source().to_string(),
                        pattern_kinds: pattern_kinds.iter().map(|k| k.to_string()).collect(),
                        kinds: kinds.iter().map(|k| k.to_string()).collect(),
                    });
                }
            }
        }

        tracing::debug!(
            rule = %id,
            kinds = ?rule.interested_kinds(),
            patterns = patterns.len(),
            "registered rule"
        );

        let index = self.rules.len();
        self.rules.push(RegisteredRule {
            id: RuleId::new(&id),
            rule,
            index,
            patterns,
        });
        Ok(self)
    }

    pub fn build(self) -> Registry {
        let mut by_kind: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut every_kind = Vec::new();

        for registered in &self.rules {
            let kinds = registered.rule.interested_kinds();
            if kinds.is_empty() {
                every_kind.push(registered.index);
                continue;
            }
            for kind in kinds {
                let slot = by_kind.entry(*kind).or_default();
                if slot.last() != Some(&registered.index) {
                    slot.push(registered.index);
                }
            }
        }

        // Each slot also carries the every-kind rules, merged by index
        if !every_kind.is_empty() {
            for slot in by_kind.values_mut() {
                slot.extend_from_slice(&every_kind);
                slot.sort_unstable();
            }
        }

        Registry {
            rules: self.rules,
            by_kind,
            every_kind,
        }
    }
}
