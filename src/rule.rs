//! The plugin surface: rules, findings, and closure-backed rules.

use crate::pattern::Captures;
use crate::span::Span;
use crate::ts::Node;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Rule identifier such as `Style/LenZero`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RuleId(Arc<str>);

impl RuleId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Refactor,
    #[default]
    Convention,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Refactor => "refactor",
            Severity::Convention => "convention",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Proposed replacement attached to a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: Span,
    pub text: String,
}

/// What a rule callback returns for one node.
///
/// The dispatcher stamps the rule id onto it to produce an [`Offense`]
/// and, if a replacement is present, an [`Edit`].
///
/// [`Offense`]: crate::ledger::Offense
/// [`Edit`]: crate::edit::Edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub range: Span,
    pub message: String,
    /// Overrides the rule's default severity.
    pub severity: Option<Severity>,
    pub replacement: Option<Replacement>,
}

impl Finding {
    pub fn new(range: Span, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            severity: None,
            replacement: None,
        }
    }

    /// Finding anchored on the whole of `node`.
    pub fn at(node: Node<'_>, message: impl Into<String>) -> Self {
        Self::new(node.range(), message)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Attach a correction replacing `range` with `text`.
    pub fn with_replacement(mut self, range: Span, text: impl Into<String>) -> Self {
        self.replacement = Some(Replacement {
            range,
            text: text.into(),
        });
        self
    }

    pub fn is_correctable(&self) -> bool {
        self.replacement.is_some()
    }
}

/// A pluggable check run by the dispatcher.
///
/// Rules are registered once and shared read-only across threads, so a rule
/// must not keep per-unit mutable state.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Node kinds this rule wants to see. Empty means every named node.
    fn interested_kinds(&self) -> &[&'static str];

    /// Pattern texts compiled at registration. When non-empty the rule is
    /// only called for nodes one of them matches.
    fn patterns(&self) -> &[&'static str] {
        &[]
    }

    fn severity(&self) -> Severity {
        Severity::Convention
    }

    /// Used by the `priority` tie-break policy; higher wins.
    fn priority(&self) -> i32 {
        0
    }

    fn supports_autocorrect(&self) -> bool {
        false
    }

    fn check(&self, node: &Node<'_>, captures: &Captures<'_>) -> Option<Finding>;
}

/// Adapts a closure to [`Rule`].
pub struct FnRule<F> {
    id: String,
    kinds: Vec<&'static str>,
    patterns: Vec<&'static str>,
    severity: Severity,
    priority: i32,
    correctable: bool,
    callback: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Node<'_>, &Captures<'_>) -> Option<Finding> + Send + Sync,
{
    pub fn new(
        id: &str,
        kinds: &[&'static str],
        patterns: &[&'static str],
        callback: F,
    ) -> Self {
        Self {
            id: id.to_string(),
            kinds: kinds.to_vec(),
            patterns: patterns.to_vec(),
            severity: Severity::default(),
            priority: 0,
            correctable: true,
            callback,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn report_only(mut self) -> Self {
        self.correctable = false;
        self
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&Node<'_>, &Captures<'_>) -> Option<Finding> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &self.kinds
    }

    fn patterns(&self) -> &[&'static str] {
        &self.patterns
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn supports_autocorrect(&self) -> bool {
        self.correctable
    }

    fn check(&self, node: &Node<'_>, captures: &Captures<'_>) -> Option<Finding> {
        (self.callback)(node, captures)
    }
}
