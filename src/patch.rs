//! Conflict resolution for one pass's edits, and patch application.

use crate::edit::{Edit, EditError};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

/// How edits with identical ranges are ordered before acceptance.
///
/// Edits are always ordered by start offset and then by end offset; this
/// policy only decides among edits whose ranges are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Earlier-registered rule wins.
    #[default]
    RegistrationOrder,
    /// Later-registered rule wins.
    ReverseRegistrationOrder,
    /// Higher rule priority wins, then earlier registration.
    Priority,
}

impl TieBreak {
    fn compare(self, a: &Edit, b: &Edit) -> Ordering {
        match self {
            TieBreak::RegistrationOrder => a.rule_index.cmp(&b.rule_index),
            TieBreak::ReverseRegistrationOrder => b.rule_index.cmp(&a.rule_index),
            TieBreak::Priority => Reverse(a.priority)
                .cmp(&Reverse(b.priority))
                .then(a.rule_index.cmp(&b.rule_index)),
        }
    }
}

/// Accepted edits for one pass; no two of them conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    edits: Vec<Edit>,
}

impl Patch {
    pub(crate) fn new(edits: Vec<Edit>) -> Self {
        Self { edits }
    }

    /// Edits in ascending start order.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit to `source` in one left-to-right pass.
    ///
    /// Offsets are always read against the original `source`, so earlier
    /// replacements cannot shift later ones.
    pub fn apply(&self, source: &str) -> Result<String, EditError> {
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        let mut previous: Option<&Edit> = None;

        for edit in &self.edits {
            if let Some(prev) = previous.filter(|prev| prev.conflicts_with(edit) || edit.range.start < cursor) {
                return Err(EditError::Overlap {
                    first: prev.range,
                    second: edit.range,
                });
            }
            edit.validate(source)?;
            out.push_str(&source[cursor..edit.range.start]);
            out.push_str(&edit.new_text);
            cursor = edit.range.end;
            previous = Some(edit);
        }

        out.push_str(&source[cursor..]);
        Ok(out)
    }
}

/// Outcome of resolving one pass's edits.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub patch: Patch,
    /// Edits left for a later pass, where they are recomputed from scratch.
    pub deferred: Vec<Edit>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    tie_break: TieBreak,
}

impl Resolver {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Sort by start, then end, then the tie-break policy, and accept each
    /// edit that does not conflict with the last accepted one.
    pub fn resolve(&self, mut edits: Vec<Edit>) -> Resolution {
        edits.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then(a.range.end.cmp(&b.range.end))
                .then_with(|| self.tie_break.compare(a, b))
        });

        let mut accepted: Vec<Edit> = Vec::with_capacity(edits.len());
        let mut deferred = Vec::new();
        for edit in edits {
            match accepted.last() {
                Some(last) if last.conflicts_with(&edit) => {
                    tracing::debug!(
                        rule = %edit.rule,
                        range = %edit.range,
                        blocked_by = %last.rule,
                        "deferring conflicting edit"
                    );
                    deferred.push(edit);
                }
                _ => accepted.push(edit),
            }
        }

        Resolution {
            patch: Patch::new(accepted),
            deferred,
        }
    }
}
