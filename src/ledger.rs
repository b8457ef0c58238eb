//! Per-pass record of offenses, proposed edits, and rule faults.

use crate::edit::Edit;
use crate::rule::{RuleId, Severity};
use crate::span::Span;
use serde::Serialize;

/// One reported violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offense {
    pub rule: RuleId,
    pub range: Span,
    pub message: String,
    pub severity: Severity,
    pub correctable: bool,
}

/// One-based line and column (in bytes) of an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Offense {
    /// Line and column where the offense starts in `source`.
    pub fn location(&self, source: &str) -> Location {
        let before = &source.as_bytes()[..self.range.start.min(source.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        Location {
            line,
            column: before.len() - line_start + 1,
        }
    }

    fn sort_key(&self) -> (usize, usize, &RuleId, &str) {
        (self.range.start, self.range.end, &self.rule, &self.message)
    }
}

/// A rule callback that panicked or reported outside its node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFault {
    pub rule: RuleId,
    /// Range of the node being checked when the fault happened.
    pub node: Span,
    pub reason: String,
}

/// Findings of one dispatch pass over one buffer.
///
/// Offenses are never merged; identical offenses from different rules are
/// both kept.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    offenses: Vec<Offense>,
    edits: Vec<Edit>,
    faults: Vec<RuleFault>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an offense and, when correctable, the edit that fixes it.
    pub fn record(&mut self, offense: Offense, edit: Option<Edit>) {
        debug_assert_eq!(offense.correctable, edit.is_some());
        self.offenses.push(offense);
        if let Some(edit) = edit {
            self.edits.push(edit);
        }
    }

    pub fn record_fault(&mut self, fault: RuleFault) {
        self.faults.push(fault);
    }

    /// Offenses in recording (traversal) order.
    pub fn offenses(&self) -> &[Offense] {
        &self.offenses
    }

    /// Offenses ordered by range, then rule id, then message, independent of
    /// registration order.
    pub fn sorted_offenses(&self) -> Vec<Offense> {
        let mut sorted = self.offenses.clone();
        sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        sorted
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn faults(&self) -> &[RuleFault] {
        &self.faults
    }

    pub fn has_correctable(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.offenses.is_empty()
    }

    /// Split into sorted offenses, proposed edits, and faults.
    pub fn into_parts(self) -> (Vec<Offense>, Vec<Edit>, Vec<RuleFault>) {
        let mut offenses = self.offenses;
        offenses.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        (offenses, self.edits, self.faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offense(rule: &str, start: usize, end: usize) -> Offense {
        Offense {
            rule: RuleId::new(rule),
            range: Span::new(start, end),
            message: "m".into(),
            severity: Severity::Convention,
            correctable: false,
        }
    }

    #[test]
    fn identical_offenses_are_both_kept() {
        let mut ledger = Ledger::new();
        ledger.record(offense("A", 0, 3), None);
        ledger.record(offense("B", 0, 3), None);
        assert_eq!(ledger.offenses().len(), 2);
        assert!(!ledger.has_correctable());
    }

    #[test]
    fn sorted_offenses_ignore_recording_order() {
        let mut ledger = Ledger::new();
        ledger.record(offense("B", 4, 6), None);
        ledger.record(offense("A", 0, 9), None);
        ledger.record(offense("A", 4, 6), None);

        let order: Vec<_> = ledger
            .sorted_offenses()
            .iter()
            .map(|o| (o.rule.to_string(), o.range.start))
            .collect();
        assert_eq!(
            order,
            vec![("A".into(), 0), ("A".into(), 4), ("B".into(), 4)]
        );
    }

    #[test]
    fn location_is_one_based() {
        let source = "fn main() {\n    let x = 1;\n}\n";
        let o = offense("A", 20, 21);
        assert_eq!(o.location(source), Location { line: 2, column: 9 });
        assert_eq!(offense("A", 0, 2).location(source), Location { line: 1, column: 1 });
    }
}
