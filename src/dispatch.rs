//! Single pre-order traversal that offers each named node to interested rules.

use crate::edit::Edit;
use crate::ledger::{Ledger, Offense, RuleFault};
use crate::registry::{RegisteredRule, Registry};
use crate::ts::{Node, ParsedSource};
use std::panic::{self, AssertUnwindSafe};

pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Run every interested rule over every named node of `parsed`.
    ///
    /// Rules run in registration order at each node. A rule that panics or
    /// reports outside the node it was given is recorded as a fault and
    /// skipped for that node only.
    pub fn dispatch(&self, parsed: &ParsedSource<'_>) -> Ledger {
        let mut ledger = Ledger::new();
        if self.registry.is_empty() {
            return ledger;
        }

        let mut cursor = parsed.tree.walk();
        loop {
            let raw = cursor.node();
            if raw.is_named() {
                self.visit(Node::new(raw, parsed.source), &mut ledger);
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return ledger;
                }
            }
        }
    }

    fn visit(&self, node: Node<'_>, ledger: &mut Ledger) {
        for &index in self.registry.rules_for(node.kind()) {
            let Some(registered) = self.registry.get(index) else {
                continue;
            };
            if let Err(reason) = self.check(registered, node, ledger) {
                tracing::warn!(
                    rule = %registered.id(),
                    node = ?node,
                    %reason,
                    "rule fault; skipping its result for this node"
                );
                ledger.record_fault(RuleFault {
                    rule: registered.id().clone(),
                    node: node.range(),
                    reason,
                });
            }
        }
    }

    fn check(
        &self,
        registered: &RegisteredRule,
        node: Node<'_>,
        ledger: &mut Ledger,
    ) -> Result<(), String> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| registered.evaluate(&node)));
        let finding = match outcome {
            Ok(Some(finding)) => finding,
            Ok(None) => return Ok(()),
            Err(payload) => return Err(panic_message(payload.as_ref())),
        };

        if !node.range().contains(finding.range) {
            return Err(format!(
                "offense range {} lies outside node range {}",
                finding.range,
                node.range()
            ));
        }

        let rule = registered.rule();
        let source = node.source();
        let edit = match finding.replacement {
            Some(replacement) if rule.supports_autocorrect() => {
                let Some(before) = source.get(replacement.range.as_range()) else {
                    return Err(format!(
                        "replacement range {} is not a valid range of the source",
                        replacement.range
                    ));
                };
                let edit = Edit::new(
                    registered.id().clone(),
                    replacement.range,
                    replacement.text,
                    before,
                )
                .with_order(registered.index(), rule.priority());
                // A replacement that changes nothing is not a correction.
                (!edit.is_noop(source)).then_some(edit)
            }
            _ => None,
        };

        ledger.record(
            Offense {
                rule: registered.id().clone(),
                range: finding.range,
                message: finding.message,
                severity: finding.severity.unwrap_or_else(|| rule.severity()),
                correctable: edit.is_some(),
            },
            edit,
        );
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
