//! Read-only node view handed to patterns and rule callbacks.

use crate::span::Span;
use std::fmt;

/// One syntax node of a parsed buffer.
///
/// Wraps a tree-sitter node together with the buffer it was parsed from.
/// Children are the node's *named* children; anonymous tokens such as
/// punctuation are reachable only through [`Node::field`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    raw: tree_sitter::Node<'t>,
    source: &'t str,
}

impl<'t> Node<'t> {
    pub(crate) fn new(raw: tree_sitter::Node<'t>, source: &'t str) -> Self {
        Self { raw, source }
    }

    pub fn kind(&self) -> &'static str {
        self.raw.kind()
    }

    pub fn range(&self) -> Span {
        Span::new(self.raw.start_byte(), self.raw.end_byte())
    }

    /// Source text covered by this node.
    pub fn text(&self) -> &'t str {
        self.source.get(self.raw.byte_range()).unwrap_or("")
    }

    /// The whole buffer this node was parsed from.
    pub fn source(&self) -> &'t str {
        self.source
    }

    pub fn is_named(&self) -> bool {
        self.raw.is_named()
    }

    /// Named children in source order.
    pub fn children(&self) -> Vec<Node<'t>> {
        let mut cursor = self.raw.walk();
        self.raw
            .named_children(&mut cursor)
            .map(|child| Node::new(child, self.source))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.raw.named_child_count()
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.raw.parent().map(|p| Node::new(p, self.source))
    }

    /// Child stored under a grammar field name (may be an anonymous token).
    pub fn field(&self, name: &str) -> Option<Node<'t>> {
        self.raw
            .child_by_field_name(name)
            .map(|child| Node::new(child, self.source))
    }

    /// All named descendants in pre-order, excluding `self`.
    pub fn descendants(&self) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        let mut stack: Vec<Node<'t>> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().into_iter().rev());
        }
        out
    }

    pub fn ancestors(&self) -> impl Iterator<Item = Node<'t>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn has_ancestor_kind(&self, kind: &str) -> bool {
        self.ancestors().any(|node| node.kind() == kind)
    }

    /// True if this node is the value bound by a `let` or the right-hand side
    /// of an assignment.
    pub fn is_assigned_value(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        let slot = match parent.kind() {
            "let_declaration" => parent.field("value"),
            "assignment_expression" | "compound_assignment_expr" => parent.field("right"),
            _ => None,
        };
        slot.is_some_and(|slot| slot == *self)
    }

    /// True if this node is the receiver of a method call or field access.
    pub fn is_receiver_of_call(&self) -> bool {
        self.parent().is_some_and(|parent| {
            parent.kind() == "field_expression"
                && parent.field("value").is_some_and(|value| value == *self)
        })
    }

    /// False when the node's value is discarded by an expression statement.
    pub fn is_value_used(&self) -> bool {
        self.parent()
            .is_some_and(|parent| parent.kind() != "expression_statement")
    }

    pub fn is_argument(&self) -> bool {
        self.parent()
            .is_some_and(|parent| parent.kind() == "arguments")
    }

    /// True for a call whose receiver (`recv.method()`) or path
    /// (`Recv::function()`) has the given source text.
    pub fn is_call_with_receiver(&self, receiver: &str) -> bool {
        if self.kind() != "call_expression" {
            return false;
        }
        let Some(function) = self.field("function") else {
            return false;
        };
        let target = match function.kind() {
            "field_expression" => function.field("value"),
            "scoped_identifier" => function.field("path"),
            _ => None,
        };
        target.is_some_and(|target| target.text() == receiver)
    }

    /// Escape hatch to the underlying tree-sitter node.
    pub fn raw(&self) -> tree_sitter::Node<'t> {
        self.raw
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind(), self.range())
    }
}
