//! Node-shape pattern language.
//!
//! Patterns are compiled once into an immutable op tree and evaluated against
//! [`Node`]s without re-reading the pattern text.
//!
//! ```text
//! (call_expression                      # node kind, then its named children
//!   (field_expression $recv "len")      # capture, exact source text
//!   (arguments))                        # no arguments at all
//!
//! {identifier self}                     # either kind
//! [call_expression !(_ "drop" ...)]     # every member matches / negation
//! (block $stmts:... $last)              # captured rest, then last child
//! (closure_parameters $a {nil? $b})     # optional trailing child
//! ```

pub mod errors;
mod compiler;
mod lexer;
mod matcher;

pub use errors::PatternError;
pub use matcher::{Capture, Captures};

use crate::ts::Node;
use compiler::Op;
use std::fmt;

/// A compiled node-shape matcher.
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    root: Op,
}

impl Pattern {
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let root = compiler::compile(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Match against `node`, returning the captures on success.
    pub fn matches<'t>(&self, node: Node<'t>) -> Option<Captures<'t>> {
        let mut captures = Captures::new();
        matcher::match_op(&self.root, Some(node), &mut captures).then_some(captures)
    }

    pub fn is_match(&self, node: Node<'_>) -> bool {
        self.matches(node).is_some()
    }

    /// Pattern text this matcher was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Node kind every match must have, when the pattern pins one down.
    pub fn root_kinds(&self) -> Option<Vec<&str>> {
        root_kinds(&self.root)
    }
}

fn root_kinds(op: &Op) -> Option<Vec<&str>> {
    match op {
        Op::Kind(kind) => Some(vec![kind.as_str()]),
        Op::Seq { head, .. } => root_kinds(head),
        Op::Capture { inner, .. } => root_kinds(inner),
        Op::Union(members) => {
            let mut kinds = Vec::new();
            for member in members {
                kinds.extend(root_kinds(member)?);
            }
            Some(kinds)
        }
        Op::All(members) => members.iter().find_map(root_kinds),
        _ => None,
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::{ParsedSource, SourceParser};
    use ast_grep_language::SupportLang;

    fn parse(source: &str) -> ParsedSource<'_> {
        SourceParser::new(SupportLang::Rust)
            .unwrap()
            .parse(source)
            .unwrap()
    }

    fn first<'t>(parsed: &'t ParsedSource<'_>, kind: &str) -> Node<'t> {
        parsed
            .root()
            .descendants()
            .into_iter()
            .find(|n| n.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind} node"))
    }

    #[test]
    fn kind_and_text_atoms() {
        let parsed = parse("fn main() { foo(1); }");
        let call = first(&parsed, "call_expression");

        assert!(Pattern::compile("call_expression").unwrap().is_match(call));
        assert!(Pattern::compile("\"foo(1)\"").unwrap().is_match(call));
        assert!(!Pattern::compile("identifier").unwrap().is_match(call));
    }

    #[test]
    fn sequence_children_are_positional() {
        let parsed = parse("fn main() { foo(a, b); }");
        let call = first(&parsed, "call_expression");

        let exact = Pattern::compile("(call_expression \"foo\" (arguments _ _))").unwrap();
        assert!(exact.is_match(call));
        let too_few = Pattern::compile("(call_expression \"foo\" (arguments _))").unwrap();
        assert!(!too_few.is_match(call));
        let wrong_order = Pattern::compile("(call_expression (arguments ...) _)").unwrap();
        assert!(!wrong_order.is_match(call));
    }

    #[test]
    fn empty_sequence_requires_no_children() {
        let parsed = parse("fn main() { foo(); }");
        let args = first(&parsed, "arguments");

        assert!(Pattern::compile("(arguments)").unwrap().is_match(args));
        assert!(!Pattern::compile("(arguments _)").unwrap().is_match(args));
    }

    #[test]
    fn union_matches_any_member() {
        let parsed = parse("fn main() { x.len(); }");
        let field = first(&parsed, "field_expression");

        let pattern = Pattern::compile("(field_expression _ {\"size\" \"len\"})").unwrap();
        assert!(pattern.is_match(field));
    }

    #[test]
    fn rest_backtracks_to_let_trailing_children_match() {
        let parsed = parse("fn main() { f(a, b, c); }");
        let args = first(&parsed, "arguments");

        let pattern = Pattern::compile("(arguments $init:... $last)").unwrap();
        let caps = pattern.matches(args).unwrap();
        assert_eq!(caps.nodes("init").map(|n| n.len()), Some(2));
        assert_eq!(caps.text("init"), Some("a, b"));
        assert_eq!(caps.text("last"), Some("c"));

        let anchored = Pattern::compile("(arguments ... \"b\" ...)").unwrap();
        assert!(anchored.is_match(args));
        let missing = Pattern::compile("(arguments ... \"z\" ...)").unwrap();
        assert!(!missing.is_match(args));
    }

    #[test]
    fn rest_may_match_nothing() {
        let parsed = parse("fn main() { f(); }");
        let args = first(&parsed, "arguments");

        let caps = Pattern::compile("(arguments $all:...)")
            .unwrap()
            .matches(args)
            .unwrap();
        assert_eq!(caps.nodes("all"), Some(&[][..]));
        assert_eq!(caps.text("all"), Some(""));
    }

    #[test]
    fn nil_matches_absence() {
        let one = parse("fn main() { f(a); }");
        let two = parse("fn main() { f(a, b); }");
        let pattern = Pattern::compile("(arguments _ {nil? identifier})").unwrap();

        assert!(pattern.is_match(first(&one, "arguments")));
        assert!(pattern.is_match(first(&two, "arguments")));
        let strict = Pattern::compile("(arguments _ nil?)").unwrap();
        assert!(!strict.is_match(first(&two, "arguments")));
    }

    #[test]
    fn conjunction_and_negation() {
        let parsed = parse("fn main() { let n = 0; }");
        let literal = first(&parsed, "integer_literal");

        assert!(Pattern::compile("[integer_literal \"0\"]").unwrap().is_match(literal));
        assert!(!Pattern::compile("[integer_literal \"1\"]").unwrap().is_match(literal));
        assert!(Pattern::compile("!identifier").unwrap().is_match(literal));
        assert!(!Pattern::compile("!integer_literal").unwrap().is_match(literal));
    }

    #[test]
    fn failed_branches_leave_no_captures() {
        let parsed = parse("fn main() { f(a); }");
        let args = first(&parsed, "arguments");

        let pattern = Pattern::compile("{(arguments $x \"zzz\") (arguments $y)}").unwrap();
        let caps = pattern.matches(args).unwrap();
        assert!(caps.get("x").is_none());
        assert_eq!(caps.text("y"), Some("a"));
        assert_eq!(caps.len(), 1);
    }

    #[test]
    fn capture_wraps_a_subpattern() {
        let parsed = parse("fn main() { foo(bar); }");
        let call = first(&parsed, "call_expression");

        let caps = Pattern::compile("($call:call_expression $callee:identifier (arguments $arg))")
            .unwrap()
            .matches(call)
            .unwrap();
        assert_eq!(caps.node("call"), Some(call));
        assert_eq!(caps.text("callee"), Some("foo"));
        assert_eq!(caps.text("arg"), Some("bar"));
        assert_eq!(caps.names().collect::<Vec<_>>(), vec!["call", "callee", "arg"]);
    }

    #[test]
    fn root_kinds_are_derived_from_the_head() {
        let seq = Pattern::compile("(call_expression ...)").unwrap();
        assert_eq!(seq.root_kinds(), Some(vec!["call_expression"]));
        let union = Pattern::compile("{identifier (field_expression ...)}").unwrap();
        assert_eq!(union.root_kinds(), Some(vec!["identifier", "field_expression"]));
        assert_eq!(Pattern::compile("_").unwrap().root_kinds(), None);
    }

    #[test]
    fn compile_error_is_reported_not_panicked() {
        let err = Pattern::compile("(call_expression {identifier").unwrap_err();
        assert!(matches!(err, PatternError::Unterminated { open: '{', .. }));
    }
}
