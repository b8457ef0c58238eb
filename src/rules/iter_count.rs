use crate::pattern::Captures;
use crate::rule::{Finding, Rule};
use crate::ts::Node;

const MSG: &str = "Use `len()` instead of `iter().count()`.";

/// `x.iter().count()` → `x.len()`.
pub struct IterCount;

impl Rule for IterCount {
    fn id(&self) -> &str {
        "Style/IterCount"
    }

    fn description(&self) -> &str {
        "Prefers `len()` over counting an iterator over a collection."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call_expression"]
    }

    fn patterns(&self) -> &[&'static str] {
        &[r#"(call_expression
               (field_expression
                 (call_expression (field_expression $recv "iter") (arguments))
                 "count")
               (arguments))"#]
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check(&self, node: &Node<'_>, captures: &Captures<'_>) -> Option<Finding> {
        let recv = captures.text("recv")?;
        Some(Finding::at(*node, MSG).with_replacement(node.range(), format!("{recv}.len()")))
    }
}
