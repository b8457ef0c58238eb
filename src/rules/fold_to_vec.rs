use super::mentions;
use crate::pattern::Captures;
use crate::rule::{Finding, Rule};
use crate::span::Span;
use crate::ts::Node;

const MSG: &str = "Use `map(..).collect()` instead of `fold` into a `Vec`.";

/// Rewrites a `fold` that only pushes onto a fresh `Vec`.
///
/// ```text
/// items.iter().fold(Vec::new(), |mut acc, x| { acc.push(f(x)); acc })
/// items.iter().map(|x| f(x)).collect::<Vec<_>>()
/// ```
///
/// Pushing the item unchanged drops the `map` entirely.
pub struct FoldToVec;

impl Rule for FoldToVec {
    fn id(&self) -> &str {
        "Style/FoldToVec"
    }

    fn description(&self) -> &str {
        "Prefers `map(..).collect()` over folding into an empty `Vec`."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call_expression"]
    }

    fn patterns(&self) -> &[&'static str] {
        &[r#"
        (call_expression
          (field_expression _ $method:"fold")
          (arguments
            (call_expression (scoped_identifier "Vec" {"new" "default"}) (arguments))
            (closure_expression
              (closure_parameters
                {$acc:identifier (mut_pattern mutable_specifier $acc:identifier)}
                $item:identifier)
              (block
                (expression_statement
                  (call_expression
                    (field_expression $target:identifier "push")
                    (arguments $value)))
                $result:identifier))))
        "#]
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check(&self, node: &Node<'_>, captures: &Captures<'_>) -> Option<Finding> {
        let acc = captures.text("acc")?;
        if captures.text("target")? != acc || captures.text("result")? != acc {
            return None;
        }

        let value = captures.node("value")?;
        if mentions(value, acc) {
            return None;
        }

        let item = captures.text("item")?;
        let replacement = if value.text() == item {
            "collect::<Vec<_>>()".to_string()
        } else {
            format!("map(|{item}| {}).collect::<Vec<_>>()", value.text())
        };

        let method = captures.node("method")?;
        let range = Span::new(method.range().start, node.range().end);
        Some(Finding::at(method, MSG).with_replacement(range, replacement))
    }
}
