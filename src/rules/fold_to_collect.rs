use super::mentions;
use crate::pattern::Captures;
use crate::rule::{Finding, Rule};
use crate::ts::Node;

const MSG: &str = "Use `map(..).collect()` instead of `fold` into a `HashMap`.";

/// Rewrites a `fold` that only inserts into a fresh `HashMap` as
/// `map(..).collect()`.
///
/// ```text
/// items.iter().fold(HashMap::new(), |mut acc, item| { acc.insert(k, v); acc })
/// items.iter().map(|item| (k, v)).collect::<HashMap<_, _>>()
/// ```
pub struct FoldToCollect;

impl Rule for FoldToCollect {
    fn id(&self) -> &str {
        "Style/FoldToCollect"
    }

    fn description(&self) -> &str {
        "Prefers `map(..).collect()` over folding into an empty `HashMap`."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call_expression"]
    }

    fn patterns(&self) -> &[&'static str] {
        &[r#"
        (call_expression
          (field_expression _ $method:"fold")
          (arguments
            (call_expression (scoped_identifier "HashMap" {"new" "default"}) (arguments))
            (closure_expression
              (closure_parameters
                {$acc:identifier (mut_pattern mutable_specifier $acc:identifier)}
                $item:identifier)
              (block
                (expression_statement
                  (call_expression
                    (field_expression $target:identifier "insert")
                    (arguments $key $value)))
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

        // The new entry must not depend on the map being built
        let key = captures.node("key")?;
        let value = captures.node("value")?;
        if mentions(key, acc) || mentions(value, acc) {
            return None;
        }

        let method = captures.node("method")?;
        let item = captures.text("item")?;
        let replacement = format!(
            "map(|{item}| ({}, {})).collect::<HashMap<_, _>>()",
            key.text(),
            value.text()
        );

        let range = crate::span::Span::new(method.range().start, node.range().end);
        Some(Finding::at(method, MSG).with_replacement(range, replacement))
    }
}
