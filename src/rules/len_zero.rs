use crate::pattern::Captures;
use crate::rule::{Finding, Rule};
use crate::ts::Node;

/// `x.len() == 0` → `x.is_empty()`, `x.len() != 0` and `x.len() > 0` →
/// `!x.is_empty()`.
pub struct LenZero;

impl Rule for LenZero {
    fn id(&self) -> &str {
        "Style/LenZero"
    }

    fn description(&self) -> &str {
        "Prefers `is_empty()` over comparing `len()` with zero."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["binary_expression"]
    }

    fn patterns(&self) -> &[&'static str] {
        &[r#"(binary_expression
               (call_expression (field_expression $recv "len") (arguments))
               [integer_literal "0"])"#]
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check(&self, node: &Node<'_>, captures: &Captures<'_>) -> Option<Finding> {
        let recv = captures.text("recv")?;
        let (replacement, message) = match node.field("operator")?.text() {
            "==" => (
                format!("{recv}.is_empty()"),
                "Use `is_empty()` instead of comparing `len()` with 0.",
            ),
            "!=" | ">" => (
                format!("!{recv}.is_empty()"),
                "Use `!is_empty()` instead of comparing `len()` with 0.",
            ),
            _ => return None,
        };
        Some(Finding::at(*node, message).with_replacement(node.range(), replacement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::testing::{expect_no_offenses, expect_offense};

    fn registry() -> Registry {
        Registry::builder().register(LenZero).unwrap().build()
    }

    #[test]
    fn corrects_equality() {
        expect_offense(
            &registry(),
            "fn f(v: &[u8]) -> bool {\n    v.len() == 0\n    ^^^^^^^^^^^^ Use `is_empty()` instead of comparing `len()` with 0.\n}\n",
        )
        .expect_correction("fn f(v: &[u8]) -> bool {\n    v.is_empty()\n}\n");
    }

    #[test]
    fn corrects_inequality_on_a_field() {
        expect_offense(
            &registry(),
            "fn f(s: &S) -> bool {\n    s.items.len() != 0\n    ^^^^^^^^^^^^^^^^^^ Use `!is_empty()` [...]\n}\n",
        )
        .expect_correction("fn f(s: &S) -> bool {\n    !s.items.is_empty()\n}\n");
    }

    #[test]
    fn ignores_other_comparisons() {
        expect_no_offenses(
            &registry(),
            "fn f(v: &[u8]) -> bool {\n    v.len() == 1 || v.len() < 0 || v.len(1) == 0\n}\n",
        );
    }
}
