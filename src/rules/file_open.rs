use crate::pattern::Captures;
use crate::rule::{Finding, Rule, Severity};
use crate::ts::Node;

const MSG: &str = "`File::open` without a scoped close may leak a file handle.";

/// Flags `File::open(..)` whose handle is kept around: bound to a variable,
/// chained on, or opened and discarded.
///
/// Passing the handle straight to a function or returning it is left alone,
/// since the callee or caller then owns closing it.
pub struct FileOpen;

impl Rule for FileOpen {
    fn id(&self) -> &str {
        "Lint/FileOpen"
    }

    fn description(&self) -> &str {
        "Checks for file handles opened without a scope that closes them."
    }

    fn interested_kinds(&self) -> &[&'static str] {
        &["call_expression"]
    }

    fn patterns(&self) -> &[&'static str] {
        &[r#"
        (call_expression
          (scoped_identifier {"File" "fs::File" "std::fs::File" "::std::fs::File"} "open")
          (arguments ...))
        "#]
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, node: &Node<'_>, _captures: &Captures<'_>) -> Option<Finding> {
        // `File::open(p)?` is judged by how the `?` expression is used
        let subject = match node.parent() {
            Some(parent) if parent.kind() == "try_expression" => parent,
            _ => *node,
        };

        let offensive = !subject.is_value_used()
            || subject.is_assigned_value()
            || subject.is_receiver_of_call();
        offensive.then(|| Finding::at(*node, MSG))
    }
}
