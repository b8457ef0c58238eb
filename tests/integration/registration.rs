//! Rule registration and dispatch behavior across the public surface.

use cop_engine::rule::Finding;
use cop_engine::{Driver, DriverOptions, Registry, RegistryError, UnitStatus};

#[test]
fn unterminated_union_fails_registration_naming_the_rule() {
    let err = Registry::builder()
        .register_fn(
            "Test/Broken",
            &["call_expression"],
            &["(call_expression {a b"],
            |_, _| None,
        )
        .err()
        .expect("registration should fail");

    match &err {
        RegistryError::InvalidPattern { rule, pattern, .. } => {
            assert_eq!(rule, "Test/Broken");
            assert_eq!(pattern, "(call_expression {a b");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("Test/Broken"));
    assert!(message.contains("(call_expression {a b"));
}

#[test]
fn duplicate_rule_ids_are_rejected() {
    let result = Registry::builder()
        .register_fn("Test/Same", &["identifier"], &[], |_, _| None)
        .and_then(|b| b.register_fn("Test/Same", &["identifier"], &[], |_, _| None));

    assert!(matches!(result, Err(RegistryError::DuplicateRule { rule }) if rule == "Test/Same"));
}

#[test]
fn nested_offenses_are_all_kept() {
    let registry = Registry::builder()
        .register_fn("Test/Calls", &["call_expression"], &[], |node, _| {
            Some(Finding::at(*node, "call"))
        })
        .unwrap()
        .build();
    let ledger = Driver::new(&registry, DriverOptions::default())
        .analyze("fn main() { f(g(h())); }")
        .unwrap();

    let spans: Vec<_> = ledger
        .sorted_offenses()
        .iter()
        .map(|offense| offense.range.to_string())
        .collect();
    assert_eq!(spans, vec!["12..21", "14..20", "16..19"]);
}

#[test]
fn identical_offenses_from_two_rules_are_both_reported() {
    let registry = Registry::builder()
        .register_fn("Test/A", &["identifier"], &[], |node, _| {
            (node.text() == "foo").then(|| Finding::at(*node, "same"))
        })
        .and_then(|b| {
            b.register_fn("Test/B", &["identifier"], &[], |node, _| {
                (node.text() == "foo").then(|| Finding::at(*node, "same"))
            })
        })
        .unwrap()
        .build();
    let ledger = Driver::new(&registry, DriverOptions::default())
        .analyze("fn main() { foo; }")
        .unwrap();

    assert_eq!(ledger.offenses().len(), 2);
    assert_eq!(ledger.offenses()[0].range, ledger.offenses()[1].range);
}

#[test]
fn panicking_rule_is_isolated() {
    let registry = Registry::builder()
        .register_fn("Test/Panics", &["identifier"], &[], |node, _| {
            if node.text() == "boom" {
                panic!("rule bug");
            }
            None
        })
        .and_then(|b| {
            b.register_fn("Test/Rename", &["identifier"], &[], |node, _| {
                (node.text() == "foo")
                    .then(|| Finding::at(*node, "rename").with_replacement(node.range(), "bar"))
            })
        })
        .unwrap()
        .build();

    let report = Driver::new(&registry, DriverOptions::default())
        .run("fn main() { boom; foo; }")
        .unwrap();

    assert_eq!(report.status(), UnitStatus::Fixed);
    assert_eq!(report.corrected_text(), Some("fn main() { boom; bar; }"));
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].rule.as_str(), "Test/Panics");
    assert!(report.faults[0].reason.contains("rule bug"));
}

#[test]
fn offense_outside_its_node_is_a_fault() {
    let registry = Registry::builder()
        .register_fn("Test/Wide", &["identifier"], &[], |node, _| {
            (node.text() == "foo").then(|| Finding::new((0..node.range().end).into(), "too wide"))
        })
        .unwrap()
        .build();
    let ledger = Driver::new(&registry, DriverOptions::default())
        .analyze("fn main() { foo; }")
        .unwrap();

    assert!(ledger.offenses().is_empty());
    assert_eq!(ledger.faults().len(), 1);
}
