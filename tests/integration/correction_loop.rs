//! Multi-pass autocorrection: conflict deferral, tie-breaks, convergence.

use cop_engine::pattern::Captures;
use cop_engine::rule::{Finding, FnRule};
use cop_engine::ts::Node;
use cop_engine::{
    Convergence, Driver, DriverOptions, Outcome, Registry, TieBreak, UnitStatus,
};

fn rename(
    from: &'static str,
    to: &'static str,
) -> impl Fn(&Node<'_>, &Captures<'_>) -> Option<Finding> + Send + Sync + 'static {
    move |node, _| {
        (node.text() == from)
            .then(|| Finding::at(*node, format!("rename {from}")).with_replacement(node.range(), to))
    }
}

fn run(registry: &Registry, options: DriverOptions, source: &str) -> cop_engine::UnitReport {
    Driver::new(registry, options).run(source).unwrap()
}

#[test]
fn overlapping_edit_resolved_incidentally() {
    // Whole-expression rewrite overlaps the receiver rename and is deferred;
    // after the rename it no longer applies.
    let registry = Registry::builder()
        .register_fn("Test/Field", &["field_expression"], &[], |node, _| {
            (node.text() == "foo.bar")
                .then(|| Finding::at(*node, "field").with_replacement(node.range(), "baz"))
        })
        .and_then(|b| b.register_fn("Test/Receiver", &["identifier"], &[], rename("foo", "qux")))
        .unwrap()
        .build();

    let report = run(&registry, DriverOptions::default(), "fn main() { foo.bar; }");

    assert_eq!(report.offenses.len(), 2);
    assert_eq!(report.corrected_text(), Some("fn main() { qux.bar; }"));
    assert_eq!(report.iterations(), 2);
    assert!(report.final_offenses().is_empty());
}

#[test]
fn overlapping_edit_applied_on_a_later_pass() {
    let registry = Registry::builder()
        .register_fn("Test/Field", &["field_expression"], &[], |node, _| {
            let field = node.field("field")?;
            let value = node.field("value")?;
            (field.text() == "bar").then(|| {
                Finding::at(*node, "field")
                    .with_replacement(node.range(), format!("{}.baz", value.text()))
            })
        })
        .and_then(|b| b.register_fn("Test/Receiver", &["identifier"], &[], rename("foo", "qux")))
        .unwrap()
        .build();

    let report = run(&registry, DriverOptions::default(), "fn main() { foo.bar; }");

    assert_eq!(report.status(), UnitStatus::Fixed);
    assert_eq!(report.corrected_text(), Some("fn main() { qux.baz; }"));
    assert_eq!(report.iterations(), 3);
    let Outcome::Completed { applied_edits, .. } = report.outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(applied_edits, 2);
}

#[test]
fn deferred_edit_lands_within_a_cap_of_two() {
    let registry = Registry::builder()
        .register_fn("Test/Field", &["field_expression"], &[], |node, _| {
            let field = node.field("field")?;
            let value = node.field("value")?;
            (field.text() == "bar").then(|| {
                Finding::at(*node, "field")
                    .with_replacement(node.range(), format!("{}.baz", value.text()))
            })
        })
        .and_then(|b| b.register_fn("Test/Receiver", &["identifier"], &[], rename("foo", "qux")))
        .unwrap()
        .build();
    let options = DriverOptions::default().with_max_iterations(2);

    let report = run(&registry, options, "fn main() { foo.bar; }");

    assert_eq!(report.corrected_text(), Some("fn main() { qux.baz; }"));
    assert_eq!(report.convergence(), Some(Convergence::Fixpoint));
    assert_eq!(report.iterations(), 3);
}

#[test]
fn cap_of_one_applies_the_first_patch() {
    let registry = Registry::bundled().unwrap();
    let options = DriverOptions::default().with_max_iterations(1);

    let report = run(
        &registry,
        options,
        "fn f(v: Vec<u8>) -> bool {\n    v.iter().count() == 0\n}\n",
    );

    assert_eq!(report.status(), UnitStatus::PartiallyFixed);
    assert_eq!(
        report.corrected_text(),
        Some("fn f(v: Vec<u8>) -> bool {\n    v.len() == 0\n}\n")
    );
    assert_eq!(report.final_offenses().len(), 1);
    assert!(report.final_offenses()[0].correctable);
}

fn competing_renames() -> Registry {
    Registry::builder()
        .register(FnRule::new("Test/ToBar", &["identifier"], &[], rename("foo", "bar")))
        .and_then(|b| {
            b.register(
                FnRule::new("Test/ToBaz", &["identifier"], &[], rename("foo", "baz"))
                    .with_priority(10),
            )
        })
        .unwrap()
        .build()
}

#[test]
fn identical_ranges_follow_registration_order() {
    let options = DriverOptions::default().with_tie_break(TieBreak::RegistrationOrder);
    let report = run(&competing_renames(), options, "fn main() { foo; }");
    assert_eq!(report.corrected_text(), Some("fn main() { bar; }"));
}

#[test]
fn identical_ranges_follow_reverse_registration_order() {
    let options = DriverOptions::default().with_tie_break(TieBreak::ReverseRegistrationOrder);
    let report = run(&competing_renames(), options, "fn main() { foo; }");
    assert_eq!(report.corrected_text(), Some("fn main() { baz; }"));
}

#[test]
fn identical_ranges_follow_priority() {
    let options = DriverOptions::default().with_tie_break(TieBreak::Priority);
    let report = run(&competing_renames(), options, "fn main() { foo; }");
    assert_eq!(report.corrected_text(), Some("fn main() { baz; }"));
}

#[test]
fn insertions_at_one_offset_take_separate_passes() {
    let registry = Registry::builder()
        .register_fn("Test/Prefix", &["identifier"], &[], |node, _| {
            (node.text() == "x").then(|| {
                let at = node.range().start;
                Finding::at(*node, "prefix").with_replacement((at..at).into(), "a_")
            })
        })
        .and_then(|b| {
            b.register_fn("Test/Prefix2", &["identifier"], &[], |node, _| {
                (node.text() == "x").then(|| {
                    let at = node.range().start;
                    Finding::at(*node, "prefix").with_replacement((at..at).into(), "b_")
                })
            })
        })
        .unwrap()
        .build();

    let report = run(&registry, DriverOptions::default(), "fn main() { x; }");

    // The second insertion is deferred, then never re-proposed since `x` is gone.
    assert_eq!(report.corrected_text(), Some("fn main() { a_x; }"));
    assert_eq!(report.iterations(), 2);
}

#[test]
fn oscillating_rules_are_reported_as_non_convergent() {
    let registry = Registry::builder()
        .register_fn("Test/FooToBar", &["identifier"], &[], rename("foo", "bar"))
        .and_then(|b| b.register_fn("Test/BarToFoo", &["identifier"], &[], rename("bar", "foo")))
        .unwrap()
        .build();
    let options = DriverOptions::default().with_max_iterations(5);

    let report = run(&registry, options, "fn main() { foo; }");

    assert_eq!(report.convergence(), Some(Convergence::CapReached));
    assert_eq!(report.status(), UnitStatus::PartiallyFixed);
    // Five correcting passes, then one that still proposes an edit
    assert_eq!(report.iterations(), 6);
    assert_eq!(report.final_text(), "fn main() { bar; }");
    assert_eq!(report.corrected_text(), Some("fn main() { bar; }"));
    assert_eq!(report.final_offenses().len(), 1);
    let Outcome::Completed { applied_edits, .. } = report.outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(applied_edits, 5);
}

#[test]
fn chained_rewrites_converge_over_several_passes() {
    let registry = Registry::bundled().unwrap();
    let report = run(
        &registry,
        DriverOptions::default(),
        "fn f(v: Vec<u8>) -> bool {\n    v.iter().count() == 0\n}\n",
    );

    assert_eq!(report.status(), UnitStatus::Fixed);
    assert_eq!(report.iterations(), 3);
    assert_eq!(
        report.corrected_text(),
        Some("fn f(v: Vec<u8>) -> bool {\n    v.is_empty()\n}\n")
    );
}

#[test]
fn corrections_are_idempotent() {
    let registry = Registry::bundled().unwrap();
    let driver = Driver::new(&registry, DriverOptions::default());
    let sources = [
        "fn f(v: Vec<u8>) -> bool {\n    v.iter().count() == 0 || v.len() != 0\n}\n",
        "fn g() {\n    let m = xs.iter().fold(HashMap::new(), |mut acc, x| { acc.insert(x, 1); acc });\n    let f = File::open(\"f\");\n}\n",
        "fn h() {}\n",
    ];

    for source in sources {
        let first = driver.run(source).unwrap();
        assert_eq!(first.convergence(), Some(Convergence::Fixpoint));

        let second = driver.run(first.final_text()).unwrap();
        assert_eq!(second.final_text(), first.final_text());
        assert!(second.offenses.iter().all(|offense| !offense.correctable));
        assert_eq!(second.iterations(), 1);
    }
}

#[test]
fn results_do_not_depend_on_registration_order() {
    let forward = Registry::bundled().unwrap();
    let reversed = cop_engine::rules::bundled()
        .into_iter()
        .rev()
        .try_fold(Registry::builder(), |builder, rule| builder.register_boxed(rule))
        .unwrap()
        .build();

    let source = "fn f(v: Vec<u8>, s: S) -> bool {\n    let h = File::open(\"f\");\n    v.iter().count() == 0 && s.items.len() > 0\n}\n";
    let a = run(&forward, DriverOptions::default(), source);
    let b = run(&reversed, DriverOptions::default(), source);

    assert_eq!(a.offenses, b.offenses);
    assert_eq!(a.final_text(), b.final_text());
    assert_eq!(a.final_offenses(), b.final_offenses());
}
