//! Bundled rules exercised through the offense notation and the full driver.

use cop_engine::testing::{expect_no_offenses, expect_offense};
use cop_engine::{Driver, DriverOptions, Registry, Severity, UnitStatus};

fn bundled() -> Registry {
    Registry::bundled().unwrap()
}

#[test]
fn report_only_rule_spans_the_call_not_the_binding() {
    let registry = bundled();
    let fixture = expect_offense(
        &registry,
        r#"fn main() {
    let x = File::open("f");
            ^^^^^^^^^^^^^^^ `File::open` without a scoped close may leak a file handle.
}
"#,
    );
    fixture.expect_no_corrections();

    let offense = &fixture.offenses()[0];
    assert_eq!(&fixture.source()[offense.range.as_range()], r#"File::open("f")"#);
    assert_eq!(offense.severity, Severity::Warning);
    assert!(!offense.correctable);
}

#[test]
fn fold_into_map_is_rewritten_in_two_passes() {
    let registry = bundled();
    let report = expect_offense(
        &registry,
        r#"fn main() {
    let m = arr.iter().fold(HashMap::new(), |mut acc, item| { acc.insert(item.id, item.name); acc });
                       ^^^^ Use `map(..).collect()` instead of `fold` into a `HashMap`.
}
"#,
    )
    .expect_correction(
        r#"fn main() {
    let m = arr.iter().map(|item| (item.id, item.name)).collect::<HashMap<_, _>>();
}
"#,
    );

    assert_eq!(report.status(), UnitStatus::Fixed);
    assert_eq!(report.iterations(), 2);
}

#[test]
fn fold_into_vec_and_len_zero_settle_together() {
    let registry = bundled();
    let report = Driver::new(&registry, DriverOptions::default())
        .run("fn f(v: &[u8]) -> bool { v.iter().fold(Vec::new(), |mut acc, x| { acc.push(x); acc }).len() == 0 }")
        .unwrap();

    assert_eq!(report.status(), UnitStatus::Fixed);
    assert_eq!(
        report.final_text(),
        "fn f(v: &[u8]) -> bool { v.iter().collect::<Vec<_>>().is_empty() }"
    );
    assert!(report.final_offenses().is_empty());
}

#[test]
fn several_rules_in_one_unit() {
    let registry = bundled();
    expect_offense(
        &registry,
        r#"fn f(v: Vec<u8>) -> bool {
    let h = File::open("f");
            ^^^^^^^^^^^^^^^ `File::open` [...]
    v.iter().count() > 0
    ^^^^^^^^^^^^^^^^ Use `len()` instead of `iter().count()`.
}
"#,
    )
    .expect_correction(
        r#"fn f(v: Vec<u8>) -> bool {
    let h = File::open("f");
    !v.is_empty()
}
"#,
    );
}

#[test]
fn idiomatic_code_is_clean() {
    expect_no_offenses(
        &bundled(),
        r#"fn f(v: Vec<u8>, path: &Path) -> std::io::Result<bool> {
    let text = std::fs::read_to_string(path)?;
    let map: HashMap<_, _> = v.iter().map(|b| (*b, true)).collect();
    consume(File::open(path)?);
    Ok(v.is_empty() && text.len() > 1 && map.len() == v.len())
}
"#,
    );
}

#[test]
fn unparseable_unit_is_an_input_error() {
    let registry = bundled();
    let result = Driver::new(&registry, DriverOptions::default()).run("fn main( {");
    assert!(result.is_err());
}
