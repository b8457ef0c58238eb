//! Parallel runs over many units sharing one registry.

use cop_engine::runner::{run_units, CancelToken, RunMode, SourceUnit, UnitResult};
use cop_engine::{Driver, DriverOptions, Registry, UnitStatus};

fn units(count: usize) -> Vec<SourceUnit> {
    (0..count)
        .map(|i| {
            let text = if i % 3 == 0 {
                format!("fn f{i}(v: Vec<u8>) -> bool {{ v.len() == 0 }}\n")
            } else if i % 3 == 1 {
                format!("fn f{i}() {{}}\n")
            } else {
                format!("fn f{i}( {{\n")
            };
            SourceUnit::new(format!("unit{i}.rs"), text)
        })
        .collect()
}

#[test]
fn results_keep_input_order_and_match_sequential_runs() {
    let registry = Registry::bundled().unwrap();
    let driver = Driver::new(&registry, DriverOptions::default());
    let input = units(24);

    let runs = run_units(&driver, input.clone(), RunMode::Correct, &CancelToken::new(), 4).unwrap();

    assert_eq!(runs.len(), input.len());
    for (run, unit) in runs.iter().zip(&input) {
        assert_eq!(run.name, unit.name);
        match (&run.result, driver.run(&unit.text)) {
            (UnitResult::Corrected(parallel), Ok(sequential)) => {
                assert_eq!(parallel.final_text(), sequential.final_text());
                assert_eq!(parallel.offenses, sequential.offenses);
            }
            (UnitResult::Failed(parallel), Err(sequential)) => assert_eq!(parallel, &sequential),
            (other, _) => panic!("unexpected result for {}: {other:?}", run.name),
        }
    }

    let fixed = runs
        .iter()
        .filter(|run| matches!(&run.result, UnitResult::Corrected(r) if r.status() == UnitStatus::Fixed))
        .count();
    assert_eq!(fixed, 8);
}

#[test]
fn analyze_mode_reports_without_correcting() {
    let registry = Registry::bundled().unwrap();
    let driver = Driver::new(&registry, DriverOptions::default());

    let runs = run_units(&driver, units(3), RunMode::Analyze, &CancelToken::new(), 0).unwrap();

    assert!(matches!(&runs[0].result, UnitResult::Analyzed(ledger) if ledger.offenses().len() == 1));
    assert!(matches!(&runs[1].result, UnitResult::Analyzed(ledger) if ledger.is_empty()));
    assert!(matches!(&runs[2].result, UnitResult::Failed(_)));
}

#[test]
fn cancelled_runs_skip_every_unit() {
    let registry = Registry::bundled().unwrap();
    let driver = Driver::new(&registry, DriverOptions::default());
    let cancel = CancelToken::new();
    cancel.cancel();

    let runs = run_units(&driver, units(6), RunMode::Correct, &cancel, 2).unwrap();

    assert!(runs.iter().all(|run| matches!(run.result, UnitResult::Cancelled)));
}
