//! Parallel processing of independent source units.

use crate::driver::{Driver, DriverError, UnitReport};
use crate::ledger::Ledger;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One file's worth of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Cancellation handle shared across workers.
///
/// Checked only before a unit starts; a unit already running finishes its
/// whole correction loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One report-only pass.
    #[default]
    Analyze,
    /// Full autocorrection loop.
    Correct,
}

#[derive(Debug)]
pub enum UnitResult {
    Analyzed(Ledger),
    Corrected(UnitReport),
    Failed(DriverError),
    Cancelled,
}

#[derive(Debug)]
pub struct UnitRun {
    pub name: String,
    pub result: UnitResult,
}

/// Process `units` in parallel, returning results in input order.
///
/// `threads == 0` uses rayon's default worker count.
pub fn run_units(
    driver: &Driver<'_>,
    units: Vec<SourceUnit>,
    mode: RunMode,
    cancel: &CancelToken,
    threads: usize,
) -> Result<Vec<UnitRun>, RunnerError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    let runs = pool.install(|| {
        units
            .into_par_iter()
            .map(|unit| run_unit(driver, unit, mode, cancel))
            .collect()
    });
    Ok(runs)
}

fn run_unit(driver: &Driver<'_>, unit: SourceUnit, mode: RunMode, cancel: &CancelToken) -> UnitRun {
    if cancel.is_cancelled() {
        tracing::debug!(unit = %unit.name, "cancelled before start");
        return UnitRun {
            name: unit.name,
            result: UnitResult::Cancelled,
        };
    }

    let result = match mode {
        RunMode::Analyze => driver.analyze(&unit.text).map(UnitResult::Analyzed),
        RunMode::Correct => driver.run(&unit.text).map(UnitResult::Corrected),
    };
    let result = result.unwrap_or_else(|err| {
        tracing::debug!(unit = %unit.name, error = %err, "unit failed");
        UnitResult::Failed(err)
    });

    UnitRun {
        name: unit.name,
        result,
    }
}
