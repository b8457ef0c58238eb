//! The autocorrection loop for one source unit.

use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::ledger::{Ledger, Offense, RuleFault};
use crate::patch::{Resolver, TieBreak};
use crate::pool;
use crate::registry::Registry;
use crate::ts::ParseError;
use ast_grep_language::SupportLang;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_MAX_ITERATIONS: usize = 200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("source does not parse: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub language: SupportLang,
    /// Upper bound on correcting passes. One more report-only pass always
    /// checks the last corrected text.
    pub max_iterations: usize,
    pub tie_break: TieBreak,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            language: SupportLang::Rust,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tie_break: TieBreak::default(),
        }
    }
}

impl DriverOptions {
    pub fn with_language(mut self, language: SupportLang) -> Self {
        self.language = language;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }
}

impl From<&EngineConfig> for DriverOptions {
    fn from(config: &EngineConfig) -> Self {
        Self::default()
            .with_language(config.language())
            .with_max_iterations(config.engine.max_iterations)
            .with_tie_break(config.engine.tie_break)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convergence {
    /// A pass produced no edits.
    Fixpoint,
    /// Every permitted correcting pass ran and edits were still proposed.
    CapReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AbortReason {
    /// A correction produced source that no longer parses.
    Parse { error: ParseError },
    /// A patch could not be applied to the buffer it was built for.
    Patch { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Outcome {
    Completed {
        convergence: Convergence,
        /// Final source text.
        text: String,
        /// Passes run, including the one that found nothing to fix.
        iterations: usize,
        applied_edits: usize,
        /// Offenses still present in `text`.
        residual: Vec<Offense>,
    },
    Aborted {
        /// Pass whose source failed.
        iteration: usize,
        reason: AbortReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitStatus {
    /// No offenses at all.
    Clean,
    /// Offenses found, none of them correctable.
    Reported,
    /// Offenses corrected up to a fixpoint.
    Fixed,
    /// Corrections stopped at the pass cap.
    PartiallyFixed,
    /// A correction broke the source; nothing was kept.
    Aborted,
}

/// Everything one unit's run produced.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    /// Offenses of the original source.
    pub offenses: Vec<Offense>,
    pub faults: Vec<RuleFault>,
    pub outcome: Outcome,
    #[serde(skip)]
    original: String,
}

impl UnitReport {
    pub fn status(&self) -> UnitStatus {
        match &self.outcome {
            Outcome::Aborted { .. } => UnitStatus::Aborted,
            Outcome::Completed {
                convergence: Convergence::CapReached,
                ..
            } => UnitStatus::PartiallyFixed,
            Outcome::Completed { applied_edits, .. } if *applied_edits > 0 => UnitStatus::Fixed,
            Outcome::Completed { .. } if self.offenses.is_empty() => UnitStatus::Clean,
            Outcome::Completed { .. } => UnitStatus::Reported,
        }
    }

    /// Corrected text, present only when it differs from the original and
    /// the run completed.
    pub fn corrected_text(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Completed { text, .. } if *text != self.original => Some(text),
            _ => None,
        }
    }

    /// Final text: the corrected text, or the original when nothing changed
    /// or the run aborted.
    pub fn final_text(&self) -> &str {
        self.corrected_text().unwrap_or(&self.original)
    }

    /// Offenses remaining in [`UnitReport::final_text`].
    pub fn final_offenses(&self) -> &[Offense] {
        match &self.outcome {
            Outcome::Completed { residual, .. } => residual,
            Outcome::Aborted { .. } => &self.offenses,
        }
    }

    pub fn convergence(&self) -> Option<Convergence> {
        match &self.outcome {
            Outcome::Completed { convergence, .. } => Some(*convergence),
            Outcome::Aborted { .. } => None,
        }
    }

    pub fn iterations(&self) -> usize {
        match &self.outcome {
            Outcome::Completed { iterations, .. } => *iterations,
            Outcome::Aborted { iteration, .. } => *iteration,
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }
}

/// Runs dispatch and correction passes for one unit at a time.
///
/// A driver only borrows the registry, so one registry can back many
/// drivers on many threads.
pub struct Driver<'r> {
    registry: &'r Registry,
    options: DriverOptions,
}

impl<'r> Driver<'r> {
    pub fn new(registry: &'r Registry, options: DriverOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// One report-only pass over `source`.
    pub fn analyze(&self, source: &str) -> Result<Ledger, DriverError> {
        let parsed = pool::parse(self.options.language, source)?;
        Ok(Dispatcher::new(self.registry).dispatch(&parsed))
    }

    /// Dispatch, resolve, and apply until no edits remain or the cap is hit.
    pub fn run(&self, source: &str) -> Result<UnitReport, DriverError> {
        let first = self.analyze(source)?;
        let (offenses, _, faults) = first.clone().into_parts();
        let resolver = Resolver::new(self.options.tie_break);

        let mut current = source.to_string();
        let mut ledger = first;
        let mut applied_edits = 0;
        let mut seen = HashSet::from([xxh3_64(current.as_bytes())]);
        let max = self.options.max_iterations.max(1);
        let mut iteration = 0;

        loop {
            if iteration > 0 {
                ledger = match self.analyze(&current) {
                    Ok(ledger) => ledger,
                    Err(DriverError::Parse(error)) => {
                        tracing::warn!(iteration, %error, "corrected source no longer parses; aborting");
                        let reason = AbortReason::Parse { error };
                        return Ok(self.report(
                            source,
                            offenses,
                            faults,
                            Outcome::Aborted { iteration, reason },
                        ));
                    }
                };
            }

            let (pass_offenses, edits, _) = ledger.clone().into_parts();
            let resolution = resolver.resolve(edits);
            tracing::debug!(
                iteration,
                offenses = pass_offenses.len(),
                edits = resolution.patch.len(),
                deferred = resolution.deferred.len(),
                "autocorrect pass"
            );

            // Pass `max` only verifies: every earlier pass may correct.
            let convergence = if resolution.patch.is_empty() {
                Some(Convergence::Fixpoint)
            } else if iteration >= max {
                tracing::warn!(
                    iterations = max,
                    pending = resolution.patch.len(),
                    "autocorrect did not converge"
                );
                Some(Convergence::CapReached)
            } else {
                None
            };
            if let Some(convergence) = convergence {
                return Ok(self.report(
                    source,
                    offenses,
                    faults,
                    Outcome::Completed {
                        convergence,
                        text: current,
                        iterations: iteration + 1,
                        applied_edits,
                        residual: pass_offenses,
                    },
                ));
            }

            let next = match resolution.patch.apply(&current) {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(iteration, error = %err, "patch could not be applied; aborting");
                    let reason = AbortReason::Patch {
                        message: err.to_string(),
                    };
                    return Ok(self.report(
                        source,
                        offenses,
                        faults,
                        Outcome::Aborted { iteration, reason },
                    ));
                }
            };
            applied_edits += resolution.patch.len();

            if !seen.insert(xxh3_64(next.as_bytes())) {
                tracing::warn!(iteration, "correction cycle: source repeats an earlier pass");
            }
            current = next;
            iteration += 1;
        }
    }

    fn report(
        &self,
        source: &str,
        offenses: Vec<Offense>,
        faults: Vec<RuleFault>,
        outcome: Outcome,
    ) -> UnitReport {
        UnitReport {
            offenses,
            faults,
            outcome,
            original: source.to_string(),
        }
    }
}
