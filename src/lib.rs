//! cop-engine: a rule-driven static analysis and autocorrection engine.
//!
//! Rules inspect a tree-sitter syntax tree, report offenses, and may propose
//! byte-span replacements. The engine runs every rule over a source unit,
//! resolves conflicting replacements, applies the survivors, and re-runs the
//! rules on the corrected text until nothing is left to fix.
//!
//! # Architecture
//!
//! - [`pattern`] compiles node patterns such as
//!   `(binary_expression (call_expression ...) "0")` into matchers.
//! - [`Registry`] owns rules and the node-kind dispatch table.
//! - [`dispatch::Dispatcher`] walks a tree once and fills a [`Ledger`].
//! - [`Resolver`] turns the ledger's edits into a conflict-free [`Patch`].
//! - [`Driver`] loops dispatch and patching to a fixpoint or a pass cap.
//! - [`runner::run_units`] processes many units in parallel.
//!
//! Every replacement is an [`Edit`]: a byte span, its expected before-text,
//! and the new text.
//!
//! # Example
//!
//! ```no_run
//! use cop_engine::{Driver, DriverOptions, Registry};
//!
//! let registry = Registry::bundled().expect("bundled rules compile");
//! let driver = Driver::new(&registry, DriverOptions::default());
//! let report = driver.run("fn f(v: Vec<u8>) -> bool { v.len() == 0 }").unwrap();
//! println!("{}", report.final_text());
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod edit;
pub mod ledger;
pub mod patch;
pub mod pattern;
pub mod pool;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod runner;
pub mod span;
pub mod testing;
pub mod ts;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, EngineConfig};
pub use driver::{
    AbortReason, Convergence, Driver, DriverError, DriverOptions, Outcome, UnitReport, UnitStatus,
};
pub use edit::{Edit, EditError, EditVerification};
pub use ledger::{Ledger, Location, Offense, RuleFault};
pub use patch::{Patch, Resolution, Resolver, TieBreak};
pub use pattern::{Captures, Pattern, PatternError};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use rule::{Finding, FnRule, Rule, RuleId, Severity};
pub use runner::{run_units, CancelToken, RunMode, SourceUnit, UnitResult, UnitRun};
pub use span::Span;
pub use ts::{Node, ParseError};
