//! Offense assertion notation for rule tests.
//!
//! An annotated fixture is source text where a line of carets under a source
//! line marks the exact byte columns an offense must cover, optionally
//! followed by the expected message:
//!
//! ```text
//! let f = File::open("f");
//!         ^^^^^^^^^^^^^^^ `File::open` without a scoped close may leak a file handle.
//! ```
//!
//! `^{}` marks a zero-width offense. A message ending in ` [...]` only has to
//! be a prefix of the actual one, and an annotation without a message accepts
//! any message. Columns count bytes from the start of the line.
//!
//! The helpers here panic with a rendered diff on mismatch, so they are meant
//! for `#[test]` functions only.

use crate::driver::{Convergence, Driver, DriverOptions, UnitReport};
use crate::ledger::Offense;
use crate::registry::Registry;
use std::fmt;
use thiserror::Error;

const ABBREVIATION: &str = " [...]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("caret line {line} has no source line above it")]
    CaretBeforeSource { line: usize },
}

/// One caret annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Zero-based index of the annotated line in the plain source.
    pub line: usize,
    /// Byte column where the carets start.
    pub column: usize,
    /// Number of carets; 0 renders as `^{}`.
    pub width: usize,
    pub message: Option<String>,
}

impl Annotation {
    fn render(&self) -> String {
        let carets = if self.width == 0 {
            "^{}".to_string()
        } else {
            "^".repeat(self.width)
        };
        match &self.message {
            Some(message) => format!("{}{carets} {message}", " ".repeat(self.column)),
            None => format!("{}{carets}", " ".repeat(self.column)),
        }
    }

    fn position(&self) -> (usize, usize, usize) {
        (self.line, self.column, self.width)
    }

    fn accepts(&self, message: &str) -> bool {
        match &self.message {
            None => true,
            Some(expected) => match expected.strip_suffix(ABBREVIATION) {
                Some(prefix) => message.starts_with(prefix),
                None => expected == message,
            },
        }
    }
}

/// Source lines plus the annotations interleaved with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSource {
    lines: Vec<String>,
    trailing_newline: bool,
    annotations: Vec<Annotation>,
}

impl AnnotatedSource {
    pub fn parse(annotated: &str) -> Result<Self, AnnotationError> {
        let mut lines: Vec<String> = Vec::new();
        let mut annotations = Vec::new();

        for (index, raw) in annotated.lines().enumerate() {
            match parse_caret_line(raw) {
                Some((column, width, message)) => {
                    let Some(line) = lines.len().checked_sub(1) else {
                        return Err(AnnotationError::CaretBeforeSource { line: index + 1 });
                    };
                    annotations.push(Annotation {
                        line,
                        column,
                        width,
                        message,
                    });
                }
                None => lines.push(raw.to_string()),
            }
        }

        annotations.sort_by_key(Annotation::position);
        Ok(Self {
            lines,
            trailing_newline: annotated.ends_with('\n'),
            annotations,
        })
    }

    /// The source with every caret line removed.
    pub fn plain_source(&self) -> String {
        let mut source = self.lines.join("\n");
        if self.trailing_newline {
            source.push('\n');
        }
        source
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Same source, annotated with `offenses` instead.
    pub fn with_offenses(&self, offenses: &[Offense]) -> Self {
        let source = self.plain_source();
        let starts = line_starts(&source);

        let mut annotations: Vec<Annotation> = offenses
            .iter()
            .map(|offense| {
                let start = offense.range.start.min(source.len());
                let line = starts.partition_point(|&s| s <= start).saturating_sub(1);
                let line_end = source[start..]
                    .find('\n')
                    .map_or(source.len(), |pos| start + pos);
                Annotation {
                    line,
                    column: start - starts[line],
                    width: offense.range.end.min(line_end).saturating_sub(start),
                    message: Some(offense.message.clone()),
                }
            })
            .collect();
        annotations.sort_by_key(Annotation::position);

        Self {
            lines: self.lines.clone(),
            trailing_newline: self.trailing_newline,
            annotations,
        }
    }

    /// Copy `actual`'s annotations, adopting this fixture's wording wherever
    /// an abbreviated or omitted message accepts the actual one.
    pub fn match_annotations(&self, actual: &AnnotatedSource) -> Self {
        let mut used = vec![false; self.annotations.len()];
        let annotations = actual
            .annotations
            .iter()
            .map(|annotation| {
                let found = self.annotations.iter().enumerate().find(|(i, expected)| {
                    !used[*i]
                        && expected.position() == annotation.position()
                        && annotation
                            .message
                            .as_deref()
                            .is_some_and(|message| expected.accepts(message))
                });
                match found {
                    Some((i, expected)) => {
                        used[i] = true;
                        expected.clone()
                    }
                    None => annotation.clone(),
                }
            })
            .collect();

        Self {
            lines: actual.lines.clone(),
            trailing_newline: actual.trailing_newline,
            annotations,
        }
    }
}

impl fmt::Display for AnnotatedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut annotations = self.annotations.iter().peekable();
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
            while let Some(annotation) = annotations.next_if(|a| a.line == index) {
                write!(f, "\n{}", annotation.render())?;
            }
        }
        if self.trailing_newline {
            writeln!(f)?;
        }
        Ok(())
    }
}

/// `(column, width, message)` if `line` is a caret line.
fn parse_caret_line(line: &str) -> Option<(usize, usize, Option<String>)> {
    let body = line.trim_start_matches(' ');
    let column = line.len() - body.len();

    let (width, rest) = if let Some(rest) = body.strip_prefix("^{}") {
        (0, rest)
    } else {
        let width = body.bytes().take_while(|&b| b == b'^').count();
        if width == 0 {
            return None;
        }
        (width, &body[width..])
    };

    if rest.is_empty() {
        return Some((column, width, None));
    }
    let message = rest.strip_prefix(' ')?;
    Some((column, width, Some(message.to_string())))
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// A fixture whose offenses have been checked, ready for correction checks.
pub struct Fixture<'r> {
    registry: &'r Registry,
    options: DriverOptions,
    source: String,
    offenses: Vec<Offense>,
}

impl<'r> Fixture<'r> {
    /// The plain source the offenses were checked against.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn offenses(&self) -> &[Offense] {
        &self.offenses
    }

    /// Assert that autocorrection reaches a fixpoint with exactly `expected`.
    #[track_caller]
    pub fn expect_correction(&self, expected: &str) -> UnitReport {
        let report = self.run();
        assert_eq!(
            report.final_text(),
            expected,
            "corrected source does not match"
        );
        assert_eq!(
            report.convergence(),
            Some(Convergence::Fixpoint),
            "autocorrection did not reach a fixpoint: {:?}",
            report.outcome
        );
        report
    }

    /// Assert that no rule offers a correction for this fixture.
    #[track_caller]
    pub fn expect_no_corrections(&self) {
        assert!(
            self.offenses.iter().all(|offense| !offense.correctable),
            "expected no correctable offenses, got {:?}",
            self.offenses
        );
        let report = self.run();
        assert_eq!(
            report.corrected_text(),
            None,
            "expected the source to stay unchanged"
        );
    }

    #[track_caller]
    fn run(&self) -> UnitReport {
        Driver::new(self.registry, self.options)
            .run(&self.source)
            .unwrap_or_else(|err| panic!("fixture source does not parse: {err}"))
    }
}

/// Assert that `registry` reports exactly the offenses annotated in `annotated`.
#[track_caller]
pub fn expect_offense<'r>(registry: &'r Registry, annotated: &str) -> Fixture<'r> {
    expect_offense_with(registry, DriverOptions::default(), annotated)
}

#[track_caller]
pub fn expect_offense_with<'r>(
    registry: &'r Registry,
    options: DriverOptions,
    annotated: &str,
) -> Fixture<'r> {
    let expected = AnnotatedSource::parse(annotated)
        .unwrap_or_else(|err| panic!("malformed offense annotation: {err}"));
    let source = expected.plain_source();
    let offenses = Driver::new(registry, options)
        .analyze(&source)
        .unwrap_or_else(|err| panic!("fixture source does not parse: {err}"))
        .sorted_offenses();

    let actual = expected.match_annotations(&expected.with_offenses(&offenses));
    assert_eq!(
        actual.to_string(),
        expected.to_string(),
        "offense annotations do not match"
    );

    Fixture {
        registry,
        options,
        source,
        offenses,
    }
}

/// Assert that `registry` finds nothing in `source`.
#[track_caller]
pub fn expect_no_offenses(registry: &Registry, source: &str) {
    let ledger = Driver::new(registry, DriverOptions::default())
        .analyze(source)
        .unwrap_or_else(|err| panic!("fixture source does not parse: {err}"));
    let expected = AnnotatedSource::parse(source)
        .unwrap_or_else(|err| panic!("malformed offense annotation: {err}"));
    let actual = expected.with_offenses(&ledger.sorted_offenses());
    assert_eq!(actual.to_string(), source, "expected no offenses");
}
