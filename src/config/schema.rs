use crate::driver::DEFAULT_MAX_ITERATIONS;
use crate::patch::TieBreak;
use ast_grep_language::SupportLang;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Worker threads for multi-file runs; 0 picks rayon's default.
    #[serde(default)]
    pub threads: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_iterations: default_max_iterations(),
            tie_break: TieBreak::default(),
            threads: 0,
        }
    }
}

fn default_language() -> String {
    "rust".to_string()
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.engine.max_iterations == 0 {
            issues.push(ValidationIssue::OutOfRange {
                field: "engine.max_iterations",
                message: "must be at least 1".to_string(),
            });
        }

        if let Err(err) = SupportLang::from_str(&self.engine.language) {
            issues.push(ValidationIssue::UnknownLanguage {
                language: self.engine.language.clone(),
                message: err.to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Configured language. Falls back to Rust for a name `validate` would reject.
    pub fn language(&self) -> SupportLang {
        SupportLang::from_str(&self.engine.language).unwrap_or(SupportLang::Rust)
    }
}

#[derive(Error, Debug, Clone)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Error, Debug, Clone)]
pub enum ValidationIssue {
    #[error("'{field}' {message}")]
    OutOfRange {
        field: &'static str,
        message: String,
    },
    #[error("unknown language '{language}': {message}")]
    UnknownLanguage {
        language: String,
        message: String,
    },
}
