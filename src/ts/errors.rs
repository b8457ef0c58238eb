use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParseError {
    #[error("failed to set language {language} for parser")]
    LanguageSet { language: String },

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("multiple syntax errors detected: {count} ERROR nodes, first at byte {byte_start}..{byte_end}")]
    MultipleSyntaxErrors {
        count: usize,
        byte_start: usize,
        byte_end: usize,
    },
}
