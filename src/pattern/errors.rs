use thiserror::Error;

/// Compile error for pattern text. Offsets are bytes into the pattern string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid capture name at offset {offset}")]
    InvalidCaptureName { offset: usize },

    #[error("unterminated '{open}' opened at offset {offset}")]
    Unterminated { open: char, offset: usize },

    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("pattern ends unexpectedly at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("empty '{open}' group at offset {offset}")]
    EmptyGroup { open: char, offset: usize },

    #[error("'...' is only allowed among sequence children (offset {offset})")]
    MisplacedRest { offset: usize },

    #[error("trailing input after pattern at offset {offset}")]
    TrailingInput { offset: usize },
}
