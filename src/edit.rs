use crate::rule::RuleId;
use crate::span::Span;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The correction primitive: a verified byte-span replacement.
///
/// Every rule correction compiles down to this. An edit carries the text it
/// expects to replace, so it can never be applied to a buffer other than the
/// one its range was computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until it is applied"]
pub struct Edit {
    /// Half-open byte range `[start, end)`
    pub range: Span,
    pub new_text: String,
    /// Rule that proposed this edit
    pub rule: RuleId,
    /// Registration index of that rule
    pub rule_index: usize,
    /// Declared priority of that rule
    pub priority: i32,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at {range} (rule {rule})")]
    BeforeTextMismatch {
        rule: String,
        range: Span,
        expected: String,
        found: String,
    },

    #[error("invalid byte range {range} in buffer of length {len}")]
    InvalidByteRange { range: Span, len: usize },

    #[error("byte range {range} does not fall on UTF-8 character boundaries")]
    NotCharBoundary { range: Span },

    #[error("edits overlap at {first} and {second}")]
    Overlap { first: Span, second: Span },

    #[error("{path}: contents changed since they were read")]
    SourceChanged { path: PathBuf },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Create an edit with automatic verification generation.
    pub fn new(
        rule: RuleId,
        range: Span,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            range,
            new_text: new_text.into(),
            rule,
            rule_index: 0,
            priority: 0,
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Record the proposing rule's registration index and priority.
    pub fn with_order(mut self, rule_index: usize, priority: i32) -> Self {
        self.rule_index = rule_index;
        self.priority = priority;
        self
    }

    /// Validate the edit against `content`.
    ///
    /// Returns the current text at the edit's range if validation succeeds.
    pub fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.range.start > self.range.end || self.range.end > content.len() {
            return Err(EditError::InvalidByteRange {
                range: self.range,
                len: content.len(),
            });
        }

        let current = content
            .get(self.range.as_range())
            .ok_or(EditError::NotCharBoundary { range: self.range })?;

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                rule: self.rule.to_string(),
                range: self.range,
                expected: format!("{:?}", self.expected_before),
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// True when applying the edit would leave `content` unchanged.
    pub fn is_noop(&self, content: &str) -> bool {
        content.get(self.range.as_range()) == Some(self.new_text.as_str())
    }

    /// Apply this single edit to an in-memory buffer.
    pub fn apply_to(&self, content: &str) -> Result<String, EditError> {
        self.validate(content)?;
        let mut out = String::with_capacity(content.len() + self.new_text.len());
        out.push_str(&content[..self.range.start]);
        out.push_str(&self.new_text);
        out.push_str(&content[self.range.end..]);
        Ok(out)
    }

    pub fn conflicts_with(&self, other: &Edit) -> bool {
        self.range.conflicts_with(other.range)
    }
}

/// Replace the contents of `path` with `corrected`, provided the file still
/// holds `original`.
///
/// Uses tempfile + fsync + rename, then bumps the mtime.
pub fn persist(path: &Path, original: &str, corrected: &str) -> Result<(), EditError> {
    let on_disk = fs::read_to_string(path)?;
    if xxh3_64(on_disk.as_bytes()) != xxh3_64(original.as_bytes()) {
        return Err(EditError::SourceChanged {
            path: path.to_path_buf(),
        });
    }

    atomic_write(path, corrected.as_bytes())?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now)?;
    Ok(())
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Tempfile in the same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
