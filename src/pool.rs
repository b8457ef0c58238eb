//! Thread-local parser pooling.
//!
//! Each worker thread keeps one parser per language, created on first use and
//! reused for every later unit and autocorrection pass on that thread.

use crate::ts::{ParseError, ParsedSource, SourceParser};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<String, SourceParser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with the pooled parser for `language`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ast_grep_language::SupportLang;
/// use cop_engine::pool::with_parser;
///
/// let kind = with_parser(SupportLang::Rust, |parser| {
///     parser.parse("fn main() {}").map(|parsed| parsed.root().kind())
/// })??;
/// assert_eq!(kind, "source_file");
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(language: SupportLang, f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut SourceParser) -> R,
{
    let key = format!("{language:?}");
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(key) {
            std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(SourceParser::new(language)?)
            }
        };
        Ok(f(parser))
    })
}

/// Parse `source` strictly with the pooled parser for `language`.
pub fn parse(language: SupportLang, source: &str) -> Result<ParsedSource<'_>, ParseError> {
    with_parser(language, |parser| parser.parse(source))?
}
