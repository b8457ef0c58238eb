//! Thread-local pattern compilation cache.
//!
//! Rules that share pattern text share one compiled [`Pattern`].
//! Cache is capped at 256 entries; when full it is cleared and refilled on demand.

use crate::pattern::{Pattern, PatternError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static PATTERN_CACHE: RefCell<HashMap<String, Arc<Pattern>>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Compile errors are not cached; a broken pattern fails every time it is
/// requested.
pub fn get_or_compile_pattern(pattern_str: &str) -> Result<Arc<Pattern>, PatternError> {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(pattern_str) {
            return Ok(Arc::clone(p));
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Arc::new(Pattern::compile(pattern_str)?);
        cache.insert(pattern_str.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    })
}

/// Clear the pattern cache (mainly for testing).
pub fn clear_cache() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

pub fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}
