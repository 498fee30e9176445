//! Arithmetic intent classification

use super::normalize::{normalize, MATH_KEYWORDS};
use super::parser::parse;

/// Decide whether `text` is a math request.
///
/// Rules, first match wins:
/// 1. Input ending in `?` is free-form text.
/// 2. Input containing an intent keyword is math, parseable or not.
/// 3. Otherwise it is math iff it parses with no free symbols.
pub fn is_math_expression(text: &str) -> bool {
    if text.trim().ends_with('?') {
        return false;
    }

    let lowered = text.to_lowercase();
    if MATH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        return true;
    }

    match parse(&normalize(text)) {
        Ok(expr) => expr.free_symbols().is_empty(),
        Err(_) => false,
    }
}
