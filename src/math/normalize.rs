//! Input normalization for arithmetic expressions
//!
//! Turns conversational input ("what's 10% of 200") into the compact
//! operator form the parser reads ("(10/100)*200").

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that signal the user wants a calculation.
pub const MATH_KEYWORDS: &[&str] = &[
    "calculate",
    "compute",
    "evaluate",
    "solve",
    "what is",
    "what's",
    "find",
];

static INTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:calculate|compute|evaluate|solve|what\s+is|what's|what’s|find)\b")
        .expect("Invalid intent regex")
});

static TRAILING_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.!=]+$").expect("Invalid punctuation regex"));

/// Word operators, applied in order. Longer phrases come first so
/// "to the power of" is consumed before the bare "of" rewrite.
static WORD_OPERATORS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bto\s+the\s+power\s+of\b", "**"),
        (r"\bmultiplied\s+by\b", "*"),
        (r"\bdivided\s+by\b", "/"),
        (r"\bplus\b", "+"),
        (r"\bminus\b", "-"),
        (r"\btimes\b", "*"),
        (r"\bover\b", "/"),
    ]
    .into_iter()
    .map(|(pattern, op)| (Regex::new(pattern).expect("Invalid operator regex"), op))
    .collect()
});

/// `N%` becomes `(N/100)` so a following multiplicand binds to the whole
/// fraction: "10% of 200" -> "(10/100) * 200".
static PERCENT_OF_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)\s*%").expect("Invalid percent regex")
});

static OF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bof\b").expect("Invalid of regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Strip intent keywords and trailing sentence punctuation, leaving the
/// bare expression as the user typed it.
///
/// ```text
/// "what is 4 + 4"    -> "4 + 4"
/// "Calculate 2^10."  -> "2^10"
/// ```
pub fn extract_expression(text: &str) -> String {
    let without_intent = INTENT_RE.replace_all(text, " ");
    let trimmed = TRAILING_PUNCT_RE.replace(without_intent.trim(), "");
    trimmed.trim().to_string()
}

/// Normalize raw input into operator form.
///
/// Lower-cases, extracts the expression, rewrites word operators,
/// `^` to `**`, percentages to `/100`, `of` to `*`, and strips all
/// whitespace. Pure and deterministic.
pub fn normalize(text: &str) -> String {
    let mut expr = extract_expression(&text.to_lowercase());

    for (pattern, op) in WORD_OPERATORS.iter() {
        expr = pattern.replace_all(&expr, *op).into_owned();
    }

    expr = expr.replace('^', "**");
    expr = PERCENT_OF_NUMBER_RE
        .replace_all(&expr, "($1/100)")
        .into_owned();
    // Percent signs not attached to a literal, e.g. "(5+5)%"
    expr = expr.replace('%', "/100");
    expr = OF_RE.replace_all(&expr, "*").into_owned();

    WHITESPACE_RE.replace_all(&expr, "").into_owned()
}
