//! Property-based tests for classification and evaluation
//!
//! These verify the routing rules hold for arbitrary input:
//! - Anything ending in `?` is never math
//! - Anything containing an intent keyword is always math
//! - Integer arithmetic prints without a fractional part
//! - Both engines agree on integer arithmetic
//! - Evaluation never panics, whatever the input

use super::{is_math_expression, ExactBackend, MathBackend, NumericBackend, MATH_KEYWORDS};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Small integer arithmetic expression without division
fn arb_integer_expr() -> impl Strategy<Value = String> {
    // Bounded so every intermediate stays exactly representable in f64
    let leaf = (-9i64..10).prop_map(|n| format!("({n})"));
    leaf.prop_recursive(3, 8, 2, |inner| {
        (inner.clone(), prop_oneof![Just("+"), Just("-"), Just("*")], inner)
            .prop_map(|(lhs, op, rhs)| format!("({lhs}{op}{rhs})"))
    })
}

fn arb_keyword() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(MATH_KEYWORDS)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_question_never_math(body in "[a-z0-9 +*/^%-]{0,40}") {
        let input = format!("{body}?");
        prop_assert!(!is_math_expression(&input));
    }

    #[test]
    fn prop_keyword_always_math(
        prefix in "[a-z ]{0,10}",
        keyword in arb_keyword(),
        suffix in "[a-z0-9 ]{0,20}",
    ) {
        let input = format!("{prefix}{keyword}{suffix}");
        prop_assert!(is_math_expression(&input));
    }

    #[test]
    fn prop_integer_results_have_no_fraction(expr in arb_integer_expr()) {
        let (text, ok) = ExactBackend.evaluate_reply(&expr);
        prop_assert!(ok, "failed on {}", expr);
        prop_assert!(text.parse::<i128>().is_ok(), "{} -> {}", expr, text);
    }

    #[test]
    fn prop_engines_agree_on_integers(expr in arb_integer_expr()) {
        prop_assert_eq!(
            ExactBackend.evaluate_reply(&expr),
            NumericBackend.evaluate_reply(&expr)
        );
    }

    #[test]
    fn prop_bare_integer_expressions_classify_as_math(expr in arb_integer_expr()) {
        prop_assert!(is_math_expression(&expr));
    }

    #[test]
    fn prop_evaluation_never_panics(input in "\\PC{0,60}") {
        let _ = ExactBackend.evaluate_reply(&input);
        let _ = NumericBackend.evaluate_reply(&input);
    }

    #[test]
    fn prop_evaluation_is_deterministic(expr in arb_integer_expr()) {
        prop_assert_eq!(
            ExactBackend.evaluate_reply(&expr),
            ExactBackend.evaluate_reply(&expr)
        );
    }
}
