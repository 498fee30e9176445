//! Math engine implementations

use super::{EvalFault, Function, MathBackend, MathEngine, MathError, Number, Rational};

/// Exact rational engine
///
/// Literals are read as fractions, so decimal arithmetic does not pick up
/// binary rounding noise. Integer powers, `abs` and perfect-square `sqrt`
/// stay exact; everything else continues in `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactBackend;

impl MathBackend for ExactBackend {
    fn engine(&self) -> MathEngine {
        MathEngine::Exact
    }

    fn literal(&self, text: &str) -> Result<Number, MathError> {
        match Rational::from_decimal(text) {
            Some(r) => Ok(Number::Exact(r)),
            // Too many digits for 128 bits
            None => NumericBackend.literal(text),
        }
    }

    fn call(&self, func: Function, arg: Number) -> Result<Number, MathError> {
        if let Number::Exact(r) = arg {
            let exact = match func {
                Function::Sqrt => r.exact_sqrt(),
                Function::Abs => r.abs(),
                _ => None,
            };
            if let Some(result) = exact {
                return Ok(Number::Exact(result));
            }
        }
        apply_f64(func, arg.to_f64())
    }
}

/// Fast `f64` engine
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericBackend;

impl MathBackend for NumericBackend {
    fn engine(&self) -> MathEngine {
        MathEngine::Numeric
    }

    fn literal(&self, text: &str) -> Result<Number, MathError> {
        let value: f64 = text
            .parse()
            .map_err(|e| MathError::Parse(format!("invalid number '{text}': {e}")))?;
        Number::float(value)
    }

    fn call(&self, func: Function, arg: Number) -> Result<Number, MathError> {
        apply_f64(func, arg.to_f64())
    }
}

fn apply_f64(func: Function, x: f64) -> Result<Number, MathError> {
    let value = match func {
        Function::Sqrt if x < 0.0 => return Err(MathError::Eval(EvalFault::Domain)),
        Function::Sqrt => x.sqrt(),
        Function::Sin => x.sin(),
        Function::Cos => x.cos(),
        Function::Tan => x.tan(),
        Function::Ln if x <= 0.0 => return Err(MathError::Eval(EvalFault::Domain)),
        Function::Ln => x.ln(),
        Function::Exp => x.exp(),
        Function::Abs => x.abs(),
    };
    Number::float(snap_to_integer(value))
}

/// Results within a few ULP of an integer are taken to be that integer, so
/// `cos(pi/2)` is 0 rather than 6.1e-17.
fn snap_to_integer(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= 4.0 * f64::EPSILON * nearest.abs().max(1.0) {
        nearest
    } else {
        value
    }
}
