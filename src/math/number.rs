//! Numeric values produced by the math engines
//!
//! Exact rationals are kept as long as every operation stays representable
//! in 128-bit integers. Anything else (irrational results, non-integer
//! powers, integer overflow) continues in `f64`.

use super::{EvalFault, MathError};
use std::fmt;

/// Reduced fraction with a positive denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    // gcd of two i128 magnitudes only exceeds i128::MAX for (MIN, 0)/(MIN, MIN)
    i128::try_from(a).unwrap_or(1)
}

impl Rational {
    /// Build a reduced rational. Returns `None` on a zero denominator or
    /// when normalizing the sign would overflow.
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den).max(1);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = num.checked_neg()?;
            den = den.checked_neg()?;
        }
        Some(Self { num, den })
    }

    pub fn integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Read a decimal literal exactly ("12.50" -> 25/2).
    pub fn from_decimal(literal: &str) -> Option<Self> {
        let (int_part, frac_part) = literal.split_once('.').unwrap_or((literal, ""));
        let digits = format!("{int_part}{frac_part}");
        let num: i128 = if digits.is_empty() {
            0
        } else {
            digits.parse().ok()?
        };
        let scale = u32::try_from(frac_part.len()).ok()?;
        let den = 10i128.checked_pow(scale)?;
        Self::new(num, den)
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let num = self
            .num
            .checked_mul(rhs.den)?
            .checked_add(rhs.num.checked_mul(self.den)?)?;
        Self::new(num, self.den.checked_mul(rhs.den)?)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.checked_add(rhs.checked_neg()?)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        // Cross-reduce first to keep intermediates small
        let g1 = gcd(self.num, rhs.den).max(1);
        let g2 = gcd(rhs.num, self.den).max(1);
        let num = (self.num / g1).checked_mul(rhs.num / g2)?;
        let den = (self.den / g2).checked_mul(rhs.den / g1)?;
        Self::new(num, den)
    }

    /// Divide; `None` on overflow. Callers check for a zero divisor first.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.checked_mul(rhs.recip()?)
    }

    pub fn checked_neg(self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_neg()?,
            den: self.den,
        })
    }

    fn recip(self) -> Option<Self> {
        Self::new(self.den, self.num)
    }

    /// Raise to an integer power. `None` on overflow.
    pub fn checked_powi(self, exponent: i128) -> Option<Self> {
        let magnitude = u32::try_from(exponent.unsigned_abs()).ok()?;
        let raised = Self {
            num: self.num.checked_pow(magnitude)?,
            den: self.den.checked_pow(magnitude)?,
        };
        if exponent < 0 {
            raised.recip()
        } else {
            Some(raised)
        }
    }

    /// Exact square root when both parts are perfect squares.
    pub fn exact_sqrt(self) -> Option<Self> {
        if self.num < 0 {
            return None;
        }
        Some(Self {
            num: isqrt_exact(self.num)?,
            den: isqrt_exact(self.den)?,
        })
    }

    pub fn abs(self) -> Option<Self> {
        if self.num < 0 {
            self.checked_neg()
        } else {
            Some(self)
        }
    }

    /// Integer value of the exponent when it is one.
    pub fn as_integer(self) -> Option<i128> {
        self.is_integer().then_some(self.num)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn isqrt_exact(value: i128) -> Option<i128> {
    let guess = (value as f64).sqrt().round() as i128;
    // Float guess can be off by one for large inputs
    (guess.saturating_sub(1)..=guess.saturating_add(1))
        .find(|candidate| *candidate >= 0 && candidate.checked_mul(*candidate) == Some(value))
}

/// Result of evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Exact(Rational),
    Float(f64),
}

impl Number {
    /// Wrap a float result, rejecting NaN and infinities.
    pub fn float(value: f64) -> Result<Self, MathError> {
        if value.is_nan() {
            Err(MathError::Eval(EvalFault::Domain))
        } else if value.is_infinite() {
            Err(MathError::Eval(EvalFault::Overflow))
        } else {
            Ok(Number::Float(value))
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Exact(r) => r.to_f64(),
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Exact(r) => r.is_zero(),
            Number::Float(f) => f == 0.0,
        }
    }

    /// Combine exactly when both sides are exact and the exact operation
    /// fits, otherwise fall back to the float operation.
    fn combine(
        self,
        rhs: Self,
        exact: impl FnOnce(Rational, Rational) -> Option<Rational>,
        float: impl FnOnce(f64, f64) -> f64,
    ) -> Result<Self, MathError> {
        if let (Number::Exact(a), Number::Exact(b)) = (self, rhs) {
            if let Some(result) = exact(a, b) {
                return Ok(Number::Exact(result));
            }
        }
        Number::float(float(self.to_f64(), rhs.to_f64()))
    }

    pub fn add(self, rhs: Self) -> Result<Self, MathError> {
        self.combine(rhs, Rational::checked_add, |a, b| a + b)
    }

    pub fn sub(self, rhs: Self) -> Result<Self, MathError> {
        self.combine(rhs, Rational::checked_sub, |a, b| a - b)
    }

    pub fn mul(self, rhs: Self) -> Result<Self, MathError> {
        self.combine(rhs, Rational::checked_mul, |a, b| a * b)
    }

    pub fn div(self, rhs: Self) -> Result<Self, MathError> {
        if rhs.is_zero() {
            return Err(MathError::Eval(EvalFault::DivisionByZero));
        }
        self.combine(rhs, Rational::checked_div, |a, b| a / b)
    }

    pub fn neg(self) -> Result<Self, MathError> {
        match self {
            Number::Exact(r) => Ok(r
                .checked_neg()
                .map_or_else(|| Number::Float(-r.to_f64()), Number::Exact)),
            Number::Float(f) => Ok(Number::Float(-f)),
        }
    }

    pub fn pow(self, exponent: Self) -> Result<Self, MathError> {
        if self.is_zero() && exponent.to_f64() < 0.0 {
            return Err(MathError::Eval(EvalFault::DivisionByZero));
        }
        if let (Number::Exact(base), Number::Exact(exp)) = (self, exponent) {
            if let Some(result) = exp.as_integer().and_then(|e| base.checked_powi(e)) {
                return Ok(Number::Exact(result));
            }
        }
        Number::float(self.to_f64().powf(exponent.to_f64()))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Exact(r) if r.is_integer() => write!(f, "{}", r.num),
            Number::Exact(r) => write_float(f, r.to_f64()),
            Number::Float(value) => write_float(f, *value),
        }
    }
}

/// Integral floats print without a fractional part ("8", not "8.0"),
/// others in shortest round-trip form. Magnitudes below 1e-4 or from 1e16
/// up switch to scientific notation ("1e-5", "1.5e20").
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value == 0.0 {
        // Avoid "-0"
        return write!(f, "0");
    }
    let magnitude = value.abs();
    if !(1e-4..1e16).contains(&magnitude) {
        return write!(f, "{value:e}");
    }
    write!(f, "{value}")
}
