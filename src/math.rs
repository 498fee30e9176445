//! Local deterministic math path
//!
//! Classifies input as arithmetic and evaluates it through a pluggable
//! numeric engine. Every failure is absorbed into an apology string at the
//! [`MathBackend::evaluate_reply`] boundary.

mod classify;
mod engine;
mod normalize;
mod number;
mod parser;

#[cfg(test)]
mod proptests;

pub use classify::is_math_expression;
pub use engine::{ExactBackend, NumericBackend};
pub use normalize::{extract_expression, normalize, MATH_KEYWORDS};
pub use number::{Number, Rational};
pub use parser::{parse, BinaryOp, Constant, Expr, Function};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Arithmetic fault raised while evaluating a well-formed expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalFault {
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    Overflow,
    #[error("argument outside the function's domain")]
    Domain,
}

/// Math path error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("could not parse expression: {0}")]
    Parse(String),
    #[error("cannot evaluate, contains variables: {}", .0.join(", "))]
    HasFreeVariables(Vec<String>),
    #[error("evaluation failed: {0}")]
    Eval(EvalFault),
}

impl MathError {
    /// User-facing reply for this failure
    pub fn apology(&self) -> &'static str {
        match self {
            MathError::Parse(_) => "I'm sorry, I couldn't evaluate that expression.",
            MathError::HasFreeVariables(_) => {
                "I'm sorry, I couldn't evaluate that expression because it contains variables."
            }
            MathError::Eval(_) => "An error occurred while evaluating the expression.",
        }
    }
}

/// Numeric engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathEngine {
    /// Rational arithmetic, floats only where exactness is impossible
    #[default]
    Exact,
    /// Plain `f64` arithmetic
    Numeric,
}

impl MathEngine {
    pub fn backend(self) -> Box<dyn MathBackend> {
        match self {
            MathEngine::Exact => Box::new(ExactBackend),
            MathEngine::Numeric => Box::new(NumericBackend),
        }
    }
}

impl fmt::Display for MathEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathEngine::Exact => write!(f, "exact"),
            MathEngine::Numeric => write!(f, "numeric"),
        }
    }
}

impl FromStr for MathEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "symbolic" => Ok(MathEngine::Exact),
            "numeric" | "fast" => Ok(MathEngine::Numeric),
            other => Err(format!("unknown math engine '{other}' (expected exact or numeric)")),
        }
    }
}

/// Common interface for math engines
///
/// Engines differ only in how literals and function results are
/// represented; parsing, the free-symbol check and tree walking are shared.
pub trait MathBackend: Send + Sync {
    /// Engine identity, for logging
    fn engine(&self) -> MathEngine;

    /// Read a decimal literal
    fn literal(&self, text: &str) -> Result<Number, MathError>;

    /// Apply a built-in function
    fn call(&self, func: Function, arg: Number) -> Result<Number, MathError>;

    /// Decide whether `text` should be routed to this backend.
    fn classify(&self, text: &str) -> bool {
        is_math_expression(text)
    }

    /// Evaluate an already parsed, closed expression.
    fn eval(&self, expr: &Expr) -> Result<Number, MathError> {
        match expr {
            Expr::Number(literal) => self.literal(literal),
            Expr::Constant(Constant::Pi) => Ok(Number::Float(std::f64::consts::PI)),
            Expr::Symbol(name) | Expr::Undefined { name, .. } => {
                Err(MathError::HasFreeVariables(vec![name.clone()]))
            }
            Expr::Neg(inner) => self.eval(inner)?.neg(),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match op {
                    BinaryOp::Add => lhs.add(rhs),
                    BinaryOp::Sub => lhs.sub(rhs),
                    BinaryOp::Mul => lhs.mul(rhs),
                    BinaryOp::Div => lhs.div(rhs),
                    BinaryOp::Pow => lhs.pow(rhs),
                }
            }
            Expr::Call { func, arg } => self.call(*func, self.eval(arg)?),
        }
    }

    /// Normalize, parse and evaluate raw input.
    fn evaluate(&self, text: &str) -> Result<Number, MathError> {
        let expr = parse(&normalize(text))?;
        let free = expr.free_symbols();
        if !free.is_empty() {
            return Err(MathError::HasFreeVariables(free.into_iter().collect()));
        }
        self.eval(&expr)
    }

    /// Evaluate and render the outcome as reply text. The flag is `true`
    /// when the text is a numeric result rather than an apology.
    fn evaluate_reply(&self, text: &str) -> (String, bool) {
        match self.evaluate(text) {
            Ok(value) => (value.to_string(), true),
            Err(e) => {
                tracing::debug!(engine = %self.engine(), error = %e, "Math evaluation failed");
                (e.apology().to_string(), false)
            }
        }
    }
}
