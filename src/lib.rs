//! # symcalc
//!
//! `symcalc` is a Rust library that parses mathematical expressions into a
//! tree and then **executes**, **differentiates**, **simplifies** or
//! **formats** that tree.
//!
//! ## Overview
//! - Real, complex, boolean, vector and matrix values.
//! - Arithmetic, logic, bitwise and relational operators.
//! - Trigonometric, hyperbolic, logarithmic, rounding, complex, matrix and
//!   statistical functions.
//! - Variables, read-only parameters and user functions, defined from the
//!   host or from expressions (`x := 2`, `f(x) := x ^ 2`).
//! - `if`, `for` and `while`, compound assignments, `++` and `--`.
//! - Symbolic derivatives with `deriv(...)` or [`differentiate`], and an
//!   algebraic simplifier running to a fixed point.
//! - Plain text and LaTeX output.
//!
//! Internally, text is first split into tokens by the [`lexer`], the
//! [`parser`] builds an [`Expression`] with precedence climbing, and every
//! further operation is a recursive match over that tree.
//!
//! ## Example
//! ```rust
//! use symcalc::{calculate, ExpressionParameters, Value};
//!
//! let mut params = ExpressionParameters::new();
//! calculate("f(x) := x ^ 2 + 1", &mut params).unwrap();
//!
//! assert_eq!(calculate("f(3)", &mut params).unwrap(), Value::Number(10.0));
//! assert_eq!(calculate("deriv(x ^ 3, x, 2)", &mut params).unwrap(), Value::Number(12.0));
//! ```
//!
//! ## Example: Symbolic Operations
//! ```rust
//! use symcalc::{differentiate, parse, simplify, to_latex};
//!
//! let expr = parse("sin(x) * x").unwrap();
//! let derivative = simplify(&differentiate(&expr, "x").unwrap()).unwrap();
//!
//! assert_eq!(derivative.to_string(), "cos(x) * x + sin(x)");
//! assert_eq!(to_latex(&parse("x ^ 2 / 2").unwrap()), "\\frac{x^{2}}{2}");
//! ```
//!
//! ## Example: Retrieving All Names
//! ```rust
//! use symcalc::{constants, functions, BinaryOperatorKind, UnaryOperatorKind};
//!
//! let constant_names: Vec<&'static str> = constants::names();
//! let unary_names: Vec<&'static str> = UnaryOperatorKind::names();
//! let binary_names: Vec<&'static str> = BinaryOperatorKind::names();
//! let function_names: Vec<&'static str> = functions::names();
//!
//! assert!(constant_names.contains(&"pi"));
//! assert!(unary_names.contains(&"not"));
//! assert!(binary_names.contains(&"<=>"));
//! assert!(function_names.contains(&"arcsin"));
//! ```
//!
//! ## Logging
//! Token streams are reported at `trace` level and parsed trees, simplifier
//! passes and user-function definitions at `debug` level through the
//! [`log`] facade. No logger is installed by the crate.
//!
//! ## License
//! Licensed under either **MIT** or **Apache-2.0** at your option.

pub mod constants;
mod differentiator;
mod error;
mod evaluator;
mod expression;
mod formatter;
pub mod functions;
pub mod lexer;
pub mod operators;
mod parameters;
pub mod parser;
mod simplifier;
pub mod token;
mod value;
mod workspace;

pub use crate::differentiator::differentiate;
pub use crate::error::{
    DifferentiationError, Error, ExecutionError, LexError, LexErrorKind, ParametersError, ParseError,
    ParseErrorKind, SimplifyError,
};
pub use crate::evaluator::execute;
pub use crate::expression::Expression;
pub use crate::formatter::{to_latex, to_string};
pub use crate::functions::FunctionKind;
pub use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};
pub use crate::parameters::{
    ExpressionParameters, Functions, Parameter, ParameterKind, Parameters, UserFunctionDefinition,
    DEFAULT_RECURSION_LIMIT,
};
pub use crate::simplifier::{simplify, MAX_SIMPLIFY_PASSES};
pub use crate::value::{AngleUnit, Value};
pub use crate::workspace::{SavedVariable, Workspace};

/// Parses a mathematical expression into a tree.
///
/// # Parameters
/// - `text`: The expression source.
///
/// # Returns
/// - `Ok(Expression)` on success.
/// - `Err(Error::Lex)` when the text cannot be split into tokens, for
///   example with unbalanced brackets or a malformed number.
/// - `Err(Error::Parse)` when the tokens do not form an expression.
///
/// # Example
/// ```rust
/// use symcalc::parse;
///
/// assert_eq!(parse("2x").unwrap(), parse("2 * x").unwrap());
/// assert!(parse("sin(2(").is_err());
/// ```
pub fn parse(text: &str) -> Result<Expression, Error> {
    let tokens = lexer::tokenize(text)?;
    Ok(parser::parse(&tokens)?)
}

/// Parses `text` and executes it against `params`.
///
/// Assignments and definitions in the text update `params`.
///
/// # Example
/// ```rust
/// use symcalc::{calculate, AngleUnit, ExpressionParameters, Value};
///
/// let mut params = ExpressionParameters::new().with_angle_unit(AngleUnit::Degree);
/// assert_eq!(calculate("sin(90)", &mut params).unwrap(), Value::Number(1.0));
/// ```
pub fn calculate(text: &str, params: &mut ExpressionParameters) -> Result<Value, Error> {
    let expr = parse(text)?;
    Ok(execute(&expr, params)?)
}
