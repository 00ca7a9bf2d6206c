//! # differentiator.rs
//!
//! Symbolic differentiation of an [`Expression`].
//!
//! Every rule builds its result from fresh copies of its operands, so the
//! input tree is never modified and no subtree appears twice in the output.
//! The output is not simplified; pass it through
//! [`crate::simplifier::simplify`] for a readable form.

use crate::error::DifferentiationError;
use crate::expression::Expression;
use crate::functions::FunctionKind;
use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};

/// Differentiates `expr` with respect to `var`.
///
/// # Parameters
/// - `expr`: The tree to differentiate. It is left untouched.
/// - `var`: Name of the variable.
///
/// # Returns
/// - `Ok(Expression)` holding the unsimplified derivative.
/// - `Err(DifferentiationError::NotDifferentiable)` if a node that contains
///   `var` has no calculus rule: logic, relational and assignment operators,
///   programming constructs, user functions, vectors and matrices, and
///   functions such as `floor` or `re`.
///
/// # Notes
/// - A subtree that does not contain `var` differentiates to `0` without
///   being inspected further, whatever kind of node it is.
/// - Angles are treated as radians regardless of the configured unit.
///
/// # Examples
/// ```
/// use symcalc::{differentiate, parse, simplify};
///
/// let expr = parse("x^2").unwrap();
/// let derivative = simplify(&differentiate(&expr, "x").unwrap()).unwrap();
/// assert_eq!(derivative.to_string(), "2 * x");
/// ```
pub fn differentiate(expr: &Expression, var: &str) -> Result<Expression, DifferentiationError> {
    if !expr.contains_variable(var) {
        return Ok(Expression::zero());
    }
    match expr {
        Expression::Variable(_) => Ok(Expression::one()),
        Expression::Unary { op: UnaryOperatorKind::Negate, arg } => Ok(differentiate(arg, var)?.negative()),
        Expression::Binary { op, left, right } => diff_binary(expr, *op, left, right, var),
        Expression::Function { kind, args } => diff_function(expr, *kind, args, var),
        Expression::Simplify(inner) => differentiate(inner, var),
        Expression::Derivative { expr: inner, variable, point: None } => {
            differentiate(&differentiate(inner, variable)?, var)
        },
        other => Err(not_differentiable(other)),
    }
}

fn not_differentiable(expr: &Expression) -> DifferentiationError {
    DifferentiationError::NotDifferentiable(expr.to_string())
}

/// Differentiate a binary operator expression.
///
/// - `d(u ± v) = u' ± v'`
/// - `d(u * v) = u' * v + u * v'`
/// - `d(u / v) = (u' * v - u * v') / v^2`
/// - `^` delegates to [`diff_pow`].
fn diff_binary(
    node: &Expression,
    op: BinaryOperatorKind,
    left: &Expression,
    right: &Expression,
    var: &str,
) -> Result<Expression, DifferentiationError> {
    match op {
        BinaryOperatorKind::Add => Ok(differentiate(left, var)? + differentiate(right, var)?),
        BinaryOperatorKind::Sub => Ok(differentiate(left, var)? - differentiate(right, var)?),
        BinaryOperatorKind::Mul => {
            let dl = differentiate(left, var)?;
            let dr = differentiate(right, var)?;
            Ok(dl * right.clone() + left.clone() * dr)
        },
        BinaryOperatorKind::Div => {
            let dl = differentiate(left, var)?;
            let dr = differentiate(right, var)?;
            Ok((dl * right.clone() - left.clone() * dr) / right.clone().powi(2))
        },
        BinaryOperatorKind::Pow => diff_pow(left, right, var),
        _ => Err(not_differentiable(node)),
    }
}

/// Differentiate `u ^ v`.
///
/// ```text
/// d(u ^ n) = n * u ^ (n - 1) * u'            v constant
/// d(a ^ v) = a ^ v * ln(a) * v'              u constant
/// d(u ^ v) = u ^ v * (v' * ln(u) + v * u' / u)
/// ```
fn diff_pow(u: &Expression, v: &Expression, var: &str) -> Result<Expression, DifferentiationError> {
    if !v.contains_variable(var) {
        let exponent = match v.as_number() {
            Some(n) => Expression::Number(n - 1.0),
            None => v.clone() - Expression::one(),
        };
        let du = differentiate(u, var)?;
        return Ok(v.clone() * u.clone().pow(exponent) * du);
    }
    if !u.contains_variable(var) {
        let dv = differentiate(v, var)?;
        let ln_u = Expression::call(FunctionKind::Ln, u.clone());
        return Ok(u.clone().pow(v.clone()) * ln_u * dv);
    }
    let du = differentiate(u, var)?;
    let dv = differentiate(v, var)?;
    let ln_u = Expression::call(FunctionKind::Ln, u.clone());
    Ok(u.clone().pow(v.clone()) * (dv * ln_u + v.clone() * du / u.clone()))
}

fn call(kind: FunctionKind, arg: Expression) -> Expression {
    Expression::call(kind, arg)
}

/// `sqrt(1 - u^2)`
fn sqrt_one_minus_square(u: &Expression) -> Expression {
    call(FunctionKind::Sqrt, Expression::one() - u.clone().powi(2))
}

/// `sqrt(u^2 - 1)`
fn sqrt_square_minus_one(u: &Expression) -> Expression {
    call(FunctionKind::Sqrt, u.clone().powi(2) - Expression::one())
}

/// Differentiate a built-in function call, applying the chain rule.
///
/// - `sin(u)` → `cos(u) * u'`
/// - `cos(u)` → `-(sin(u) * u')`
/// - `tan(u)` → `u' / cos(u)^2`
/// - `sec(u)` → `u' * (tan(u) * sec(u))`
/// - `arcsin(u)` → `u' / sqrt(1 - u^2)`
/// - `sinh(u)` → `u' * cosh(u)`
/// - `sech(u)` → `-(u' * (tanh(u) * sech(u)))`
/// - `exp(u)` → `u' * exp(u)`
/// - `ln(u)` → `u' / u`
/// - `sqrt(u)` → `u' / (2 * sqrt(u))`
/// - `abs(u)` → `u' * (u / abs(u))`
/// - `root(u, n)` and `log(b, u)` are rewritten to `u ^ (1 / n)` and
///   `ln(u) / ln(b)` first.
///
/// The remaining reciprocal and inverse forms follow the same pattern.
fn diff_function(
    node: &Expression,
    kind: FunctionKind,
    args: &[Expression],
    var: &str,
) -> Result<Expression, DifferentiationError> {
    use FunctionKind::*;
    match kind {
        Root => return diff_pow(&args[0], &(Expression::one() / args[1].clone()), var),
        Log => {
            let ln = call(Ln, args[1].clone()) / call(Ln, args[0].clone());
            return differentiate(&ln, var);
        },
        _ => {},
    }

    let u = match args {
        [u] => u,
        _ => return Err(not_differentiable(node)),
    };
    let du = differentiate(u, var)?;
    let derivative = match kind {
        Abs => du * (u.clone() / call(Abs, u.clone())),
        Sqrt => du / (Expression::Number(2.0) * call(Sqrt, u.clone())),
        Exp => du * call(Exp, u.clone()),
        Ln => du / u.clone(),
        Lg => du / (u.clone() * call(Ln, Expression::Number(10.0))),
        Lb => du / (u.clone() * call(Ln, Expression::Number(2.0))),
        Reciprocal => -(du / u.clone().powi(2)),

        Sin => call(Cos, u.clone()) * du,
        Cos => -(call(Sin, u.clone()) * du),
        Tan => du / call(Cos, u.clone()).powi(2),
        Cot => -(du / call(Sin, u.clone()).powi(2)),
        Sec => du * (call(Tan, u.clone()) * call(Sec, u.clone())),
        Csc => -(du * (call(Cot, u.clone()) * call(Csc, u.clone()))),

        Arcsin => du / sqrt_one_minus_square(u),
        Arccos => -(du / sqrt_one_minus_square(u)),
        Arctan => du / (Expression::one() + u.clone().powi(2)),
        Arccot => -(du / (Expression::one() + u.clone().powi(2))),
        Arcsec => du / (call(Abs, u.clone()) * sqrt_square_minus_one(u)),
        Arccsc => -(du / (call(Abs, u.clone()) * sqrt_square_minus_one(u))),

        Sinh => du * call(Cosh, u.clone()),
        Cosh => du * call(Sinh, u.clone()),
        Tanh => du / call(Cosh, u.clone()).powi(2),
        Coth => -(du / call(Sinh, u.clone()).powi(2)),
        Sech => -(du * (call(Tanh, u.clone()) * call(Sech, u.clone()))),
        Csch => -(du * (call(Coth, u.clone()) * call(Csch, u.clone()))),

        Arsinh => du / call(Sqrt, u.clone().powi(2) + Expression::one()),
        Arcosh => du / sqrt_square_minus_one(u),
        Artanh | Arcoth => du / (Expression::one() - u.clone().powi(2)),
        Arsech => -(du / (u.clone() * sqrt_one_minus_square(u))),
        Arcsch => -(du / (call(Abs, u.clone()) * call(Sqrt, Expression::one() + u.clone().powi(2)))),

        _ => return Err(not_differentiable(node)),
    };
    Ok(derivative)
}

#[cfg(test)]
mod differentiator_tests {
    use super::*;
    use crate::evaluator::execute;
    use crate::lexer::tokenize;
    use crate::parameters::ExpressionParameters;
    use crate::parser::parse;
    use crate::simplifier::simplify;
    use approx::assert_abs_diff_eq;

    fn p(input: &str) -> Expression {
        parse(&tokenize(input).unwrap()).unwrap()
    }

    fn derive(input: &str) -> String {
        simplify(&differentiate(&p(input), "x").unwrap()).unwrap().to_string()
    }

    fn at(expr: &Expression, x: f64) -> f64 {
        let mut params = ExpressionParameters::new();
        params.parameters.set("x", x).unwrap();
        execute(expr, &mut params).unwrap().as_number().unwrap()
    }

    /// Compares the symbolic derivative with a central difference.
    fn check_numerically(input: &str, points: &[f64]) {
        let expr = p(input);
        let derivative = differentiate(&expr, "x").unwrap();
        let h = 1.0e-6;
        for &x in points {
            let numeric = (at(&expr, x + h) - at(&expr, x - h)) / (2.0 * h);
            assert_abs_diff_eq!(at(&derivative, x), numeric, epsilon = 1.0e-4);
        }
    }

    #[test]
    fn test_exact_forms() {
        assert_eq!(derive("x^2"), "2 * x");
        assert_eq!(derive("sin(x)"), "cos(x)");
        assert_eq!(derive("x"), "1");
        assert_eq!(derive("5"), "0");
        assert_eq!(derive("y^2"), "0");
        assert_eq!(derive("3x"), "3");
    }

    #[test]
    fn test_constant_shortcut_skips_structure() {
        // `y > 1` has no rule but does not contain `x`.
        assert_eq!(differentiate(&p("if(y > 1, 2, 3)"), "x"), Ok(Expression::zero()));
    }

    #[test]
    fn test_input_is_not_modified() {
        let expr = p("x * sin(x)");
        let copy = expr.clone();
        differentiate(&expr, "x").unwrap();
        assert_eq!(expr, copy);
    }

    #[test]
    fn test_product_and_quotient_rules() {
        check_numerically("x * sin(x)", &[0.3, 1.2, 2.5]);
        check_numerically("(x^2 + 1) / (x - 3)", &[0.5, 1.0, 2.0]);
        check_numerically("x^x", &[0.5, 1.5, 2.0]);
        check_numerically("2^x", &[-1.0, 0.0, 1.5]);
    }

    #[test]
    fn test_elementary_functions() {
        let cases = [
            "exp(2x)", "ln(x^2 + 1)", "lg(x)", "lb(x)", "log(3, x)", "sqrt(x)", "root(x, 3)",
            "abs(x - 1)", "reciprocal(x)",
            "sin(x^2)", "cos(3x)", "tan(x)", "cot(x)", "sec(x)", "csc(x)",
            "sinh(x)", "cosh(x)", "tanh(x)", "coth(x)", "sech(x)", "csch(x)",
        ];
        for case in cases {
            check_numerically(case, &[0.4, 0.7]);
        }
    }

    #[test]
    fn test_inverse_functions() {
        for case in ["arcsin(x)", "arccos(x)", "arctan(x)", "arccot(x)", "artanh(x)", "arsech(x)", "arsinh(x)"] {
            check_numerically(case, &[0.3, 0.6]);
        }
        for case in ["arcsec(x)", "arccsc(x)", "arcosh(x)", "arcoth(x)", "arcsch(x)"] {
            check_numerically(case, &[1.5, 2.5]);
        }
    }

    #[test]
    fn test_nested_derivative() {
        assert_eq!(derive("deriv(x^3)"), "6 * x");
    }

    #[test]
    fn test_not_differentiable() {
        for case in ["x > 1", "floor(x)", "f(x)", "{x, 1}", "x!", "re(x)"] {
            assert!(
                matches!(differentiate(&p(case), "x"), Err(DifferentiationError::NotDifferentiable(_))),
                "{} should not be differentiable", case
            );
        }
    }
}
