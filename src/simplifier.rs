//! # simplifier.rs
//!
//! Algebraic simplification of an [`Expression`].
//!
//! One pass rewrites the tree bottom-up with a fixed catalogue of rules;
//! [`simplify`] repeats passes until the tree stops changing.
//!
//! Only arithmetic on literals is folded. Function calls are never
//! evaluated (`sin(0)` stays `sin(0)`), and a fold whose result would be
//! infinite or NaN is skipped so `1 / 0` survives as written.

use log::debug;

use crate::error::SimplifyError;
use crate::expression::Expression;
use crate::functions::FunctionKind;
use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};

/// Maximum number of passes before simplification gives up.
pub const MAX_SIMPLIFY_PASSES: usize = 128;

/// Simplifies `expr` to a fixed point.
///
/// # Rules
/// - Constant folding of `+ - * / % ^` and unary `-` on literals.
/// - Identities: `x + 0`, `x * 1`, `x * 0`, `x / 1`, `0 / x`, `x / x`,
///   `x ^ 1`, `x ^ 0`, `1 ^ x`, `--x`.
/// - Sum normalization: nested `+`/`-` chains are flattened, like terms are
///   combined (`x + x` → `2 * x`, `x - x` → `0`) and the constant goes last.
///   `x + (-y)` becomes `x - y`.
/// - Product normalization: nested `*` chains are flattened, the constant
///   goes first and neighbouring powers of the same base are merged
///   (`x * x` → `x ^ 2`). Other factors never change order.
/// - `ln(exp(u))` and `exp(ln(u))` collapse to `u`.
///
/// Cancelling rules (`x - x`, `x * 0`, `x / x`, `x * x ^ -1`) treat
/// variables as scalars. They are skipped for operands that contain a
/// vector or matrix literal.
///
/// # Returns
/// - `Ok(Expression)`: a tree on which one more pass changes nothing, so
///   `simplify(simplify(e)) == simplify(e)`.
/// - `Err(SimplifyError::IterationLimit)` if no fixed point is reached
///   within [`MAX_SIMPLIFY_PASSES`] passes.
pub fn simplify(expr: &Expression) -> Result<Expression, SimplifyError> {
    let mut current = expr.clone();
    for pass in 1..=MAX_SIMPLIFY_PASSES {
        let next = simplify_node(current.clone());
        if same_tree(&next, &current) {
            debug!("simplified in {} pass(es): {}", pass, next);
            return Ok(next);
        }
        current = next;
    }
    Err(SimplifyError::IterationLimit(MAX_SIMPLIFY_PASSES))
}

/// NaN literals compare unequal under `PartialEq`.
fn same_tree(a: &Expression, b: &Expression) -> bool {
    a == b || format!("{:?}", a) == format!("{:?}", b)
}

fn simplify_all(exprs: Vec<Expression>) -> Vec<Expression> {
    exprs.into_iter().map(simplify_node).collect()
}

fn simplify_box(expr: Box<Expression>) -> Box<Expression> {
    Box::new(simplify_node(*expr))
}

/// One bottom-up pass.
fn simplify_node(expr: Expression) -> Expression {
    match expr {
        Expression::Unary { op: UnaryOperatorKind::Negate, arg } => fold_negate(simplify_node(*arg)),
        Expression::Unary { op, arg } => Expression::unary(op, simplify_node(*arg)),
        Expression::Binary { op, left, right } => fold_binary(op, simplify_node(*left), simplify_node(*right)),
        Expression::Function { kind, args } => fold_function(kind, simplify_all(args)),
        Expression::UserFunction { name, args } => Expression::UserFunction { name, args: simplify_all(args) },
        Expression::Vector(items) => Expression::Vector(simplify_all(items)),
        Expression::Matrix(rows) => Expression::Matrix(rows.into_iter().map(simplify_all).collect()),
        Expression::Define { target, value } => Expression::Define { target, value: simplify_box(value) },
        Expression::If { condition, then, otherwise } => Expression::If {
            condition: simplify_box(condition),
            then: simplify_box(then),
            otherwise: otherwise.map(simplify_box),
        },
        Expression::For { body, init, condition, step } => Expression::For {
            body: simplify_box(body),
            init: simplify_box(init),
            condition: simplify_box(condition),
            step: simplify_box(step),
        },
        Expression::While { body, condition } => Expression::While {
            body: simplify_box(body),
            condition: simplify_box(condition),
        },
        Expression::Derivative { expr, variable, point } => Expression::Derivative {
            expr: simplify_box(expr),
            variable,
            point: point.map(simplify_box),
        },
        Expression::Simplify(inner) => simplify_node(*inner),
        leaf => leaf,
    }
}

/// Returns `Some(x)` when `x` is a finite fold result.
fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}

fn fold_negate(arg: Expression) -> Expression {
    match arg {
        Expression::Number(x) => Expression::Number(-x),
        Expression::Unary { op: UnaryOperatorKind::Negate, arg } => *arg,
        other => other.negative(),
    }
}

fn fold_function(kind: FunctionKind, mut args: Vec<Expression>) -> Expression {
    let inverse = match kind {
        FunctionKind::Ln => FunctionKind::Exp,
        FunctionKind::Exp => FunctionKind::Ln,
        _ => return Expression::Function { kind, args },
    };
    match args.pop() {
        Some(Expression::Function { kind: inner, args: mut inner_args }) if inner == inverse && inner_args.len() == 1
            => inner_args.remove(0),
        Some(arg) => Expression::call(kind, arg),
        None => Expression::Function { kind, args },
    }
}

/// Internal helper to fold a binary operator with two simplified operands.
fn fold_binary(op: BinaryOperatorKind, left: Expression, right: Expression) -> Expression {
    match op {
        BinaryOperatorKind::Add | BinaryOperatorKind::Sub => fold_add(op, left, right),
        BinaryOperatorKind::Mul => fold_mul(left, right),
        BinaryOperatorKind::Div => fold_div(left, right),
        BinaryOperatorKind::Pow => fold_pow(left, right),
        BinaryOperatorKind::Mod => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) if b != 0.0 && finite(a % b).is_some() => Expression::Number(a % b),
            _ => Expression::binary(op, left, right),
        },
        _ => Expression::binary(op, left, right),
    }
}

/// Simplifies and folds `left ± right` by normalizing its terms.
///
/// - `((a + b) - c)` → one list of signed terms
/// - `2 + x + 3` → `x + 5`
/// - `x + x` → `2 * x`, `2 * x - x` → `x`
/// - `x + (-y)` → `x - y`
fn fold_add(op: BinaryOperatorKind, left: Expression, right: Expression) -> Expression {
    let mut terms = Vec::new();
    collect_add_terms(left, 1.0, &mut terms);
    collect_add_terms(right, if op == BinaryOperatorKind::Sub { -1.0 } else { 1.0 }, &mut terms);

    let mut constant = 0.0;
    let mut combined: Vec<(Expression, f64)> = Vec::new();
    for (sign, term) in terms {
        match term {
            Expression::Number(x) if x.is_finite() => constant += sign * x,
            other => {
                let (coefficient, rest) = split_coefficient(other);
                insert_term(&mut combined, rest, sign * coefficient);
            },
        }
    }
    if !constant.is_finite() {
        combined.push((Expression::Number(constant), 1.0));
        constant = 0.0;
    }

    let mut sum: Option<Expression> = None;
    for (term, coefficient) in combined {
        // a cancelled tensor term still fixes the shape of the sum
        if coefficient == 0.0 && !involves_tensor(&term) {
            continue;
        }
        sum = Some(match sum {
            None => scaled(term, coefficient),
            Some(acc) if coefficient < 0.0 => acc - scaled(term, -coefficient),
            Some(acc) => acc + scaled(term, coefficient),
        });
    }
    match sum {
        None => Expression::Number(constant),
        Some(acc) if constant < 0.0 => acc - Expression::Number(-constant),
        Some(acc) if constant > 0.0 => acc + Expression::Number(constant),
        Some(acc) => acc,
    }
}

/// Flattens nested `+`, `-` and unary `-` into `(sign, term)` pairs.
fn collect_add_terms(node: Expression, sign: f64, terms: &mut Vec<(f64, Expression)>) {
    match node {
        Expression::Binary { op: BinaryOperatorKind::Add, left, right } => {
            collect_add_terms(*left, sign, terms);
            collect_add_terms(*right, sign, terms);
        },
        Expression::Binary { op: BinaryOperatorKind::Sub, left, right } => {
            collect_add_terms(*left, sign, terms);
            collect_add_terms(*right, -sign, terms);
        },
        Expression::Unary { op: UnaryOperatorKind::Negate, arg } => collect_add_terms(*arg, -sign, terms),
        other => terms.push((sign, other)),
    }
}

/// Adds `coefficient` to the entry for `term`, or appends a new entry.
fn insert_term(map: &mut Vec<(Expression, f64)>, term: Expression, coefficient: f64) {
    for (t, c) in map.iter_mut() {
        if *t == term {
            *c += coefficient;
            return;
        }
    }
    map.push((term, coefficient));
}

/// Splits `c * rest` into `(c, rest)`; terms without a leading literal
/// have coefficient `1`.
fn split_coefficient(term: Expression) -> (f64, Expression) {
    if !matches!(term, Expression::Binary { op: BinaryOperatorKind::Mul, .. }) {
        return (1.0, term);
    }
    let mut negated = false;
    let mut factors = Vec::new();
    collect_mul_factors(term, &mut negated, &mut factors);
    let sign = if negated { -1.0 } else { 1.0 };
    match factors.first() {
        Some(Expression::Number(c)) if c.is_finite() => {
            let c = *c;
            factors.remove(0);
            (sign * c, product(factors))
        },
        _ => (sign, product(factors)),
    }
}

/// `coefficient * term`, keeping the literal in front.
fn scaled(term: Expression, coefficient: f64) -> Expression {
    if coefficient == 1.0 {
        return term;
    }
    if coefficient == -1.0 {
        return term.negative();
    }
    let mut negated = false;
    let mut factors = vec![Expression::Number(coefficient)];
    collect_mul_factors(term, &mut negated, &mut factors);
    let result = product(factors);
    if negated { result.negative() } else { result }
}

/// Left-nested product of `factors`; `1` when empty.
fn product(factors: Vec<Expression>) -> Expression {
    factors.into_iter().reduce(|acc, f| acc * f).unwrap_or_else(Expression::one)
}

/// Flattens nested `*` into a list of factors, pulling unary `-` out into
/// `negated`.
fn collect_mul_factors(node: Expression, negated: &mut bool, factors: &mut Vec<Expression>) {
    match node {
        Expression::Binary { op: BinaryOperatorKind::Mul, left, right } => {
            collect_mul_factors(*left, negated, factors);
            collect_mul_factors(*right, negated, factors);
        },
        Expression::Unary { op: UnaryOperatorKind::Negate, arg } => {
            *negated = !*negated;
            collect_mul_factors(*arg, negated, factors);
        },
        other => factors.push(other),
    }
}

/// Whether `expr` is known to produce a vector or a matrix: it holds a
/// vector or matrix literal, or a `transpose`/`inverse` call.
///
/// Variables are not known to be tensors; rules that are only valid for
/// commuting operands are still skipped when this is true.
fn involves_tensor(expr: &Expression) -> bool {
    match expr {
        Expression::Vector(_) | Expression::Matrix(_) => true,
        Expression::Function { kind: FunctionKind::Transpose | FunctionKind::Inverse, .. } => true,
        Expression::Function { args, .. } | Expression::UserFunction { args, .. } => args.iter().any(involves_tensor),
        Expression::Unary { arg, .. } => involves_tensor(arg),
        Expression::Binary { left, right, .. } => involves_tensor(left) || involves_tensor(right),
        Expression::Define { value, .. } => involves_tensor(value),
        Expression::If { then, otherwise, .. } => {
            involves_tensor(then) || otherwise.as_deref().is_some_and(involves_tensor)
        },
        _ => false,
    }
}

/// Simplifies and folds `left * right` by normalizing its factors.
///
/// - Constant folding: `2 * x * 3` → `6 * x`
/// - Identity elimination: `x * 1` → `x`
/// - Zero elimination: `x * 0` → `0`
/// - Adjacent same-base powers: `x * x ^ 2` → `x ^ 3`
/// - A constant of `-1` becomes a unary minus: `-1 * x` → `-x`
///
/// Only number literals move; every other factor keeps its position, so
/// `A * B * A` is left alone.
fn fold_mul(left: Expression, right: Expression) -> Expression {
    let mut negated = false;
    let mut factors = Vec::new();
    collect_mul_factors(left, &mut negated, &mut factors);
    collect_mul_factors(right, &mut negated, &mut factors);

    let mut constant = if negated { -1.0 } else { 1.0 };
    let mut rest = Vec::new();
    for factor in factors {
        match factor {
            Expression::Number(x) if finite(constant * x).is_some() => constant *= x,
            other => rest.push(other),
        }
    }
    if constant == 0.0 && !rest.iter().any(involves_tensor) {
        return Expression::zero();
    }

    let rest = combine_adjacent_powers(rest);
    if rest.is_empty() {
        return Expression::Number(constant);
    }
    if constant == 1.0 {
        return product(rest);
    }
    if constant == -1.0 {
        return product(rest).negative();
    }
    // constant factor always comes first
    let mut factors = Vec::with_capacity(rest.len() + 1);
    factors.push(Expression::Number(constant));
    factors.extend(rest);
    product(factors)
}

/// Splits `base ^ n` with a literal `n` into `(base, n)`; anything else is
/// its own base with exponent `1`.
fn split_power(factor: Expression) -> (Expression, f64) {
    match factor {
        Expression::Binary { op: BinaryOperatorKind::Pow, left, right } => match *right {
            Expression::Number(exponent) if exponent.is_finite() => (*left, exponent),
            right => (left.pow(right), 1.0),
        },
        other => (other, 1.0),
    }
}

/// Merges neighbouring powers of the same base: `x ^ a * x ^ b` →
/// `x ^ (a + b)` for literal exponents. Tensor bases are never merged.
fn combine_adjacent_powers(factors: Vec<Expression>) -> Vec<Expression> {
    let mut merged: Vec<(Expression, f64)> = Vec::with_capacity(factors.len());
    for factor in factors {
        let (base, exponent) = split_power(factor);
        match merged.last_mut() {
            Some((last, sum)) if *last == base && !involves_tensor(&base) => *sum += exponent,
            _ => merged.push((base, exponent)),
        }
    }

    merged.into_iter()
        .filter(|(_, exponent)| *exponent != 0.0)
        .map(|(base, exponent)| {
            if exponent == 1.0 {
                base
            } else {
                base.pow(Expression::Number(exponent))
            }
        })
        .collect()
}

fn fold_div(left: Expression, right: Expression) -> Expression {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        if let Some(q) = finite(a / b) {
            return Expression::Number(q);
        }
    }
    if right.is_number(1.0) {
        return left;
    }
    if right.is_number(-1.0) {
        return fold_negate(left);
    }
    if involves_tensor(&left) || involves_tensor(&right) {
        return left.div(right);
    }
    if left.is_number(0.0) && !right.is_number(0.0) {
        return Expression::zero();
    }
    if left == right && !left.is_number(0.0) {
        return Expression::one();
    }
    left.div(right)
}

fn fold_pow(base: Expression, exponent: Expression) -> Expression {
    if let (Some(a), Some(b)) = (base.as_number(), exponent.as_number()) {
        if let Some(p) = finite(a.powf(b)) {
            return Expression::Number(p);
        }
    }
    if exponent.is_number(1.0) {
        return base;
    }
    if involves_tensor(&base) || involves_tensor(&exponent) {
        return base.pow(exponent);
    }
    if exponent.is_number(0.0) || base.is_number(1.0) {
        return Expression::one();
    }
    if base.is_number(0.0) && exponent.as_number().is_some_and(|e| e > 0.0) {
        return Expression::zero();
    }
    base.pow(exponent)
}
