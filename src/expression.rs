//! # expression.rs
//!
//! The expression tree shared by every analyzer.
//!
//! Each node owns its children outright; there is no sharing between
//! trees and no back-reference to the parent. Analyzers that need several
//! copies of an operand (the product rule, for example) clone it.
//!
//! Operators and functions are grouped by kind enums
//! ([`UnaryOperatorKind`], [`BinaryOperatorKind`], [`FunctionKind`]) so the
//! tree needs only one variant per family instead of one per operation.

use std::hash::{Hash, Hasher};

use num_complex::Complex;

use crate::functions::FunctionKind;
use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    Bool(bool),
    ComplexNumber(Complex<f64>),
    Variable(String),

    Unary {
        op: UnaryOperatorKind,
        arg: Box<Expression>,
    },

    Binary {
        op: BinaryOperatorKind,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Call of a built-in function. The argument count always satisfies
    /// [`FunctionKind::arity`].
    Function {
        kind: FunctionKind,
        args: Vec<Expression>,
    },

    /// Call of a user function, resolved by name and argument count when
    /// executed.
    UserFunction {
        name: String,
        args: Vec<Expression>,
    },

    Vector(Vec<Expression>),

    /// Row-major; every row has the same length.
    Matrix(Vec<Vec<Expression>>),

    /// `target := value`. The target is a variable or a user function
    /// whose arguments are all variables.
    Define {
        target: Box<Expression>,
        value: Box<Expression>,
    },

    Undefine(Box<Expression>),

    If {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Option<Box<Expression>>,
    },

    For {
        body: Box<Expression>,
        init: Box<Expression>,
        condition: Box<Expression>,
        step: Box<Expression>,
    },

    While {
        body: Box<Expression>,
        condition: Box<Expression>,
    },

    /// Derivative of `expr` with respect to `variable`, evaluated at
    /// `point` when given.
    Derivative {
        expr: Box<Expression>,
        variable: String,
        point: Option<Box<Expression>>,
    },

    Simplify(Box<Expression>),
}

impl Expression {
    /// Returns `true` if `name` occurs as a variable anywhere in the tree.
    ///
    /// Stops at the first occurrence.
    pub fn contains_variable(&self, name: &str) -> bool {
        match self {
            Self::Number(_) | Self::Bool(_) | Self::ComplexNumber(_) => false,
            Self::Variable(v) => v == name,
            Self::Unary { arg, .. } => arg.contains_variable(name),
            Self::Binary { left, right, .. }
                => left.contains_variable(name) || right.contains_variable(name),
            Self::Function { args, .. } | Self::UserFunction { args, .. } | Self::Vector(args)
                => args.iter().any(|a| a.contains_variable(name)),
            Self::Matrix(rows) => rows.iter().flatten().any(|a| a.contains_variable(name)),
            Self::Define { target, value }
                => target.contains_variable(name) || value.contains_variable(name),
            Self::Undefine(target) => target.contains_variable(name),
            Self::If { condition, then, otherwise } => {
                condition.contains_variable(name)
                    || then.contains_variable(name)
                    || otherwise.as_ref().is_some_and(|e| e.contains_variable(name))
            },
            Self::For { body, init, condition, step } => {
                [body, init, condition, step].iter().any(|e| e.contains_variable(name))
            },
            Self::While { body, condition }
                => body.contains_variable(name) || condition.contains_variable(name),
            Self::Derivative { expr, point, .. }
                => expr.contains_variable(name) || point.as_ref().is_some_and(|p| p.contains_variable(name)),
            Self::Simplify(expr) => expr.contains_variable(name),
        }
    }

    /// Returns the number if this node is a numeric literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns `true` if this node is the literal `value`.
    pub fn is_number(&self, value: f64) -> bool {
        self.as_number() == Some(value)
    }
}

/// Helpers to build new nodes, used by the parser and the analyzers.
impl Expression {
    /// Create a number Ast node.
    pub fn number(x: f64) -> Self {
        Self::Number(x)
    }

    /// Create a variable Ast node.
    pub fn variable(name: &str) -> Self {
        Self::Variable(name.to_string())
    }

    pub(crate) fn zero() -> Self {
        Self::Number(0.0)
    }

    pub(crate) fn one() -> Self {
        Self::Number(1.0)
    }

    /// Create a binary operator node `left op right`.
    pub fn binary(op: BinaryOperatorKind, left: Self, right: Self) -> Self {
        Self::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    /// Create a unary operator node.
    pub fn unary(op: UnaryOperatorKind, arg: Self) -> Self {
        Self::Unary { op, arg: Box::new(arg) }
    }

    /// Create a one-argument function call `kind(arg)`.
    pub fn call(kind: FunctionKind, arg: Self) -> Self {
        Self::Function { kind, args: vec![arg] }
    }

    pub(crate) fn add(self, other: Self) -> Self {
        Self::binary(BinaryOperatorKind::Add, self, other)
    }

    pub(crate) fn sub(self, other: Self) -> Self {
        Self::binary(BinaryOperatorKind::Sub, self, other)
    }

    pub(crate) fn mul(self, other: Self) -> Self {
        Self::binary(BinaryOperatorKind::Mul, self, other)
    }

    pub(crate) fn div(self, other: Self) -> Self {
        Self::binary(BinaryOperatorKind::Div, self, other)
    }

    pub(crate) fn pow(self, exponent: Self) -> Self {
        Self::binary(BinaryOperatorKind::Pow, self, exponent)
    }

    pub(crate) fn powi(self, exponent: i32) -> Self {
        self.pow(Self::Number(exponent as f64))
    }

    pub(crate) fn negative(self) -> Self {
        Self::unary(UnaryOperatorKind::Negate, self)
    }
}

impl std::ops::Add<Expression> for Expression {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Expression::add(self, rhs)
    }
}

impl std::ops::Sub<Expression> for Expression {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Expression::sub(self, rhs)
    }
}

impl std::ops::Mul<Expression> for Expression {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Expression::mul(self, rhs)
    }
}

impl std::ops::Div<Expression> for Expression {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        Expression::div(self, rhs)
    }
}

impl std::ops::BitXor<Expression> for Expression {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self::Output {
        self.pow(rhs)
    }
}

impl std::ops::Neg for Expression {
    type Output = Self;
    fn neg(self) -> Self::Output {
        self.negative()
    }
}

impl From<f64> for Expression {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<bool> for Expression {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Complex<f64>> for Expression {
    fn from(z: Complex<f64>) -> Self {
        Self::ComplexNumber(z)
    }
}

/// Hashes a float so that values comparing equal hash equally.
fn hash_f64<H: Hasher>(x: f64, state: &mut H) {
    let x = if x == 0.0 { 0.0 } else { x };
    x.to_bits().hash(state);
}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Number(x) => hash_f64(*x, state),
            Self::Bool(b) => b.hash(state),
            Self::ComplexNumber(z) => {
                hash_f64(z.re, state);
                hash_f64(z.im, state);
            },
            Self::Variable(name) => name.hash(state),
            Self::Unary { op, arg } => {
                op.hash(state);
                arg.hash(state);
            },
            Self::Binary { op, left, right } => {
                op.hash(state);
                left.hash(state);
                right.hash(state);
            },
            Self::Function { kind, args } => {
                kind.hash(state);
                args.hash(state);
            },
            Self::UserFunction { name, args } => {
                name.hash(state);
                args.hash(state);
            },
            Self::Vector(items) => items.hash(state),
            Self::Matrix(rows) => rows.hash(state),
            Self::Define { target, value } => {
                target.hash(state);
                value.hash(state);
            },
            Self::Undefine(target) => target.hash(state),
            Self::If { condition, then, otherwise } => {
                condition.hash(state);
                then.hash(state);
                otherwise.hash(state);
            },
            Self::For { body, init, condition, step } => {
                body.hash(state);
                init.hash(state);
                condition.hash(state);
                step.hash(state);
            },
            Self::While { body, condition } => {
                body.hash(state);
                condition.hash(state);
            },
            Self::Derivative { expr, variable, point } => {
                expr.hash(state);
                variable.hash(state);
                point.hash(state);
            },
            Self::Simplify(expr) => expr.hash(state),
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::formatter::to_string(self))
    }
}
