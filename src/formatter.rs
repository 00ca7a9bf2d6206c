//! # formatter.rs
//!
//! Renders an [`Expression`] back to text.
//!
//! Two dialects are provided: the plain infix form used by `Display`
//! ([`to_string`]) and LaTeX ([`to_latex`]). Both decide where to put
//! parentheses the same way: the renderer passes the position of each
//! child (its parent operator and side) down the recursion, and
//! [`needs_parens`] compares that position with the child's own shape.
//!
//! The plain form parses back to the same tree for every expression the
//! parser can produce from arithmetic text.

mod latex;
mod plain;

use crate::expression::Expression;
use crate::operators::{
    BinaryOperatorInfo, BinaryOperatorKind, Fixity, ASSIGNMENT_PRECEDENCE, PREFIX_PRECEDENCE,
};

/// Renders `expr` as plain infix text.
///
/// # Examples
/// ```
/// use symcalc::{parse, to_string};
///
/// assert_eq!(to_string(&parse("(2-3)-4").unwrap()), "2 - 3 - 4");
/// assert_eq!(to_string(&parse("2-(3-4)").unwrap()), "2 - (3 - 4)");
/// ```
pub fn to_string(expr: &Expression) -> String {
    plain::format(expr)
}

/// Renders `expr` as LaTeX math.
///
/// # Examples
/// ```
/// use symcalc::{parse, to_latex};
///
/// assert_eq!(to_latex(&parse("sqrt(x) / 2").unwrap()), "\\frac{\\sqrt{x}}{2}");
/// ```
pub fn to_latex(expr: &Expression) -> String {
    latex::format(expr)
}

/// Which operand of a binary node a child is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// Where a child is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
    /// Top level, a function argument or any other delimited slot.
    Root,
    Binary(BinaryOperatorKind, Side),
    /// Either side of `:=`.
    Define(Side),
    /// Operand of a prefix operator.
    Prefix,
    /// Operand of a postfix operator.
    Postfix,
}

/// How a node binds when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Never needs parentheses: names, calls, brackets, postfix forms.
    Atom,
    /// A literal starting with `-`.
    Negative,
    /// A prefix operator applied to its operand.
    Prefix,
    Infix(BinaryOperatorInfo),
}

fn shape(expr: &Expression) -> Shape {
    match expr {
        Expression::Number(x) if *x < 0.0 => Shape::Negative,
        Expression::ComplexNumber(z) => match (z.re == 0.0, z.im) {
            (_, im) if im == 0.0 => shape(&Expression::Number(z.re)),
            (true, im) if im == 1.0 => Shape::Atom,
            (true, im) if im == -1.0 => Shape::Negative,
            (true, _) => Shape::Infix(BinaryOperatorKind::Mul.info()),
            (false, _) => Shape::Infix(BinaryOperatorKind::Add.info()),
        },
        Expression::Unary { op, .. } if op.fixity() == Fixity::Prefix => Shape::Prefix,
        Expression::Binary { op, .. } => Shape::Infix(op.info()),
        Expression::Define { .. } => Shape::Infix(define_info()),
        _ => Shape::Atom,
    }
}

fn define_info() -> BinaryOperatorInfo {
    BinaryOperatorInfo { precedence: ASSIGNMENT_PRECEDENCE, is_left_assoc: false }
}

/// Decides whether a child with operator `child` must be parenthesized
/// below `parent` on `side`.
fn infix_needs_parens(child: &BinaryOperatorInfo, parent: &BinaryOperatorInfo, side: Side) -> bool {
    if child.precedence != parent.precedence {
        return child.precedence < parent.precedence;
    }
    match side {
        Side::Left => !parent.is_left_assoc,
        Side::Right => parent.is_left_assoc,
    }
}

/// Returns `true` if `expr` must be wrapped in parentheses at `parent`.
///
/// - Lower-precedence children are wrapped; higher-precedence ones are not.
/// - At equal precedence the child on the non-associative side is wrapped,
///   so `2 - (3 - 4)` keeps its brackets and `2 - 3 - 4` gets none.
/// - Negative literals and prefix operators are wrapped as the right
///   operand of `-`, as the base of `^` and as the operand of another
///   unary operator.
pub(crate) fn needs_parens(expr: &Expression, parent: Parent) -> bool {
    let shape = shape(expr);
    match (shape, parent) {
        (Shape::Atom, _) | (_, Parent::Root) => false,
        (Shape::Negative | Shape::Prefix, Parent::Binary(BinaryOperatorKind::Sub, Side::Right)) => true,
        (Shape::Negative | Shape::Prefix, Parent::Binary(op, Side::Left))
            => op.info().precedence > PREFIX_PRECEDENCE,
        (Shape::Negative | Shape::Prefix, Parent::Prefix | Parent::Postfix) => true,
        (Shape::Negative | Shape::Prefix, _) => false,
        (Shape::Infix(_), Parent::Prefix | Parent::Postfix) => true,
        (Shape::Infix(child), Parent::Binary(op, side)) => infix_needs_parens(&child, &op.info(), side),
        (Shape::Infix(child), Parent::Define(side)) => infix_needs_parens(&child, &define_info(), side),
    }
}

/// Formats a literal so that it lexes back to the same value.
pub(crate) fn format_number(x: f64) -> String {
    if x.is_finite() && x.abs() >= 1.0e16 {
        format!("{:e}", x)
    } else {
        format!("{}", x)
    }
}

/// `3+2i`, `3-2i`, `2i`, `i`, `-i`.
pub(crate) fn format_complex(re: f64, im: f64) -> String {
    if im == 0.0 {
        return format_number(re);
    }
    let imaginary = match im {
        x if x == 1.0 => "i".to_string(),
        x if x == -1.0 => "-i".to_string(),
        x => format!("{}i", format_number(x)),
    };
    if re == 0.0 {
        imaginary
    } else if im > 0.0 {
        format!("{}+{}", format_number(re), imaginary)
    } else {
        format!("{}{}", format_number(re), imaginary)
    }
}

#[cfg(test)]
mod formatter_tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use num_complex::Complex;

    fn p(input: &str) -> Expression {
        parse(&tokenize(input).unwrap()).unwrap()
    }

    fn f(input: &str) -> String {
        to_string(&p(input))
    }

    #[test]
    fn test_left_associative_chains() {
        assert_eq!(f("(2-3)-4"), "2 - 3 - 4");
        assert_eq!(f("2-(3-4)"), "2 - (3 - 4)");
        assert_eq!(f("(8/4)/2"), "8 / 4 / 2");
        assert_eq!(f("8/(4/2)"), "8 / (4 / 2)");
        assert_eq!(f("a + (b + c)"), "a + (b + c)");
    }

    #[test]
    fn test_right_associative_power() {
        assert_eq!(f("2^3^2"), "2 ^ 3 ^ 2");
        assert_eq!(f("(2^3)^2"), "(2 ^ 3) ^ 2");
    }

    #[test]
    fn test_mixed_precedence() {
        assert_eq!(f("1 + 2 * 3"), "1 + 2 * 3");
        assert_eq!(f("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(f("2x"), "2 * x");
        assert_eq!(f("x < 1 and y > 2"), "x < 1 and y > 2");
        assert_eq!(f("(a or b) and c"), "(a or b) and c");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(f("-x"), "-x");
        assert_eq!(f("-(x + 1)"), "-(x + 1)");
        assert_eq!(f("-x^2"), "-(x ^ 2)");
        assert_eq!(f("(-x)^2"), "(-x) ^ 2");
        assert_eq!(f("x - (-y)"), "x - (-y)");
        assert_eq!(f("x + -y"), "x + -y");
        assert_eq!(f("(x + 1)!"), "(x + 1)!");
        assert_eq!(f("not (a and b)"), "not (a and b)");
        assert_eq!(f("x++"), "x++");
    }

    #[test]
    fn test_negative_literals() {
        let sub = Expression::Number(2.0) - Expression::Number(-3.0);
        assert_eq!(to_string(&sub), "2 - (-3)");
        let add = Expression::Number(2.0) + Expression::Number(-3.0);
        assert_eq!(to_string(&add), "2 + -3");
        assert_eq!(to_string(&Expression::Number(-3.0)), "-3");
    }

    #[test]
    fn test_calls_and_literals() {
        assert_eq!(f("sin(x)"), "sin(x)");
        assert_eq!(f("log(2, x)"), "log(2, x)");
        assert_eq!(f("sh(x)"), "sinh(x)");
        assert_eq!(f("f(x, 2)"), "f(x, 2)");
        assert_eq!(f("{1, 2}"), "{1, 2}");
        assert_eq!(f("{{1, 2}, {3, 4}}"), "{{1, 2}, {3, 4}}");
        assert_eq!(f("2.5"), "2.5");
        assert_eq!(f("true"), "true");
    }

    #[test]
    fn test_constructs() {
        assert_eq!(f("x := 1 + 2"), "x := 1 + 2");
        assert_eq!(f("f(x) := x^2"), "f(x) := x ^ 2");
        assert_eq!(f("undef(x)"), "undef(x)");
        assert_eq!(f("if(x > 1, 2, 3)"), "if(x > 1, 2, 3)");
        assert_eq!(f("for(s += k, k := 0, k < 3, k++)"), "for(s += k, k := 0, k < 3, k++)");
        assert_eq!(f("while(x += 1, x < 3)"), "while(x += 1, x < 3)");
        assert_eq!(f("deriv(x^2)"), "deriv(x ^ 2, x)");
        assert_eq!(f("deriv(y^2, y, 3)"), "deriv(y ^ 2, y, 3)");
        assert_eq!(f("simplify(x)"), "simplify(x)");
        assert_eq!(f("fact(3)"), "3!");
    }

    #[test]
    fn test_complex_numbers() {
        let z = |re, im| to_string(&Expression::ComplexNumber(Complex::new(re, im)));
        assert_eq!(z(3.0, 2.0), "3+2i");
        assert_eq!(z(3.0, -2.0), "3-2i");
        assert_eq!(z(0.0, 1.0), "i");
        assert_eq!(z(0.0, -1.0), "-i");
        assert_eq!(z(0.0, 2.5), "2.5i");
        assert_eq!(z(4.0, 0.0), "4");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            "1 + 2 * 3", "(1 + 2) * 3", "2 - (3 - 4)", "2 ^ 3 ^ 2", "(2 ^ 3) ^ 2", "-x + 3", "-(x * y)",
            "x / (y * z)", "sin(x) ^ 2 + cos(x) ^ 2", "2x + 3y", "0xFF + 0b101 - 0755", "5! / 3",
            "a and not b or c", "x <= 1 == true", "log(2, x) * lg(x)", "{1, 2} * {{1, 0}, {0, 1}}",
            "x % 3 - -1", "-2 ^ 2",
        ];
        for case in cases {
            let once = p(case);
            let again = p(&to_string(&once));
            assert_eq!(again, once, "round trip of {} through {}", case, to_string(&once));
        }
    }

    #[test]
    fn test_large_numbers_use_exponent_notation() {
        assert_eq!(format_number(1.0e20), "1e20");
        assert_eq!(p(&format_number(1.0e20)), Expression::Number(1.0e20));
    }
}
