//! # latex.rs
//!
//! LaTeX rendering. Fractions, powers and roots use their two-dimensional
//! forms; everything else follows the plain dialect with `\left(`/`\right)`
//! brackets.

use super::{format_complex, format_number, needs_parens, Parent, Side};
use crate::expression::Expression;
use crate::functions::{Construct, FunctionKind};
use crate::operators::{BinaryOperatorKind, Fixity};

pub(super) fn format(expr: &Expression) -> String {
    let mut out = String::new();
    write(expr, Parent::Root, &mut out);
    out
}

/// A fraction is a box of its own and only needs brackets where it is
/// the base of a power or the operand of a postfix operator.
fn latex_needs_parens(expr: &Expression, parent: Parent) -> bool {
    match expr {
        Expression::Binary { op: BinaryOperatorKind::Div, .. } => matches!(
            parent,
            Parent::Binary(BinaryOperatorKind::Pow, Side::Left) | Parent::Postfix
        ),
        _ => needs_parens(expr, parent),
    }
}

fn write(expr: &Expression, parent: Parent, out: &mut String) {
    if latex_needs_parens(expr, parent) {
        out.push_str("\\left(");
        write_node(expr, out);
        out.push_str("\\right)");
    } else {
        write_node(expr, out);
    }
}

fn write_node(expr: &Expression, out: &mut String) {
    match expr {
        Expression::Number(x) => out.push_str(&format_number(*x)),
        Expression::Bool(b) => out.push_str(if *b { "\\mathrm{true}" } else { "\\mathrm{false}" }),
        Expression::ComplexNumber(z) => out.push_str(&format_complex(z.re, z.im)),
        Expression::Variable(name) => write_name(name, out),
        Expression::Unary { op, arg } => match op.fixity() {
            Fixity::Prefix => {
                out.push_str(op.latex());
                write(arg, Parent::Prefix, out);
            },
            Fixity::Postfix => {
                write(arg, Parent::Postfix, out);
                out.push_str(op.latex());
            },
        },
        Expression::Binary { op: BinaryOperatorKind::Div, left, right } => {
            out.push_str("\\frac{");
            write(left, Parent::Root, out);
            out.push_str("}{");
            write(right, Parent::Root, out);
            out.push('}');
        },
        Expression::Binary { op: BinaryOperatorKind::Pow, left, right } => {
            write(left, Parent::Binary(BinaryOperatorKind::Pow, Side::Left), out);
            out.push_str("^{");
            write(right, Parent::Root, out);
            out.push('}');
        },
        Expression::Binary { op, left, right } => {
            write(left, Parent::Binary(*op, Side::Left), out);
            out.push(' ');
            out.push_str(op.latex());
            out.push(' ');
            write(right, Parent::Binary(*op, Side::Right), out);
        },
        Expression::Function { kind, args } => write_function(*kind, args, out),
        Expression::UserFunction { name, args } => {
            write_name(name, out);
            write_arguments(args.iter(), out);
        },
        Expression::Vector(items) => {
            out.push_str("\\begin{pmatrix}");
            write_row(items, out);
            out.push_str("\\end{pmatrix}");
        },
        Expression::Matrix(rows) => {
            out.push_str("\\begin{pmatrix}");
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    out.push_str(" \\\\ ");
                }
                write_row(row, out);
            }
            out.push_str("\\end{pmatrix}");
        },
        Expression::Define { target, value } => {
            write(target, Parent::Define(Side::Left), out);
            out.push_str(" := ");
            write(value, Parent::Define(Side::Right), out);
        },
        Expression::Undefine(target) => write_operator(Construct::Undefine.name(), [target.as_ref()].into_iter(), out),
        Expression::If { condition, then, otherwise } => {
            let args = [Some(condition.as_ref()), Some(then.as_ref()), otherwise.as_deref()];
            write_operator(Construct::If.name(), args.into_iter().flatten(), out);
        },
        Expression::For { body, init, condition, step } => {
            let args = [body.as_ref(), init.as_ref(), condition.as_ref(), step.as_ref()];
            write_operator(Construct::For.name(), args.into_iter(), out);
        },
        Expression::While { body, condition } => {
            write_operator(Construct::While.name(), [body.as_ref(), condition.as_ref()].into_iter(), out);
        },
        Expression::Derivative { expr, variable, point } => {
            if point.is_some() {
                out.push_str("\\left.");
            }
            out.push_str("\\frac{d}{d");
            write_name(variable, out);
            out.push('}');
            write_arguments([expr.as_ref()].into_iter(), out);
            if let Some(point) = point {
                out.push_str("\\right|_{");
                write_name(variable, out);
                out.push('=');
                write(point, Parent::Root, out);
                out.push('}');
            }
        },
        Expression::Simplify(inner) => write_operator(Construct::Simplify.name(), [inner.as_ref()].into_iter(), out),
    }
}

fn write_name(name: &str, out: &mut String) {
    match name {
        "pi" | "π" => out.push_str("\\pi"),
        _ if name.chars().count() > 1 => {
            out.push_str("\\mathrm{");
            out.push_str(name);
            out.push('}');
        },
        _ => out.push_str(name),
    }
}

/// Functions with a LaTeX command of their own.
fn command(kind: FunctionKind) -> Option<&'static str> {
    use FunctionKind::*;
    match kind {
        Sin => Some("\\sin"),
        Cos => Some("\\cos"),
        Tan => Some("\\tan"),
        Cot => Some("\\cot"),
        Sec => Some("\\sec"),
        Csc => Some("\\csc"),
        Arcsin => Some("\\arcsin"),
        Arccos => Some("\\arccos"),
        Arctan => Some("\\arctan"),
        Sinh => Some("\\sinh"),
        Cosh => Some("\\cosh"),
        Tanh => Some("\\tanh"),
        Coth => Some("\\coth"),
        Ln => Some("\\ln"),
        Lg => Some("\\lg"),
        Lb => Some("\\log_{2}"),
        Determinant => Some("\\det"),
        Min => Some("\\min"),
        Max => Some("\\max"),
        _ => None,
    }
}

fn write_function(kind: FunctionKind, args: &[Expression], out: &mut String) {
    match (kind, args) {
        (FunctionKind::Sqrt, [x]) => {
            out.push_str("\\sqrt{");
            write(x, Parent::Root, out);
            out.push('}');
        },
        (FunctionKind::Root, [x, n]) => {
            out.push_str("\\sqrt[");
            write(n, Parent::Root, out);
            out.push_str("]{");
            write(x, Parent::Root, out);
            out.push('}');
        },
        (FunctionKind::Exp, [x]) => {
            out.push_str("e^{");
            write(x, Parent::Root, out);
            out.push('}');
        },
        (FunctionKind::Log, [base, x]) => {
            out.push_str("\\log_{");
            write(base, Parent::Root, out);
            out.push('}');
            write_arguments([x].into_iter(), out);
        },
        (FunctionKind::Abs, [x]) => write_delimited("\\left|", x, "\\right|", out),
        (FunctionKind::Floor, [x]) => write_delimited("\\left\\lfloor ", x, " \\right\\rfloor", out),
        (FunctionKind::Ceil, [x]) => write_delimited("\\left\\lceil ", x, " \\right\\rceil", out),
        (FunctionKind::Transpose, [x]) => {
            write(x, Parent::Binary(BinaryOperatorKind::Pow, Side::Left), out);
            out.push_str("^{T}");
        },
        _ => match command(kind) {
            Some(command) => {
                out.push_str(command);
                write_arguments(args.iter(), out);
            },
            None => write_operator(kind.name(), args.iter(), out),
        },
    }
}

fn write_delimited(open: &str, x: &Expression, close: &str, out: &mut String) {
    out.push_str(open);
    write(x, Parent::Root, out);
    out.push_str(close);
}

fn write_operator<'a>(name: &str, args: impl Iterator<Item = &'a Expression>, out: &mut String) {
    out.push_str("\\operatorname{");
    out.push_str(name);
    out.push('}');
    write_arguments(args, out);
}

fn write_arguments<'a>(args: impl Iterator<Item = &'a Expression>, out: &mut String) {
    out.push_str("\\left(");
    for (i, arg) in args.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write(arg, Parent::Root, out);
    }
    out.push_str("\\right)");
}

fn write_row(items: &[Expression], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(" & ");
        }
        write(item, Parent::Root, out);
    }
}
