//! # plain.rs
//!
//! Plain infix rendering, the inverse of the parser.

use super::{format_complex, format_number, needs_parens, Parent, Side};
use crate::expression::Expression;
use crate::functions::Construct;
use crate::operators::{Fixity, UnaryOperatorKind};

pub(super) fn format(expr: &Expression) -> String {
    let mut out = String::new();
    write(expr, Parent::Root, &mut out);
    out
}

fn write(expr: &Expression, parent: Parent, out: &mut String) {
    if needs_parens(expr, parent) {
        out.push('(');
        write_node(expr, out);
        out.push(')');
    } else {
        write_node(expr, out);
    }
}

fn write_node(expr: &Expression, out: &mut String) {
    match expr {
        Expression::Number(x) => out.push_str(&format_number(*x)),
        Expression::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expression::ComplexNumber(z) => out.push_str(&format_complex(z.re, z.im)),
        Expression::Variable(name) => out.push_str(name),
        Expression::Unary { op, arg } => match op.fixity() {
            Fixity::Prefix => {
                out.push_str(op.symbol());
                if *op == UnaryOperatorKind::Not {
                    out.push(' ');
                }
                write(arg, Parent::Prefix, out);
            },
            Fixity::Postfix => {
                write(arg, Parent::Postfix, out);
                out.push_str(op.symbol());
            },
        },
        Expression::Binary { op, left, right } => {
            write(left, Parent::Binary(*op, Side::Left), out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write(right, Parent::Binary(*op, Side::Right), out);
        },
        Expression::Function { kind, args } => write_call(kind.name(), args.iter(), out),
        Expression::UserFunction { name, args } => write_call(name, args.iter(), out),
        Expression::Vector(items) => write_braced(items, out),
        Expression::Matrix(rows) => {
            out.push('{');
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_braced(row, out);
            }
            out.push('}');
        },
        Expression::Define { target, value } => {
            write(target, Parent::Define(Side::Left), out);
            out.push_str(" := ");
            write(value, Parent::Define(Side::Right), out);
        },
        Expression::Undefine(target) => write_call(Construct::Undefine.name(), [target.as_ref()].into_iter(), out),
        Expression::If { condition, then, otherwise } => {
            let args = [Some(condition.as_ref()), Some(then.as_ref()), otherwise.as_deref()];
            write_call(Construct::If.name(), args.into_iter().flatten(), out);
        },
        Expression::For { body, init, condition, step } => {
            let args = [body.as_ref(), init.as_ref(), condition.as_ref(), step.as_ref()];
            write_call(Construct::For.name(), args.into_iter(), out);
        },
        Expression::While { body, condition } => {
            write_call(Construct::While.name(), [body.as_ref(), condition.as_ref()].into_iter(), out);
        },
        Expression::Derivative { expr, variable, point } => {
            out.push_str(Construct::Derivative.name());
            out.push('(');
            write(expr, Parent::Root, out);
            out.push_str(", ");
            out.push_str(variable);
            if let Some(point) = point {
                out.push_str(", ");
                write(point, Parent::Root, out);
            }
            out.push(')');
        },
        Expression::Simplify(inner) => write_call(Construct::Simplify.name(), [inner.as_ref()].into_iter(), out),
    }
}

fn write_call<'a>(name: &str, args: impl Iterator<Item = &'a Expression>, out: &mut String) {
    out.push_str(name);
    out.push('(');
    write_list(args, out);
    out.push(')');
}

fn write_braced(items: &[Expression], out: &mut String) {
    out.push('{');
    write_list(items.iter(), out);
    out.push('}');
}

fn write_list<'a>(items: impl Iterator<Item = &'a Expression>, out: &mut String) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write(item, Parent::Root, out);
    }
}
