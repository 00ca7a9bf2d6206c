//! # evaluator.rs
//!
//! Executes an [`Expression`] tree against an [`ExpressionParameters`].
//!
//! Execution is a plain recursive walk. Arithmetic follows IEEE-754, so
//! `1 / 0` is infinity rather than an error; only the integer domain
//! (`%` on integers, bitwise logic) reports [`ExecutionError::DivisionByZero`]
//! or a domain error.
//!
//! User-function arguments and the point of `deriv(f, x, p)` are bound in
//! place for the duration of the call and the shadowed entries are
//! restored afterwards, whether the call succeeds or not.

use log::debug;
use num_complex::Complex;
use smallvec::SmallVec;

use crate::constants;
use crate::differentiator::differentiate;
use crate::error::ExecutionError;
use crate::expression::Expression;
use crate::functions::{self, matrix};
use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};
use crate::parameters::{ExpressionParameters, Parameter, UserFunctionDefinition};
use crate::simplifier::simplify;
use crate::value::Value;

/// Number of arguments kept on the stack before spilling to the heap.
const ARITY_THRESH: usize = 4;

/// Largest `n` whose factorial is finite in `f64`.
const MAX_FACTORIAL: f64 = 170.0;

type Arguments = SmallVec<[Value; ARITY_THRESH]>;

/// Executes `expr`.
///
/// # Parameters
/// - `expr`: The tree to execute.
/// - `params`: Angle unit, variable bindings and user functions. Assignments,
///   `undef`, `++`/`--` and function definitions update it in place.
///
/// # Returns
/// - `Ok(Value)` with the result of the expression.
/// - `Err(ExecutionError)` for the first failing node; no partial result is
///   produced.
pub fn execute(expr: &Expression, params: &mut ExpressionParameters) -> Result<Value, ExecutionError> {
    Evaluator { params, depth: 0 }.eval(expr)
}

struct Evaluator<'a> {
    params: &'a mut ExpressionParameters,
    /// Current number of nested user-function calls.
    depth: usize,
}

/// Stack left before [`Evaluator::eval`] switches to a fresh segment.
const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each segment allocated once the red zone is reached.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

impl Evaluator<'_> {
    /// Evaluates `expr`, growing the stack on demand so deep user-function
    /// recursion reaches the recursion limit instead of overflowing.
    fn eval(&mut self, expr: &Expression) -> Result<Value, ExecutionError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.eval_node(expr))
    }

    fn eval_node(&mut self, expr: &Expression) -> Result<Value, ExecutionError> {
        match expr {
            Expression::Number(x) => Ok(Value::Number(*x)),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::ComplexNumber(z) => Ok(Value::Complex(*z)),
            Expression::Variable(name) => self.lookup(name),

            Expression::Unary { op: op @ (UnaryOperatorKind::Increment | UnaryOperatorKind::Decrement), arg }
                => self.step_variable(*op, arg),
            Expression::Unary { op, arg } => {
                let value = self.eval(arg)?;
                unary(*op, value)
            },

            Expression::Binary { op, left, right } if op.is_compound_assignment()
                => self.compound_assign(*op, left, right),
            Expression::Binary { op: BinaryOperatorKind::ConditionalAnd, left, right } => {
                let operation = BinaryOperatorKind::ConditionalAnd.symbol();
                Ok(Value::Bool(self.condition(operation, left)? && self.condition(operation, right)?))
            },
            Expression::Binary { op: BinaryOperatorKind::ConditionalOr, left, right } => {
                let operation = BinaryOperatorKind::ConditionalOr.symbol();
                Ok(Value::Bool(self.condition(operation, left)? || self.condition(operation, right)?))
            },
            Expression::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, left, right)
            },

            Expression::Function { kind, args } => {
                let args = self.eval_all(args)?;
                functions::apply(*kind, &args, self.params.angle_unit)
            },
            Expression::UserFunction { name, args } => self.call(name, args),

            Expression::Vector(items) => Ok(Value::Vector(self.eval_row(items)?)),
            Expression::Matrix(rows) => {
                let rows = rows.iter()
                    .map(|row| self.eval_row(row))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Matrix(rows))
            },

            Expression::Define { target, value } => self.define(target, value),
            Expression::Undefine(target) => self.undefine(target),

            Expression::If { condition, then, otherwise } => {
                if self.condition("if", condition)? {
                    self.eval(then)
                } else {
                    match otherwise {
                        Some(otherwise) => self.eval(otherwise),
                        None => Ok(Value::Number(f64::NAN)),
                    }
                }
            },
            Expression::For { body, init, condition, step } => {
                self.eval(init)?;
                let mut last = Value::Number(f64::NAN);
                while self.condition("for", condition)? {
                    last = self.eval(body)?;
                    self.eval(step)?;
                }
                Ok(last)
            },
            Expression::While { body, condition } => {
                let mut last = Value::Number(f64::NAN);
                while self.condition("while", condition)? {
                    last = self.eval(body)?;
                }
                Ok(last)
            },

            Expression::Derivative { expr, variable, point } => {
                let derivative = simplify(&differentiate(expr, variable)?)?;
                match point {
                    Some(point) => {
                        let at = self.eval(point)?;
                        self.with_bindings(vec![(variable.clone(), at)], |ev| ev.eval(&derivative))
                    },
                    None => self.eval(&derivative),
                }
            },
            Expression::Simplify(expr) => {
                let simplified = simplify(expr)?;
                self.eval(&simplified)
            },
        }
    }

    /// Parameters first, then the built-in constants.
    fn lookup(&self, name: &str) -> Result<Value, ExecutionError> {
        self.params.parameters.get(name)
            .cloned()
            .or_else(|| constants::get(name))
            .ok_or_else(|| ExecutionError::UndefinedVariable(name.to_string()))
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExecutionError> {
        self.params.parameters.set(name, value)?;
        Ok(())
    }

    fn eval_all(&mut self, args: &[Expression]) -> Result<Arguments, ExecutionError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    /// Evaluates the items of a vector literal or a matrix row.
    fn eval_row(&mut self, items: &[Expression]) -> Result<Vec<f64>, ExecutionError> {
        items.iter()
            .map(|item| match self.eval(item)? {
                Value::Number(x) => Ok(x),
                other => Err(ExecutionError::TypeMismatch {
                    operation: "vector".to_string(),
                    found: other.kind_name().to_string(),
                }),
            })
            .collect()
    }

    fn condition(&mut self, operation: &str, expr: &Expression) -> Result<bool, ExecutionError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExecutionError::TypeMismatch {
                operation: operation.to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }

    fn variable_name<'e>(&self, operation: &str, target: &'e Expression) -> Result<&'e str, ExecutionError> {
        match target {
            Expression::Variable(name) => Ok(name),
            other => Err(ExecutionError::TypeMismatch {
                operation: operation.to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// `x++` and `x--`; yields the new value.
    fn step_variable(&mut self, op: UnaryOperatorKind, target: &Expression) -> Result<Value, ExecutionError> {
        let name = self.variable_name(op.symbol(), target)?;
        let value = unary(op, self.lookup(name)?)?;
        self.assign(name, value.clone())?;
        Ok(value)
    }

    /// `x += e` and friends; yields the new value.
    fn compound_assign(
        &mut self,
        op: BinaryOperatorKind,
        target: &Expression,
        value: &Expression,
    ) -> Result<Value, ExecutionError> {
        let name = self.variable_name(op.symbol(), target)?;
        let current = self.lookup(name)?;
        let operand = self.eval(value)?;
        let arithmetic_op = op.assignment_operator().unwrap_or(op);
        let value = binary(arithmetic_op, current, operand)?;
        self.assign(name, value.clone())?;
        Ok(value)
    }

    /// `x := e` yields the assigned value, `f(x) := e` yields `true`.
    fn define(&mut self, target: &Expression, value: &Expression) -> Result<Value, ExecutionError> {
        match target {
            Expression::Variable(name) => {
                let value = self.eval(value)?;
                self.assign(name, value.clone())?;
                debug!("defined {} := {}", name, value);
                Ok(value)
            },
            Expression::UserFunction { name, args } => {
                let parameters = args.iter()
                    .map(|arg| self.variable_name(":=", arg).map(str::to_string))
                    .collect::<Result<Vec<_>, _>>()?;
                debug!("defined {}({}) := {}", name, parameters.join(", "), value);
                let definition = UserFunctionDefinition { parameters, body: value.clone() };
                self.params.functions.insert(name, definition);
                Ok(Value::Bool(true))
            },
            other => Err(ExecutionError::TypeMismatch {
                operation: ":=".to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Yields `true` when something was removed.
    fn undefine(&mut self, target: &Expression) -> Result<Value, ExecutionError> {
        let removed = match target {
            Expression::Variable(name) => self.params.parameters.remove(name)?.is_some(),
            Expression::UserFunction { name, args } => self.params.functions.remove(name, args.len()).is_some(),
            other => return Err(ExecutionError::TypeMismatch {
                operation: "undef".to_string(),
                found: other.to_string(),
            }),
        };
        debug!("undefined {} (removed: {})", target, removed);
        Ok(Value::Bool(removed))
    }

    fn call(&mut self, name: &str, args: &[Expression]) -> Result<Value, ExecutionError> {
        let definition = match self.params.functions.get(name, args.len()) {
            Some(definition) => definition.clone(),
            None => return Err(match self.params.functions.arity_of(name) {
                Some(expected) => ExecutionError::ArityMismatch {
                    name: name.to_string(),
                    expected,
                    found: args.len(),
                },
                None => ExecutionError::UndefinedFunction { name: name.to_string(), arity: args.len() },
            }),
        };
        if self.depth >= self.params.recursion_limit {
            return Err(ExecutionError::RecursionLimitExceeded(self.params.recursion_limit));
        }

        let values = self.eval_all(args)?;
        let bindings = definition.parameters.iter().cloned().zip(values).collect();
        self.depth += 1;
        let result = self.with_bindings(bindings, |ev| ev.eval(&definition.body));
        self.depth -= 1;
        result
    }

    /// Runs `f` with `bindings` shadowing the current parameters.
    fn with_bindings<F>(&mut self, bindings: Vec<(String, Value)>, f: F) -> Result<Value, ExecutionError>
    where
        F: FnOnce(&mut Self) -> Result<Value, ExecutionError>,
    {
        let mut shadowed = Vec::with_capacity(bindings.len());
        for (name, value) in bindings {
            let previous = self.params.parameters.bind(&name, Parameter::new(value));
            shadowed.push((name, previous));
        }
        let result = f(self);
        for (name, previous) in shadowed.into_iter().rev() {
            self.params.parameters.unbind(&name, previous);
        }
        result
    }
}

fn mismatch(operation: &str, left: &Value, right: &Value) -> ExecutionError {
    ExecutionError::TypeMismatch {
        operation: operation.to_string(),
        found: format!("{} and {}", left.kind_name(), right.kind_name()),
    }
}

/// Converts an integer-valued number for the bitwise operators.
fn integer(operation: &str, x: f64) -> Result<i64, ExecutionError> {
    if x.fract() != 0.0 || !x.is_finite() {
        return Err(ExecutionError::DomainError(format!("'{}' expects integers, found {}", operation, x)));
    }
    Ok(x as i64)
}

fn factorial(x: f64) -> Result<f64, ExecutionError> {
    if x < 0.0 || x.fract() != 0.0 || x.is_nan() {
        return Err(ExecutionError::DomainError(format!(
            "factorial expects a non-negative integer, found {}", x
        )));
    }
    if x > MAX_FACTORIAL {
        return Ok(f64::INFINITY);
    }
    Ok((1..=x as u64).map(|n| n as f64).product())
}

fn unary(op: UnaryOperatorKind, value: Value) -> Result<Value, ExecutionError> {
    let type_mismatch = |value: &Value| ExecutionError::TypeMismatch {
        operation: op.symbol().to_string(),
        found: value.kind_name().to_string(),
    };
    match (op, value) {
        (UnaryOperatorKind::Negate, Value::Number(x)) => Ok(Value::Number(-x)),
        (UnaryOperatorKind::Negate, Value::Complex(z)) => Ok(Value::Complex(-z)),
        (UnaryOperatorKind::Negate, Value::Vector(v)) => Ok(Value::Vector(v.into_iter().map(|x| -x).collect())),
        (UnaryOperatorKind::Negate, Value::Matrix(m)) => Ok(Value::Matrix(
            m.into_iter().map(|row| row.into_iter().map(|x| -x).collect()).collect()
        )),
        (UnaryOperatorKind::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperatorKind::Not, Value::Number(x)) => Ok(Value::Number(!integer(op.symbol(), x)? as f64)),
        (UnaryOperatorKind::Factorial, Value::Number(x)) => Ok(Value::Number(factorial(x)?)),
        (UnaryOperatorKind::Increment, Value::Number(x)) => Ok(Value::Number(x + 1.0)),
        (UnaryOperatorKind::Decrement, Value::Number(x)) => Ok(Value::Number(x - 1.0)),
        (_, other) => Err(type_mismatch(&other)),
    }
}

fn binary(op: BinaryOperatorKind, left: Value, right: Value) -> Result<Value, ExecutionError> {
    use BinaryOperatorKind::*;
    match op {
        Add | Sub | Mul | Div | Mod | Pow => arithmetic(op, left, right),
        And | Or | XOr | NAnd | NOr | Implication | Equality | ConditionalAnd | ConditionalOr
            => logic(op, left, right),
        Equal | NotEqual | LessThan | LessOrEqual | GreaterThan | GreaterOrEqual
            => relational(op, left, right),
        AddAssign | SubAssign | MulAssign | DivAssign => Err(mismatch(op.symbol(), &left, &right)),
    }
}

fn arithmetic(op: BinaryOperatorKind, left: Value, right: Value) -> Result<Value, ExecutionError> {
    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => real_arithmetic(op, *a, *b),
        (Value::Number(_) | Value::Complex(_), Value::Number(_) | Value::Complex(_)) => {
            match (left.as_complex(), right.as_complex()) {
                (Some(a), Some(b)) => complex_arithmetic(op, a, b).ok_or_else(|| mismatch(op.symbol(), &left, &right)),
                _ => Err(mismatch(op.symbol(), &left, &right)),
            }
        },
        (Value::Vector(_) | Value::Matrix(_), _) | (_, Value::Vector(_) | Value::Matrix(_))
            => tensor_arithmetic(op, &left, &right),
        _ => Err(mismatch(op.symbol(), &left, &right)),
    }
}

fn real_arithmetic(op: BinaryOperatorKind, a: f64, b: f64) -> Result<Value, ExecutionError> {
    let result = match op {
        BinaryOperatorKind::Add => a + b,
        BinaryOperatorKind::Sub => a - b,
        BinaryOperatorKind::Mul => a * b,
        BinaryOperatorKind::Div => a / b,
        BinaryOperatorKind::Pow => a.powf(b),
        _ => {
            if b == 0.0 && a.fract() == 0.0 {
                return Err(ExecutionError::DivisionByZero);
            }
            a % b
        },
    };
    Ok(Value::Number(result))
}

fn complex_arithmetic(op: BinaryOperatorKind, a: Complex<f64>, b: Complex<f64>) -> Option<Value> {
    let result = match op {
        BinaryOperatorKind::Add => a + b,
        BinaryOperatorKind::Sub => a - b,
        BinaryOperatorKind::Mul => a * b,
        BinaryOperatorKind::Div => a / b,
        BinaryOperatorKind::Pow => a.powc(b),
        _ => return None,
    };
    Some(Value::Complex(result))
}

fn tensor_arithmetic(op: BinaryOperatorKind, left: &Value, right: &Value) -> Result<Value, ExecutionError> {
    match op {
        BinaryOperatorKind::Add => matrix::elementwise(op.symbol(), left, right, |a, b| a + b),
        BinaryOperatorKind::Sub => matrix::elementwise(op.symbol(), left, right, |a, b| a - b),
        BinaryOperatorKind::Mul => matrix::multiply(left, right),
        BinaryOperatorKind::Div => match right {
            Value::Number(k) => matrix::multiply(left, &Value::Number(1.0 / k)),
            _ => Err(mismatch(op.symbol(), left, right)),
        },
        BinaryOperatorKind::Pow => match (left, right) {
            (Value::Vector(_) | Value::Matrix(_), Value::Number(n)) => matrix::power(left, *n),
            _ => Err(mismatch(op.symbol(), left, right)),
        },
        _ => Err(mismatch(op.symbol(), left, right)),
    }
}

fn logic(op: BinaryOperatorKind, left: Value, right: Value) -> Result<Value, ExecutionError> {
    use BinaryOperatorKind::*;
    match (&left, &right) {
        (Value::Bool(a), Value::Bool(b)) => {
            let (a, b) = (*a, *b);
            Ok(Value::Bool(match op {
                And | ConditionalAnd => a && b,
                Or | ConditionalOr => a || b,
                XOr => a ^ b,
                NAnd => !(a && b),
                NOr => !(a || b),
                Implication => !a || b,
                _ => a == b,
            }))
        },
        (Value::Number(a), Value::Number(b)) if matches!(op, And | Or | XOr | NAnd | NOr) => {
            let a = integer(op.symbol(), *a)?;
            let b = integer(op.symbol(), *b)?;
            let result = match op {
                And => a & b,
                Or => a | b,
                XOr => a ^ b,
                NAnd => !(a & b),
                _ => !(a | b),
            };
            Ok(Value::Number(result as f64))
        },
        _ => Err(mismatch(op.symbol(), &left, &right)),
    }
}

fn relational(op: BinaryOperatorKind, left: Value, right: Value) -> Result<Value, ExecutionError> {
    use BinaryOperatorKind::*;
    if matches!(op, Equal | NotEqual) {
        let equal = match (&left, &right) {
            (Value::Number(_) | Value::Complex(_), Value::Number(_) | Value::Complex(_))
                => left.as_complex() == right.as_complex(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Matrix(a), Value::Matrix(b)) => a == b,
            _ => return Err(mismatch(op.symbol(), &left, &right)),
        };
        return Ok(Value::Bool(if op == Equal { equal } else { !equal }));
    }

    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(match op {
            LessThan => a < b,
            LessOrEqual => a <= b,
            GreaterThan => a > b,
            _ => a >= b,
        })),
        _ => Err(mismatch(op.symbol(), &left, &right)),
    }
}

#[cfg(test)]
mod evaluator_tests {
    use super::*;
    use crate::error::DifferentiationError;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::parameters::DEFAULT_RECURSION_LIMIT;
    use crate::value::AngleUnit;
    use approx::assert_abs_diff_eq;

    fn run(input: &str, params: &mut ExpressionParameters) -> Result<Value, ExecutionError> {
        let expr = parse(&tokenize(input).unwrap()).unwrap();
        execute(&expr, params)
    }

    fn eval(input: &str) -> Value {
        run(input, &mut ExpressionParameters::new()).unwrap()
    }

    fn number(input: &str) -> f64 {
        eval(input).as_number().unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(number("1 + 2 * 3"), 7.0);
        assert_eq!(number("(1 + 2) * 3"), 9.0);
        assert_eq!(number("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(number("-2 ^ 2"), -4.0);
        assert_eq!(number("7 % 4"), 3.0);
        let mut params = ExpressionParameters::new();
        params.parameters.set("x", 1.5).unwrap();
        assert_eq!(run("2x", &mut params), Ok(Value::Number(3.0)));
    }

    #[test]
    fn test_ieee_division() {
        assert_eq!(number("1 / 0"), f64::INFINITY);
        assert!(number("0 / 0").is_nan());
        assert_eq!(
            run("5 % 0", &mut ExpressionParameters::new()),
            Err(ExecutionError::DivisionByZero)
        );
        assert!(number("5.5 % 0").is_nan());
    }

    #[test]
    fn test_radix_literals() {
        assert_eq!(number("0xFF"), 255.0);
        assert_eq!(number("0b101"), 5.0);
        assert_eq!(number("0755"), 493.0);
    }

    #[test]
    fn test_constants_and_variables() {
        assert_abs_diff_eq!(number("pi"), std::f64::consts::PI);
        assert_abs_diff_eq!(number("e"), std::f64::consts::E);
        assert_eq!(eval("i * i"), Value::Complex(Complex::new(-1.0, 0.0)));

        let mut params = ExpressionParameters::new();
        params.parameters.set("x", 3.0).unwrap();
        assert_eq!(run("x^2 + 1", &mut params), Ok(Value::Number(10.0)));
        assert_eq!(
            run("y + 1", &mut params),
            Err(ExecutionError::UndefinedVariable("y".to_string()))
        );
    }

    #[test]
    fn test_parameters_shadow_constants() {
        let mut params = ExpressionParameters::new().with_parameters(crate::parameters::Parameters::new());
        params.parameters.set("e", 2.0).unwrap();
        assert_eq!(run("e", &mut params), Ok(Value::Number(2.0)));
        let mut params = ExpressionParameters::new().with_parameters(crate::parameters::Parameters::new());
        assert_abs_diff_eq!(run("pi", &mut params).unwrap().as_number().unwrap(), std::f64::consts::PI);
    }

    #[test]
    fn test_functions_and_angle_units() {
        assert_abs_diff_eq!(number("sin(pi / 2)"), 1.0, epsilon = 1.0e-12);
        let mut params = ExpressionParameters::new().with_angle_unit(AngleUnit::Degree);
        let result = run("sin(90)", &mut params).unwrap().as_number().unwrap();
        assert_abs_diff_eq!(result, 1.0, epsilon = 1.0e-12);
        assert_eq!(number("sum(1, 2, 3)"), 6.0);
        assert_eq!(number("avg({1, 2, 3})"), 2.0);
        assert_eq!(eval("sqrt(-4)"), Value::Complex(Complex::new(0.0, 2.0)));
    }

    #[test]
    fn test_complex_arithmetic() {
        assert_eq!(eval("(1 + 2i) * (3 - i)"), Value::Complex(Complex::new(5.0, 5.0)));
        assert_eq!(eval("2 + i"), Value::Complex(Complex::new(2.0, 1.0)));
        assert!(matches!(
            run("i % 2", &mut ExpressionParameters::new()),
            Err(ExecutionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            run("true + 1", &mut ExpressionParameters::new()),
            Err(ExecutionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            run("if(1, 2)", &mut ExpressionParameters::new()),
            Err(ExecutionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_logic_and_bitwise() {
        assert_eq!(eval("true and false"), Value::Bool(false));
        assert_eq!(eval("true xor false"), Value::Bool(true));
        assert_eq!(eval("true nand true"), Value::Bool(false));
        assert_eq!(eval("false nor false"), Value::Bool(true));
        assert_eq!(eval("false => false"), Value::Bool(true));
        assert_eq!(eval("true <=> false"), Value::Bool(false));
        assert_eq!(eval("not true"), Value::Bool(false));
        assert_eq!(number("6 and 3"), 2.0);
        assert_eq!(number("6 or 3"), 7.0);
        assert_eq!(number("6 xor 3"), 5.0);
        assert_eq!(number("not 0"), -1.0);
        assert!(matches!(
            run("1.5 and 1", &mut ExpressionParameters::new()),
            Err(ExecutionError::DomainError(_))
        ));
    }

    #[test]
    fn test_short_circuit() {
        // `y` is undefined, so evaluating the right side would fail.
        assert_eq!(eval("false && y"), Value::Bool(false));
        assert_eq!(eval("true || y"), Value::Bool(true));
    }

    #[test]
    fn test_relational() {
        assert_eq!(eval("1 < 2"), Value::Bool(true));
        assert_eq!(eval("2 <= 1"), Value::Bool(false));
        assert_eq!(eval("3 == 3"), Value::Bool(true));
        assert_eq!(eval("true != false"), Value::Bool(true));
        assert_eq!(eval("{1, 2} == {1, 2}"), Value::Bool(true));
        assert!(matches!(
            run("true < 1", &mut ExpressionParameters::new()),
            Err(ExecutionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_factorial() {
        assert_eq!(number("5!"), 120.0);
        assert_eq!(number("fact(0)"), 1.0);
        assert_eq!(number("171!"), f64::INFINITY);
        assert!(matches!(
            run("2.5!", &mut ExpressionParameters::new()),
            Err(ExecutionError::DomainError(_))
        ));
    }

    #[test]
    fn test_vectors_and_matrices() {
        assert_eq!(eval("{1, 2} + {3, 4}"), Value::Vector(vec![4.0, 6.0]));
        assert_eq!(eval("2 * {1, 2}"), Value::Vector(vec![2.0, 4.0]));
        assert_eq!(eval("{1, 2} * {3, 4}"), Value::Number(11.0));
        assert_eq!(eval("{{1, 2}, {3, 4}} * {1, 1}"), Value::Vector(vec![3.0, 7.0]));
        assert_eq!(eval("{{2, 4}} / 2"), Value::Matrix(vec![vec![1.0, 2.0]]));
        assert_eq!(eval("-{1, 2}"), Value::Vector(vec![-1.0, -2.0]));
        assert_abs_diff_eq!(number("det({{1, 2}, {3, 4}})"), -2.0, epsilon = 1.0e-12);
        assert!(matches!(
            run("det({{1, 2, 3}, {4, 5, 6}})", &mut ExpressionParameters::new()),
            Err(ExecutionError::DomainError(_))
        ));
        assert!(matches!(
            run("{1, 2} + {1, 2, 3}", &mut ExpressionParameters::new()),
            Err(ExecutionError::DomainError(_))
        ));
    }

    #[test]
    fn test_assignment() {
        let mut params = ExpressionParameters::new();
        assert_eq!(run("x := 2", &mut params), Ok(Value::Number(2.0)));
        assert_eq!(run("x += 3", &mut params), Ok(Value::Number(5.0)));
        assert_eq!(run("x *= 2", &mut params), Ok(Value::Number(10.0)));
        assert_eq!(run("x -= 1", &mut params), Ok(Value::Number(9.0)));
        assert_eq!(run("x /= 3", &mut params), Ok(Value::Number(3.0)));
        assert_eq!(run("x++", &mut params), Ok(Value::Number(4.0)));
        assert_eq!(run("x--", &mut params), Ok(Value::Number(3.0)));
        assert_eq!(run("x--2", &mut params), Ok(Value::Number(5.0)));
        assert_eq!(run("x ++ 2", &mut params), Ok(Value::Number(5.0)));
        assert_eq!(params.parameters.get("x"), Some(&Value::Number(3.0)));
        assert_eq!(run("undef(x)", &mut params), Ok(Value::Bool(true)));
        assert!(!params.parameters.contains("x"));
        assert_eq!(run("undef(x)", &mut params), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_read_only_parameters() {
        let mut params = ExpressionParameters::new();
        assert_eq!(
            run("pi := 3", &mut params),
            Err(ExecutionError::ReadOnlyParameter("pi".to_string()))
        );
        params.parameters.set_read_only("limit", 10.0).unwrap();
        assert_eq!(
            run("limit++", &mut params),
            Err(ExecutionError::ReadOnlyParameter("limit".to_string()))
        );
        assert_eq!(
            run("undef(limit)", &mut params),
            Err(ExecutionError::ReadOnlyParameter("limit".to_string()))
        );
    }

    #[test]
    fn test_control_flow() {
        let mut params = ExpressionParameters::new();
        assert_eq!(run("if(1 < 2, 10, 20)", &mut params), Ok(Value::Number(10.0)));
        assert_eq!(run("if(1 > 2, 10, 20)", &mut params), Ok(Value::Number(20.0)));
        assert!(run("if(1 > 2, 10)", &mut params).unwrap().as_number().unwrap().is_nan());

        run("s := 0", &mut params).unwrap();
        assert_eq!(run("for(s += k, k := 1, k <= 4, k++)", &mut params), Ok(Value::Number(10.0)));
        assert_eq!(params.parameters.get("s"), Some(&Value::Number(10.0)));

        run("n := 0", &mut params).unwrap();
        assert_eq!(run("while(n += 2, n < 7)", &mut params), Ok(Value::Number(8.0)));
        let never = run("while(n += 1, false)", &mut params).unwrap();
        assert!(never.as_number().unwrap().is_nan());
    }

    #[test]
    fn test_user_functions() {
        let mut params = ExpressionParameters::new();
        assert_eq!(run("f(x) := x^2 + 1", &mut params), Ok(Value::Bool(true)));
        assert_eq!(run("f(3)", &mut params), Ok(Value::Number(10.0)));
        assert_eq!(run("def(g(a, b), a * b)", &mut params), Ok(Value::Bool(true)));
        assert_eq!(run("g(2, f(1))", &mut params), Ok(Value::Number(4.0)));

        // Arguments do not leak into the caller's bindings.
        assert!(!params.parameters.contains("x"));
        params.parameters.set("x", 7.0).unwrap();
        assert_eq!(run("f(2)", &mut params), Ok(Value::Number(5.0)));
        assert_eq!(params.parameters.get("x"), Some(&Value::Number(7.0)));

        assert_eq!(
            run("f(1, 2)", &mut params),
            Err(ExecutionError::ArityMismatch { name: "f".to_string(), expected: 1, found: 2 })
        );
        assert_eq!(
            run("h(1)", &mut params),
            Err(ExecutionError::UndefinedFunction { name: "h".to_string(), arity: 1 })
        );

        assert_eq!(run("undef(f(x))", &mut params), Ok(Value::Bool(true)));
        assert!(matches!(run("f(1)", &mut params), Err(ExecutionError::UndefinedFunction { .. })));
    }

    #[test]
    fn test_recursive_user_function() {
        let mut params = ExpressionParameters::new();
        run("fib(n) := if(n < 2, n, fib(n - 1) + fib(n - 2))", &mut params).unwrap();
        assert_eq!(run("fib(10)", &mut params), Ok(Value::Number(55.0)));
    }

    #[test]
    fn test_recursion_limit() {
        let mut params = ExpressionParameters::new().with_recursion_limit(16);
        run("loop(x) := loop(x + 1)", &mut params).unwrap();
        assert_eq!(run("loop(0)", &mut params), Err(ExecutionError::RecursionLimitExceeded(16)));
        assert!(!params.parameters.contains("x"));
    }

    fn countdown(n: usize) -> Result<Value, ExecutionError> {
        let mut params = ExpressionParameters::new();
        run("f(n) := if(n < 1, 0, 1 + f(n - 1))", &mut params).unwrap();
        run(&format!("f({})", n), &mut params)
    }

    #[test]
    fn test_default_recursion_limit_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| (countdown(250), countdown(300)))
            .unwrap();
        let (within, beyond) = handle.join().unwrap();
        assert_eq!(within, Ok(Value::Number(250.0)));
        assert_eq!(beyond, Err(ExecutionError::RecursionLimitExceeded(DEFAULT_RECURSION_LIMIT)));
    }

    #[test]
    fn test_default_recursion_limit_on_default_stack() {
        let handle = std::thread::spawn(|| {
            let mut params = ExpressionParameters::new();
            run("loop(x) := loop(x + 1)", &mut params).unwrap();
            (countdown(DEFAULT_RECURSION_LIMIT - 1), run("loop(0)", &mut params))
        });
        let (deepest, endless) = handle.join().unwrap();
        assert_eq!(deepest, Ok(Value::Number((DEFAULT_RECURSION_LIMIT - 1) as f64)));
        assert_eq!(endless, Err(ExecutionError::RecursionLimitExceeded(DEFAULT_RECURSION_LIMIT)));
    }

    #[test]
    fn test_derivative_node() {
        let mut params = ExpressionParameters::new();
        assert_eq!(run("deriv(x^2, x, 3)", &mut params), Ok(Value::Number(6.0)));
        params.parameters.set("x", 2.0).unwrap();
        assert_eq!(run("deriv(x^3)", &mut params), Ok(Value::Number(12.0)));
        assert_eq!(params.parameters.get("x"), Some(&Value::Number(2.0)));
        let result = run("deriv(sin(y), y, 0)", &mut params).unwrap().as_number().unwrap();
        assert_abs_diff_eq!(result, 1.0, epsilon = 1.0e-12);
        assert!(matches!(
            run("deriv(x > 1, x, 1)", &mut params),
            Err(ExecutionError::Differentiation(DifferentiationError::NotDifferentiable(_)))
        ));
    }

    #[test]
    fn test_simplify_node() {
        let mut params = ExpressionParameters::new();
        params.parameters.set("x", 4.0).unwrap();
        assert_eq!(run("simplify(x * 1 + 0)", &mut params), Ok(Value::Number(4.0)));
    }
}
