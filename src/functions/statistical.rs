//! # statistical.rs
//!
//! N-ary aggregates. Each accepts either any number of plain numbers or a
//! single vector; mixing the two forms is a domain error.

use crate::error::ExecutionError;
use crate::functions::scalar::type_mismatch;
use crate::functions::FunctionKind;
use crate::value::Value;

/// Collects the sample the aggregate runs over.
fn sample(kind: FunctionKind, args: &[Value]) -> Result<Vec<f64>, ExecutionError> {
    if let [Value::Vector(items)] = args {
        return Ok(items.clone());
    }
    args.iter()
        .map(|arg| match arg {
            Value::Number(x) => Ok(*x),
            Value::Vector(_) => Err(ExecutionError::DomainError(format!(
                "{} accepts numbers or a single vector, not both", kind.name()
            ))),
            other => Err(type_mismatch(kind, other)),
        })
        .collect()
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sum of squared deviations divided by `len - correction`.
fn variance(xs: &[f64], correction: usize) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() as f64 - correction as f64)
}

/// Evaluates a statistical aggregate.
pub(crate) fn apply(kind: FunctionKind, args: &[Value]) -> Result<Value, ExecutionError> {
    use FunctionKind::*;
    let xs = sample(kind, args)?;
    let result = match kind {
        Sum => xs.iter().sum(),
        Product => xs.iter().product(),
        Avg => mean(&xs),
        Min => xs.iter().cloned().fold(f64::NAN, f64::min),
        Max => xs.iter().cloned().fold(f64::NAN, f64::max),
        Count => xs.len() as f64,
        Var => variance(&xs, 1),
        Varp => variance(&xs, 0),
        Stdev => variance(&xs, 1).sqrt(),
        Stdevp => variance(&xs, 0).sqrt(),
        _ => return Err(ExecutionError::DomainError(format!("'{}' is not an aggregate", kind.name()))),
    };
    Ok(Value::Number(result))
}

#[cfg(test)]
mod statistical_tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn numbers(xs: &[f64]) -> Vec<Value> {
        xs.iter().map(|x| Value::Number(*x)).collect()
    }

    fn eval(kind: FunctionKind, args: &[Value]) -> f64 {
        apply(kind, args).unwrap().as_number().unwrap()
    }

    #[test]
    fn test_basic_aggregates() {
        let args = numbers(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(eval(FunctionKind::Sum, &args), 40.0);
        assert_eq!(eval(FunctionKind::Avg, &args), 5.0);
        assert_eq!(eval(FunctionKind::Min, &args), 2.0);
        assert_eq!(eval(FunctionKind::Max, &args), 9.0);
        assert_eq!(eval(FunctionKind::Count, &args), 8.0);
        assert_abs_diff_eq!(eval(FunctionKind::Varp, &args), 4.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Stdevp, &args), 2.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Var, &args), 32.0 / 7.0, epsilon = 1.0e-12);
        assert_eq!(eval(FunctionKind::Product, &numbers(&[2.0, 3.0, 4.0])), 24.0);
    }

    #[test]
    fn test_single_vector_argument() {
        let args = [Value::Vector(vec![1.0, 2.0, 3.0])];
        assert_eq!(eval(FunctionKind::Sum, &args), 6.0);
        assert_eq!(eval(FunctionKind::Count, &args), 3.0);
    }

    #[test]
    fn test_mixed_arguments_are_rejected() {
        let args = [Value::Vector(vec![1.0]), Value::Number(2.0)];
        assert!(matches!(apply(FunctionKind::Sum, &args), Err(ExecutionError::DomainError(_))));
        let args = [Value::Bool(true)];
        assert!(matches!(apply(FunctionKind::Avg, &args), Err(ExecutionError::TypeMismatch { .. })));
    }
}
