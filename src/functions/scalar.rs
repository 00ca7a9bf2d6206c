//! # scalar.rs
//!
//! Elementary functions over real and complex numbers.
//!
//! Real arguments stay real wherever the result is real. `sqrt` of a
//! negative number is the only function that promotes a real argument to
//! a complex result; everything else follows IEEE-754 and yields NaN
//! outside its real domain.

use num_complex::Complex;
use num_traits::Zero;

use crate::error::ExecutionError;
use crate::functions::FunctionKind;
use crate::value::{AngleUnit, Value};

/// A numeric argument after unwrapping its [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Real(f64),
    Complex(Complex<f64>),
}

fn scalar(kind: FunctionKind, value: &Value) -> Result<Scalar, ExecutionError> {
    match value {
        Value::Number(x) => Ok(Scalar::Real(*x)),
        Value::Complex(z) => Ok(Scalar::Complex(*z)),
        other => Err(type_mismatch(kind, other)),
    }
}

fn real(kind: FunctionKind, value: &Value) -> Result<f64, ExecutionError> {
    match value {
        Value::Number(x) => Ok(*x),
        other => Err(type_mismatch(kind, other)),
    }
}

pub(crate) fn type_mismatch(kind: FunctionKind, value: &Value) -> ExecutionError {
    ExecutionError::TypeMismatch {
        operation: kind.name().to_string(),
        found: value.kind_name().to_string(),
    }
}

/// Largest integer every `f64` below it represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn out_of_range(kind: FunctionKind) -> ExecutionError {
    ExecutionError::DomainError(format!("{} result exceeds the exact integer range", kind.name()))
}

/// Converts an integer-valued number to `i64` for `gcd`/`lcm`.
///
/// Only magnitudes up to 2^53 are accepted, so the conversion is exact.
fn integer(kind: FunctionKind, value: &Value) -> Result<i64, ExecutionError> {
    let x = real(kind, value)?;
    if x.fract() != 0.0 || !x.is_finite() {
        return Err(ExecutionError::DomainError(format!("{} expects integers, found {}", kind.name(), x)));
    }
    if x.abs() > MAX_EXACT_INTEGER {
        return Err(ExecutionError::DomainError(format!("{} argument {} is too large", kind.name(), x)));
    }
    Ok(x as i64)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    // both inputs are bounded by 2^53
    a as i64
}

/// Returns `None` when the result leaves the exact integer range.
fn lcm(a: i64, b: i64) -> Option<i64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    let result = (a / gcd(a, b)).checked_mul(b)?.checked_abs()?;
    (result as f64 <= MAX_EXACT_INTEGER).then_some(result)
}

/// Applies a function that maps one real to one real, or one complex to
/// one complex.
fn map_scalar(
    x: Scalar,
    real_fn: impl Fn(f64) -> f64,
    complex_fn: impl Fn(Complex<f64>) -> Complex<f64>,
) -> Value {
    match x {
        Scalar::Real(x) => Value::Number(real_fn(x)),
        Scalar::Complex(z) => Value::Complex(complex_fn(z)),
    }
}

fn trigonometric(kind: FunctionKind, x: Scalar, angle: AngleUnit) -> Value {
    use FunctionKind::*;
    let x = match x {
        Scalar::Real(x) => Scalar::Real(angle.to_radians(x)),
        z => z,
    };
    match kind {
        Sin => map_scalar(x, f64::sin, |z| z.sin()),
        Cos => map_scalar(x, f64::cos, |z| z.cos()),
        Tan => map_scalar(x, f64::tan, |z| z.tan()),
        Cot => map_scalar(x, |x| 1.0 / x.tan(), |z| z.tan().inv()),
        Sec => map_scalar(x, |x| 1.0 / x.cos(), |z| z.cos().inv()),
        _ => map_scalar(x, |x| 1.0 / x.sin(), |z| z.sin().inv()),
    }
}

fn inverse_trigonometric(kind: FunctionKind, x: Scalar, angle: AngleUnit) -> Value {
    use FunctionKind::*;
    let result = match kind {
        Arcsin => map_scalar(x, f64::asin, |z| z.asin()),
        Arccos => map_scalar(x, f64::acos, |z| z.acos()),
        Arctan => map_scalar(x, f64::atan, |z| z.atan()),
        Arccot => map_scalar(x, |x| (1.0 / x).atan(), |z| z.inv().atan()),
        Arcsec => map_scalar(x, |x| (1.0 / x).acos(), |z| z.inv().acos()),
        _ => map_scalar(x, |x| (1.0 / x).asin(), |z| z.inv().asin()),
    };
    match result {
        Value::Number(radians) => Value::Number(angle.from_radians(radians)),
        other => other,
    }
}

fn hyperbolic(kind: FunctionKind, x: Scalar) -> Value {
    use FunctionKind::*;
    match kind {
        Sinh => map_scalar(x, f64::sinh, |z| z.sinh()),
        Cosh => map_scalar(x, f64::cosh, |z| z.cosh()),
        Tanh => map_scalar(x, f64::tanh, |z| z.tanh()),
        Coth => map_scalar(x, |x| 1.0 / x.tanh(), |z| z.tanh().inv()),
        Sech => map_scalar(x, |x| 1.0 / x.cosh(), |z| z.cosh().inv()),
        Csch => map_scalar(x, |x| 1.0 / x.sinh(), |z| z.sinh().inv()),
        Arsinh => map_scalar(x, f64::asinh, |z| z.asinh()),
        Arcosh => map_scalar(x, f64::acosh, |z| z.acosh()),
        Artanh => map_scalar(x, f64::atanh, |z| z.atanh()),
        Arcoth => map_scalar(x, |x| (1.0 / x).atanh(), |z| z.inv().atanh()),
        Arsech => map_scalar(x, |x| (1.0 / x).acosh(), |z| z.inv().acosh()),
        _ => map_scalar(x, |x| (1.0 / x).asinh(), |z| z.inv().asinh()),
    }
}

/// n-th real root, odd roots of negative numbers stay real.
fn root(x: f64, n: f64) -> f64 {
    if x < 0.0 && n.fract() == 0.0 && (n as i64) % 2 != 0 {
        -(-x).powf(1.0 / n)
    } else {
        x.powf(1.0 / n)
    }
}

fn round(x: f64, digits: f64) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (x * scale).round() / scale
}

/// Evaluates a non-matrix, non-statistical built-in function.
pub(crate) fn apply(kind: FunctionKind, args: &[Value], angle: AngleUnit) -> Result<Value, ExecutionError> {
    use FunctionKind::*;
    match kind {
        Abs => match &args[0] {
            Value::Number(x) => Ok(Value::Number(x.abs())),
            Value::Complex(z) => Ok(Value::Number(z.norm())),
            Value::Vector(items) => Ok(Value::Number(items.iter().map(|x| x * x).sum::<f64>().sqrt())),
            other => Err(type_mismatch(kind, other)),
        },
        Sqrt => match scalar(kind, &args[0])? {
            Scalar::Real(x) if x < 0.0 => Ok(Value::Complex(Complex::from(x).sqrt())),
            x => Ok(map_scalar(x, f64::sqrt, |z| z.sqrt())),
        },
        Root => Ok(Value::Number(root(real(kind, &args[0])?, real(kind, &args[1])?))),
        Exp => Ok(map_scalar(scalar(kind, &args[0])?, f64::exp, |z| z.exp())),
        Ln => Ok(map_scalar(scalar(kind, &args[0])?, f64::ln, |z| z.ln())),
        Lg => Ok(map_scalar(scalar(kind, &args[0])?, f64::log10, |z| z.ln() / std::f64::consts::LN_10)),
        Lb => Ok(map_scalar(scalar(kind, &args[0])?, f64::log2, |z| z.ln() / std::f64::consts::LN_2)),
        Log => {
            let base = scalar(kind, &args[0])?;
            match (base, scalar(kind, &args[1])?) {
                (Scalar::Real(b), Scalar::Real(x)) => Ok(Value::Number(x.log(b))),
                (b, x) => {
                    let b = match b { Scalar::Real(b) => Complex::from(b), Scalar::Complex(b) => b };
                    let x = match x { Scalar::Real(x) => Complex::from(x), Scalar::Complex(x) => x };
                    Ok(Value::Complex(x.ln() / b.ln()))
                },
            }
        },
        Ceil => Ok(Value::Number(real(kind, &args[0])?.ceil())),
        Floor => Ok(Value::Number(real(kind, &args[0])?.floor())),
        Round => {
            let x = real(kind, &args[0])?;
            let digits = match args.get(1) {
                Some(d) => real(kind, d)?,
                None => 0.0,
            };
            Ok(Value::Number(round(x, digits)))
        },
        Gcd | Lcm => {
            let mut acc = integer(kind, &args[0])?;
            for arg in &args[1..] {
                let n = integer(kind, arg)?;
                acc = if kind == Gcd { gcd(acc, n) } else { lcm(acc, n).ok_or_else(|| out_of_range(kind))? };
            }
            Ok(Value::Number(acc as f64))
        },
        Sin | Cos | Tan | Cot | Sec | Csc
            => Ok(trigonometric(kind, scalar(kind, &args[0])?, angle)),
        Arcsin | Arccos | Arctan | Arccot | Arcsec | Arccsc
            => Ok(inverse_trigonometric(kind, scalar(kind, &args[0])?, angle)),
        Sinh | Cosh | Tanh | Coth | Sech | Csch | Arsinh | Arcosh | Artanh | Arcoth | Arsech | Arcsch
            => Ok(hyperbolic(kind, scalar(kind, &args[0])?)),
        Re => Ok(Value::Number(match scalar(kind, &args[0])? {
            Scalar::Real(x) => x,
            Scalar::Complex(z) => z.re,
        })),
        Im => Ok(Value::Number(match scalar(kind, &args[0])? {
            Scalar::Real(_) => 0.0,
            Scalar::Complex(z) => z.im,
        })),
        Phase => Ok(Value::Number(match scalar(kind, &args[0])? {
            Scalar::Real(x) => Complex::from(x).arg(),
            Scalar::Complex(z) => z.arg(),
        })),
        Conjugate => Ok(map_scalar(scalar(kind, &args[0])?, |x| x, |z| z.conj())),
        Reciprocal => match scalar(kind, &args[0])? {
            Scalar::Complex(z) if z.is_zero() => Ok(Value::Complex(Complex::new(f64::INFINITY, 0.0))),
            x => Ok(map_scalar(x, |x| 1.0 / x, |z| z.inv())),
        },
        _ => Err(ExecutionError::DomainError(format!("'{}' is not a scalar function", kind.name()))),
    }
}

#[cfg(test)]
mod scalar_tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn eval(kind: FunctionKind, args: &[f64]) -> f64 {
        let args: Vec<Value> = args.iter().map(|x| Value::Number(*x)).collect();
        apply(kind, &args, AngleUnit::Radian).unwrap().as_number().unwrap()
    }

    #[test]
    fn test_elementary() {
        assert_abs_diff_eq!(eval(FunctionKind::Sqrt, &[16.0]), 4.0);
        assert_abs_diff_eq!(eval(FunctionKind::Root, &[27.0, 3.0]), 3.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Root, &[-8.0, 3.0]), -2.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Lg, &[1000.0]), 3.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Lb, &[8.0]), 3.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Log, &[2.0, 32.0]), 5.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Round, &[2.456, 2.0]), 2.46, epsilon = 1.0e-12);
        assert_eq!(eval(FunctionKind::Round, &[2.5]), 3.0);
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(eval(FunctionKind::Gcd, &[12.0, 18.0, 30.0]), 6.0);
        assert_eq!(eval(FunctionKind::Lcm, &[4.0, 6.0]), 12.0);
        let err = apply(FunctionKind::Gcd, &[Value::Number(1.5), Value::Number(3.0)], AngleUnit::Radian);
        assert!(matches!(err, Err(ExecutionError::DomainError(_))));
    }

    #[test]
    fn test_gcd_lcm_large_arguments() {
        assert_eq!(eval(FunctionKind::Gcd, &[-12.0, 18.0]), 6.0);
        assert_eq!(eval(FunctionKind::Gcd, &[-9007199254740992.0, -1.0]), 1.0);
        assert_eq!(eval(FunctionKind::Lcm, &[-4.0, 6.0]), 12.0);

        let apply_to = |kind, args: &[f64]| {
            let args: Vec<Value> = args.iter().map(|x| Value::Number(*x)).collect();
            apply(kind, &args, AngleUnit::Radian)
        };
        assert!(matches!(
            apply_to(FunctionKind::Gcd, &[-9223372036854775808.0, -1.0]),
            Err(ExecutionError::DomainError(_))
        ));
        assert!(matches!(
            apply_to(FunctionKind::Lcm, &[4.0e18, 3.0]),
            Err(ExecutionError::DomainError(_))
        ));
        assert!(matches!(
            apply_to(FunctionKind::Lcm, &[9007199254740881.0, 9007199254740847.0]),
            Err(ExecutionError::DomainError(_))
        ));
    }

    #[test]
    fn test_sqrt_of_negative_is_complex() {
        let result = apply(FunctionKind::Sqrt, &[Value::Number(-4.0)], AngleUnit::Radian).unwrap();
        assert_eq!(result, Value::Complex(Complex::new(0.0, 2.0)));
    }

    #[test]
    fn test_angle_units() {
        let sin = |unit, x| apply(FunctionKind::Sin, &[Value::Number(x)], unit).unwrap().as_number().unwrap();
        assert_abs_diff_eq!(sin(AngleUnit::Degree, 90.0), 1.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(sin(AngleUnit::Gradian, 100.0), 1.0, epsilon = 1.0e-12);
        let asin = apply(FunctionKind::Arcsin, &[Value::Number(1.0)], AngleUnit::Degree).unwrap();
        assert_abs_diff_eq!(asin.as_number().unwrap(), 90.0, epsilon = 1.0e-9);
    }

    #[test]
    fn test_reciprocal_functions() {
        assert_abs_diff_eq!(eval(FunctionKind::Sec, &[0.0]), 1.0);
        assert_abs_diff_eq!(eval(FunctionKind::Arccot, &[1.0]), std::f64::consts::FRAC_PI_4, epsilon = 1.0e-12);
        assert_abs_diff_eq!(eval(FunctionKind::Arsech, &[1.0]), 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn test_complex_functions() {
        let z = Value::Complex(Complex::new(3.0, 4.0));
        let abs = apply(FunctionKind::Abs, &[z.clone()], AngleUnit::Radian).unwrap();
        assert_eq!(abs, Value::Number(5.0));
        let conj = apply(FunctionKind::Conjugate, &[z.clone()], AngleUnit::Radian).unwrap();
        assert_eq!(conj, Value::Complex(Complex::new(3.0, -4.0)));
        assert_eq!(apply(FunctionKind::Im, &[z], AngleUnit::Radian).unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_type_mismatch() {
        let err = apply(FunctionKind::Sin, &[Value::Bool(true)], AngleUnit::Radian).unwrap_err();
        assert_eq!(err, ExecutionError::TypeMismatch { operation: "sin".into(), found: "bool".into() });
    }
}
