//! # matrix.rs
//!
//! Vector and matrix operations: the `transpose`, `det` and `inverse`
//! built-ins plus the arithmetic the evaluator performs when an operand of
//! `+`, `-`, `*` or `^` is a vector or a matrix.
//!
//! Matrices are row-major `Vec<Vec<f64>>`; the parser guarantees that all
//! rows have the same length.

use crate::error::ExecutionError;
use crate::functions::scalar::type_mismatch;
use crate::functions::FunctionKind;
use crate::value::Value;

type Matrix = Vec<Vec<f64>>;

const SINGULAR_EPSILON: f64 = 1.0e-12;

fn shape(m: &Matrix) -> (usize, usize) {
    (m.len(), m.first().map_or(0, |r| r.len()))
}

fn transpose(m: &Matrix) -> Matrix {
    let (rows, cols) = shape(m);
    (0..cols).map(|j| (0..rows).map(|i| m[i][j]).collect()).collect()
}

fn require_square(kind: FunctionKind, m: &Matrix) -> Result<usize, ExecutionError> {
    let (rows, cols) = shape(m);
    if rows != cols || rows == 0 {
        return Err(ExecutionError::DomainError(format!(
            "{} requires a non-empty square matrix, found {}x{}", kind.name(), rows, cols
        )));
    }
    Ok(rows)
}

/// Index of the row at or below `col` with the largest pivot.
fn pivot_row(m: &Matrix, col: usize) -> usize {
    (col..m.len())
        .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
        .unwrap_or(col)
}

/// Determinant by Gaussian elimination with partial pivoting.
fn determinant(mut m: Matrix) -> f64 {
    let n = m.len();
    let mut det = 1.0;
    for col in 0..n {
        let pivot = pivot_row(&m, col);
        if m[pivot][col].abs() < SINGULAR_EPSILON {
            return 0.0;
        }
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        det *= m[col][col];
        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }
    det
}

/// Inverse by Gauss-Jordan elimination, `None` when singular.
fn inverse(m: &Matrix) -> Option<Matrix> {
    let n = m.len();
    let mut a: Matrix = m.iter().enumerate().map(|(i, row)| {
        let mut extended = row.clone();
        extended.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
        extended
    }).collect();

    for col in 0..n {
        let pivot = pivot_row(&a, col);
        if a[pivot][col].abs() < SINGULAR_EPSILON {
            return None;
        }
        a.swap(pivot, col);
        let p = a[col][col];
        for value in a[col].iter_mut() {
            *value /= p;
        }
        for row in 0..n {
            if row != col {
                let factor = a[row][col];
                for k in 0..2 * n {
                    a[row][k] -= factor * a[col][k];
                }
            }
        }
    }
    Some(a.into_iter().map(|row| row[n..].to_vec()).collect())
}

/// Evaluates `transpose`, `det` or `inverse`.
pub(crate) fn apply(kind: FunctionKind, arg: &Value) -> Result<Value, ExecutionError> {
    let m = match arg {
        Value::Matrix(m) => m,
        Value::Vector(v) if kind == FunctionKind::Transpose
            => return Ok(Value::Matrix(v.iter().map(|x| vec![*x]).collect())),
        other => return Err(type_mismatch(kind, other)),
    };
    match kind {
        FunctionKind::Transpose => Ok(Value::Matrix(transpose(m))),
        FunctionKind::Determinant => {
            require_square(kind, m)?;
            Ok(Value::Number(determinant(m.clone())))
        },
        _ => {
            require_square(kind, m)?;
            inverse(m)
                .map(Value::Matrix)
                .ok_or_else(|| ExecutionError::DomainError("matrix is singular".to_string()))
        },
    }
}

fn shape_error(operation: &str, left: (usize, usize), right: (usize, usize)) -> ExecutionError {
    ExecutionError::DomainError(format!(
        "'{}' needs matching shapes, found {}x{} and {}x{}", operation, left.0, left.1, right.0, right.1
    ))
}

/// Element-wise `+` or `-` of two vectors or two matrices of equal shape.
pub(crate) fn elementwise(
    operation: &str,
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, ExecutionError> {
    match (left, right) {
        (Value::Vector(a), Value::Vector(b)) => {
            if a.len() != b.len() {
                return Err(shape_error(operation, (1, a.len()), (1, b.len())));
            }
            Ok(Value::Vector(a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect()))
        },
        (Value::Matrix(a), Value::Matrix(b)) => {
            if shape(a) != shape(b) {
                return Err(shape_error(operation, shape(a), shape(b)));
            }
            Ok(Value::Matrix(a.iter().zip(b).map(|(ra, rb)| {
                ra.iter().zip(rb).map(|(x, y)| f(*x, *y)).collect()
            }).collect()))
        },
        (l, r) => Err(ExecutionError::TypeMismatch {
            operation: operation.to_string(),
            found: format!("{} and {}", l.kind_name(), r.kind_name()),
        }),
    }
}

/// `*` where at least one side is a vector or a matrix.
pub(crate) fn multiply(left: &Value, right: &Value) -> Result<Value, ExecutionError> {
    match (left, right) {
        (Value::Number(k), Value::Vector(v)) | (Value::Vector(v), Value::Number(k))
            => Ok(Value::Vector(v.iter().map(|x| k * x).collect())),
        (Value::Number(k), Value::Matrix(m)) | (Value::Matrix(m), Value::Number(k))
            => Ok(Value::Matrix(m.iter().map(|r| r.iter().map(|x| k * x).collect()).collect())),
        (Value::Vector(a), Value::Vector(b)) => {
            if a.len() != b.len() {
                return Err(shape_error("*", (1, a.len()), (1, b.len())));
            }
            Ok(Value::Number(a.iter().zip(b).map(|(x, y)| x * y).sum()))
        },
        (Value::Matrix(m), Value::Vector(v)) => {
            let (rows, cols) = shape(m);
            if cols != v.len() {
                return Err(shape_error("*", (rows, cols), (v.len(), 1)));
            }
            Ok(Value::Vector(m.iter().map(|r| r.iter().zip(v).map(|(x, y)| x * y).sum()).collect()))
        },
        (Value::Matrix(a), Value::Matrix(b)) => {
            let (rows, inner) = shape(a);
            let (b_rows, cols) = shape(b);
            if inner != b_rows {
                return Err(shape_error("*", (rows, inner), (b_rows, cols)));
            }
            Ok(Value::Matrix((0..rows).map(|i| {
                (0..cols).map(|j| (0..inner).map(|k| a[i][k] * b[k][j]).sum()).collect()
            }).collect()))
        },
        (l, r) => Err(ExecutionError::TypeMismatch {
            operation: "*".to_string(),
            found: format!("{} and {}", l.kind_name(), r.kind_name()),
        }),
    }
}

fn integer_exponent(exponent: f64) -> Result<i64, ExecutionError> {
    if exponent.fract() != 0.0 || !exponent.is_finite() || exponent.abs() > i64::MAX as f64 {
        return Err(ExecutionError::DomainError(format!(
            "'^' on a vector or a matrix requires an integer exponent, found {}", exponent
        )));
    }
    Ok(exponent as i64)
}

/// `^` of a vector or a square matrix to an integer exponent.
///
/// A matrix power is repeated `*`: a zero exponent gives the identity and a
/// negative one raises the inverse. A vector power is the repeated dot
/// product, so `v ^ 2` is `v * v` and `v ^ 3` is `(v * v) * v`.
pub(crate) fn power(base: &Value, exponent: f64) -> Result<Value, ExecutionError> {
    let n = integer_exponent(exponent)?;
    match base {
        Value::Vector(v) => {
            if n < 0 {
                return Err(ExecutionError::DomainError("a vector has no inverse".to_string()));
            }
            let norm_squared: f64 = v.iter().map(|x| x * x).sum();
            let scale = norm_squared.powf((n / 2) as f64);
            if n % 2 == 0 {
                Ok(Value::Number(scale))
            } else {
                Ok(Value::Vector(v.iter().map(|x| scale * x).collect()))
            }
        },
        Value::Matrix(m) => {
            let (rows, cols) = shape(m);
            if rows != cols || rows == 0 {
                return Err(ExecutionError::DomainError(format!(
                    "'^' requires a non-empty square matrix, found {}x{}", rows, cols
                )));
            }
            let mut factor = if n < 0 {
                Value::Matrix(inverse(m).ok_or_else(|| ExecutionError::DomainError("matrix is singular".to_string()))?)
            } else {
                base.clone()
            };
            let identity = (0..rows).map(|i| (0..rows).map(|j| if i == j { 1.0 } else { 0.0 }).collect()).collect();
            let mut result = Value::Matrix(identity);
            let mut n = n.unsigned_abs();
            while n > 0 {
                if n & 1 == 1 {
                    result = multiply(&result, &factor)?;
                }
                n >>= 1;
                if n > 0 {
                    factor = multiply(&factor, &factor)?;
                }
            }
            Ok(result)
        },
        other => Err(ExecutionError::TypeMismatch {
            operation: "^".to_string(),
            found: format!("{} and number", other.kind_name()),
        }),
    }
}
