//! # value.rs
//!
//! Runtime values produced by executing an expression.

use num_complex::Complex;

/// Unit in which trigonometric functions read and produce angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    Degree,
    #[default]
    Radian,
    Gradian,
}

impl AngleUnit {
    /// Converts an angle expressed in this unit to radians.
    pub fn to_radians(&self, angle: f64) -> f64 {
        match self {
            Self::Degree => angle * std::f64::consts::PI / 180.0,
            Self::Radian => angle,
            Self::Gradian => angle * std::f64::consts::PI / 200.0,
        }
    }

    /// Converts an angle in radians to this unit.
    pub fn from_radians(&self, radians: f64) -> f64 {
        match self {
            Self::Degree => radians * 180.0 / std::f64::consts::PI,
            Self::Radian => radians,
            Self::Gradian => radians * 200.0 / std::f64::consts::PI,
        }
    }
}

/// Result of executing an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Complex(Complex<f64>),
    Vector(Vec<f64>),
    /// Row-major, every row has the same length.
    Matrix(Vec<Vec<f64>>),
}

impl Value {
    /// Human readable name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Complex(_) => "complex number",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }

    /// Returns the number if this value is a real number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a complex number when it is numeric.
    pub fn as_complex(&self) -> Option<Complex<f64>> {
        match self {
            Self::Number(x) => Some(Complex::from(*x)),
            Self::Complex(z) => Some(*z),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Complex<f64>> for Value {
    fn from(z: Complex<f64>) -> Self {
        Self::Complex(z)
    }
}

fn write_row(f: &mut std::fmt::Formatter<'_>, row: &[f64]) -> std::fmt::Result {
    write!(f, "{{")?;
    for (i, x) in row.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", x)?;
    }
    write!(f, "}}")
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Complex(z) => {
                if z.im < 0.0 {
                    write!(f, "{}-{}i", z.re, -z.im)
                } else {
                    write!(f, "{}+{}i", z.re, z.im)
                }
            },
            Self::Vector(items) => write_row(f, items),
            Self::Matrix(rows) => {
                write!(f, "{{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_row(f, row)?;
                }
                write!(f, "}}")
            },
        }
    }
}
