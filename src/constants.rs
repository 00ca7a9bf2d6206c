//! # constants.rs
//!
//! Built-in mathematical constants that can be referenced by name in
//! expressions.
//!
//! Constants are looked up after the caller's parameters, so a parameter
//! named `e` hides Euler's number.

use num_complex::Complex;
use phf::Map;
use phf_macros::phf_map;

use crate::value::Value;

/// Map of built-in constants by their spelling.
static CONSTANTS: Map<&'static str, Complex<f64>> = phf_map! {
    "pi" => Complex::new(std::f64::consts::PI, 0.0),
    "π" => Complex::new(std::f64::consts::PI, 0.0),
    "e" => Complex::new(std::f64::consts::E, 0.0),
    "i" => Complex::new(0.0, 1.0),
};

/// Returns the value of the built-in constant `name`.
///
/// Real constants are returned as [`Value::Number`], the imaginary unit
/// as [`Value::Complex`].
pub fn get(name: &str) -> Option<Value> {
    CONSTANTS.get(name).map(|z| {
        if z.im == 0.0 {
            Value::Number(z.re)
        } else {
            Value::Complex(*z)
        }
    })
}

/// Returns `true` if `name` is a built-in constant.
pub fn contains(name: &str) -> bool {
    CONSTANTS.contains_key(name)
}

/// Returns a list of supported constant names.
pub fn names() -> Vec<&'static str> {
    CONSTANTS.keys().cloned().collect()
}

#[cfg(test)]
mod constants_tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_real_constants() {
        let pi = get("pi").and_then(|v| v.as_number()).unwrap();
        assert_abs_diff_eq!(pi, std::f64::consts::PI);
        assert_eq!(get("π"), get("pi"));
        let e = get("e").and_then(|v| v.as_number()).unwrap();
        assert_abs_diff_eq!(e, std::f64::consts::E);
    }

    #[test]
    fn test_imaginary_unit() {
        assert_eq!(get("i"), Some(Value::Complex(Complex::new(0.0, 1.0))));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(get("tau"), None);
        assert!(!contains("PI"));
        assert_eq!(names().len(), 4);
    }
}
