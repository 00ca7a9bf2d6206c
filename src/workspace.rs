//! # workspace.rs
//!
//! Saved state of an interactive session.
//!
//! A [`Workspace`] holds nothing but strings: the history of entered
//! expressions, every normal or read-only variable with its value written
//! as source text, and every user function written as a definition. It
//! derives `serde` traits so a host can store it in whatever format it
//! likes, and [`Workspace::restore`] rebuilds the parameters by parsing
//! and executing those strings again.
//!
//! # Examples
//! ```
//! use symcalc::{calculate, ExpressionParameters, Value, Workspace};
//!
//! let mut params = ExpressionParameters::new();
//! calculate("x := 3", &mut params).unwrap();
//! calculate("f(a) := a ^ 2 + x", &mut params).unwrap();
//!
//! let saved = Workspace::capture(&params, vec!["f(2)".to_string()]);
//! let mut restored = saved.restore().unwrap();
//!
//! assert_eq!(calculate("f(2)", &mut restored).unwrap(), Value::Number(7.0));
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::formatter::format_number;
use crate::parameters::{ExpressionParameters, Parameter, ParameterKind};
use crate::value::Value;

/// A variable as stored in a [`Workspace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedVariable {
    pub name: String,
    /// Source text that evaluates to the value.
    pub value: String,
    pub read_only: bool,
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Workspace {
    /// Entered expressions, oldest first. Kept as history only.
    pub expressions: Vec<String>,
    pub variables: Vec<SavedVariable>,
    /// User functions as `name(params) := body`.
    pub functions: Vec<String>,
}

impl Workspace {
    /// Snapshots `params` together with the expression history.
    ///
    /// Constants are not saved; they are seeded again on restore.
    pub fn capture(params: &ExpressionParameters, expressions: Vec<String>) -> Self {
        let variables = params
            .parameters
            .iter()
            .filter(|(_, p)| p.kind != ParameterKind::Constant)
            .map(|(name, p)| SavedVariable {
                name: name.to_string(),
                value: value_source(&p.value),
                read_only: p.kind == ParameterKind::ReadOnly,
            })
            .collect();
        let functions = params
            .functions
            .iter()
            .map(|(name, def)| format!("{}({}) := {}", name, def.parameters.join(", "), def.body))
            .collect();
        Self { expressions, variables, functions }
    }

    /// Rebuilds execution parameters from the saved strings.
    ///
    /// # Returns
    /// - `Ok(ExpressionParameters)` with the constants, every saved variable
    ///   and every saved function.
    /// - `Err(Error)` with the first entry that fails to parse or execute.
    pub fn restore(&self) -> Result<ExpressionParameters, Error> {
        let mut params = ExpressionParameters::new();
        for saved in &self.variables {
            let value = crate::calculate(&saved.value, &mut params)?;
            let parameter = if saved.read_only { Parameter::read_only(value) } else { Parameter::new(value) };
            params.parameters.insert(&saved.name, parameter)?;
        }
        for definition in &self.functions {
            crate::calculate(definition, &mut params)?;
        }
        debug!(
            "restored workspace with {} variable(s) and {} function(s)",
            self.variables.len(),
            self.functions.len()
        );
        Ok(params)
    }
}

/// Writes a number so that executing the text gives it back, non-finite
/// values included.
fn number_source(x: f64) -> String {
    if x.is_nan() {
        "0 / 0".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "1 / 0".to_string() } else { "-1 / 0".to_string() }
    } else {
        format_number(x)
    }
}

fn row_source(row: &[f64]) -> String {
    let items: Vec<String> = row.iter().map(|x| number_source(*x)).collect();
    format!("{{{}}}", items.join(", "))
}

fn value_source(value: &Value) -> String {
    match value {
        Value::Number(x) => number_source(*x),
        Value::Bool(b) => b.to_string(),
        Value::Complex(z) => {
            let sign = if z.im < 0.0 { "-" } else { "+" };
            format!("{} {} {} * i", number_source(z.re), sign, number_source(z.im.abs()))
        },
        Value::Vector(items) => row_source(items),
        Value::Matrix(rows) => {
            let rows: Vec<String> = rows.iter().map(|row| row_source(row)).collect();
            format!("{{{}}}", rows.join(", "))
        },
    }
}
