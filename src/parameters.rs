//! # parameters.rs
//!
//! Variable bindings and user-defined functions consulted while executing
//! an expression.
//!
//! [`Parameters`] keeps its entries in insertion order so a host can list
//! them back to the user the way they were created. Every entry has a
//! [`ParameterKind`] that decides whether an assignment may replace it.
//!
//! [`Functions`] maps a `(name, arity)` pair to the parameter names and
//! body of a user function, so `f(x)` and `f(x, y)` can coexist.
//!
//! [`ExpressionParameters`] bundles both registries with the angle unit
//! and the recursion limit; it is the only configuration `execute` reads.

use indexmap::IndexMap;

use crate::constants;
use crate::error::ParametersError;
use crate::expression::Expression;
use crate::value::{AngleUnit, Value};

/// Default limit of nested user-function calls.
pub const DEFAULT_RECURSION_LIMIT: usize = 256;

/// Mutability of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    /// Can be reassigned and removed.
    #[default]
    Normal,
    /// Set by the host, cannot be changed from an expression.
    ReadOnly,
    /// A built-in constant such as `pi`.
    Constant,
}

/// A single bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub value: Value,
    pub kind: ParameterKind,
}

impl Parameter {
    /// Creates a normal, writable parameter.
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into(), kind: ParameterKind::Normal }
    }

    /// Creates a parameter that expressions may read but not assign.
    pub fn read_only(value: impl Into<Value>) -> Self {
        Self { value: value.into(), kind: ParameterKind::ReadOnly }
    }

    /// Returns `true` unless the parameter is read-only or a constant.
    pub fn is_writable(&self) -> bool {
        self.kind == ParameterKind::Normal
    }
}

/// An ordered collection of named parameters.
///
/// # Examples
///
/// ```
/// use symcalc::{Parameters, Value};
///
/// let mut params = Parameters::with_constants();
/// params.set("x", 2.0).unwrap();
///
/// assert_eq!(params.get("x"), Some(&Value::Number(2.0)));
/// assert!(params.set("pi", 3.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    table: IndexMap<String, Parameter>,
}

impl Parameters {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self { table: IndexMap::new() }
    }

    /// Creates a collection seeded with the built-in constants as
    /// [`ParameterKind::Constant`] entries.
    pub fn with_constants() -> Self {
        let mut params = Self::new();
        for name in constants::names() {
            if let Some(value) = constants::get(name) {
                params.table.insert(name.to_string(), Parameter { value, kind: ParameterKind::Constant });
            }
        }
        params
    }

    /// Adds a constant. A second constant with the same name is rejected.
    pub fn add_constant(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ParametersError> {
        match self.table.get(name) {
            Some(existing) if existing.kind == ParameterKind::Constant
                => Err(ParametersError::ConstantRedefinition(name.to_string())),
            Some(existing) if existing.kind == ParameterKind::ReadOnly
                => Err(ParametersError::ReadOnly(name.to_string())),
            _ => {
                self.table.insert(name.to_string(), Parameter { value: value.into(), kind: ParameterKind::Constant });
                Ok(())
            },
        }
    }

    /// Inserts or replaces a parameter, keeping its original position
    /// when it already existed.
    pub fn insert(&mut self, name: &str, parameter: Parameter) -> Result<(), ParametersError> {
        match self.table.get_mut(name) {
            Some(existing) if !existing.is_writable() => Err(ParametersError::ReadOnly(name.to_string())),
            Some(existing) => {
                *existing = parameter;
                Ok(())
            },
            None => {
                self.table.insert(name.to_string(), parameter);
                Ok(())
            },
        }
    }

    /// Binds `name` to `value` as a normal parameter.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ParametersError> {
        self.insert(name, Parameter::new(value))
    }

    /// Binds `name` to `value` as a read-only parameter.
    pub fn set_read_only(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ParametersError> {
        self.insert(name, Parameter::read_only(value))
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.table.get(name).map(|p| &p.value)
    }

    /// Returns the full entry bound to `name`.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.table.get(name)
    }

    /// Checks if a parameter with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Removes a normal parameter. Read-only entries and constants are kept
    /// and reported as an error.
    pub fn remove(&mut self, name: &str) -> Result<Option<Parameter>, ParametersError> {
        match self.table.get(name) {
            Some(existing) if !existing.is_writable() => Err(ParametersError::ReadOnly(name.to_string())),
            Some(_) => Ok(self.table.shift_remove(name)),
            None => Ok(None),
        }
    }

    /// Binds `name` regardless of its kind and returns the entry it
    /// shadowed. Used for user-function arguments and `deriv` points.
    pub(crate) fn bind(&mut self, name: &str, parameter: Parameter) -> Option<Parameter> {
        self.table.insert(name.to_string(), parameter)
    }

    /// Undoes [`Parameters::bind`].
    pub(crate) fn unbind(&mut self, name: &str, previous: Option<Parameter>) {
        match previous {
            Some(parameter) => {
                self.table.insert(name.to_string(), parameter);
            },
            None => {
                self.table.shift_remove(name);
            },
        }
    }

    /// Removes every normal parameter.
    pub fn clear(&mut self) {
        self.table.retain(|_, p| !p.is_writable());
    }

    /// Returns the number of entries, constants included.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the collection contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Formal parameters and body of a user function.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunctionDefinition {
    pub parameters: Vec<String>,
    pub body: Expression,
}

/// Registry of user functions keyed by name and arity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Functions {
    table: IndexMap<(String, usize), UserFunctionDefinition>,
}

impl Functions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { table: IndexMap::new() }
    }

    /// Registers `definition` under `name`, replacing any function with the
    /// same name and arity. Returns the replaced definition.
    pub fn insert(&mut self, name: &str, definition: UserFunctionDefinition) -> Option<UserFunctionDefinition> {
        let key = (name.to_string(), definition.parameters.len());
        self.table.insert(key, definition)
    }

    /// Returns the function `name` taking `arity` arguments.
    pub fn get(&self, name: &str, arity: usize) -> Option<&UserFunctionDefinition> {
        self.table.get(&(name.to_string(), arity))
    }

    /// Returns `true` if some overload of `name` exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.table.keys().any(|(n, _)| n == name)
    }

    /// Returns the arity of the first registered overload of `name`.
    pub fn arity_of(&self, name: &str) -> Option<usize> {
        self.table.keys().find(|(n, _)| n == name).map(|(_, arity)| *arity)
    }

    /// Removes the function `name` taking `arity` arguments.
    pub fn remove(&mut self, name: &str, arity: usize) -> Option<UserFunctionDefinition> {
        self.table.shift_remove(&(name.to_string(), arity))
    }

    /// Removes every function.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns the number of registered functions.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no function is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over `(name, definition)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserFunctionDefinition)> {
        self.table.iter().map(|((name, _), def)| (name.as_str(), def))
    }
}

/// Everything `execute` needs besides the tree itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionParameters {
    pub angle_unit: AngleUnit,
    pub parameters: Parameters,
    pub functions: Functions,
    /// Maximum depth of nested user-function calls.
    pub recursion_limit: usize,
}

impl ExpressionParameters {
    /// Creates parameters with the built-in constants, radians and the
    /// default recursion limit.
    pub fn new() -> Self {
        Self {
            angle_unit: AngleUnit::default(),
            parameters: Parameters::with_constants(),
            functions: Functions::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Replaces the angle unit.
    pub fn with_angle_unit(mut self, angle_unit: AngleUnit) -> Self {
        self.angle_unit = angle_unit;
        self
    }

    /// Replaces the parameter collection.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Replaces the user-function registry.
    pub fn with_functions(mut self, functions: Functions) -> Self {
        self.functions = functions;
        self
    }

    /// Replaces the recursion limit.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

impl Default for ExpressionParameters {
    fn default() -> Self {
        Self::new()
    }
}
