//! Top-level functions module.
//!
//! This module declares every built-in function the engine knows and
//! groups their implementations:
//!
//! - `scalar`: real and complex elementary functions (trigonometric
//!   functions honour the angle unit).
//! - `matrix`: vector and matrix operations.
//! - `statistical`: N-ary aggregates over numbers or a single vector.
//!
//! Names are resolved through a static `phf` table that maps every
//! spelling, including the short aliases (`sh`, `tg`, `arsh`, ...), to
//! one [`FunctionId`].

pub(crate) mod matrix;
pub(crate) mod scalar;
pub(crate) mod statistical;

use phf::Map;
use phf_macros::phf_map;

use crate::error::ExecutionError;
use crate::value::{AngleUnit, Value};

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// Between `min` and `max` arguments, inclusive.
    Range(usize, usize),
    /// `n` or more arguments.
    AtLeast(usize),
}

impl Arity {
    /// Returns `true` when `count` arguments are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => (min..=max).contains(&count),
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::Range(min, max) => write!(f, "{}..{}", min, max),
            Self::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[doc(hidden)]
/// Internal macro for defining built-in mathematical functions.
///
/// Each function declares:
///   - The enum variant name
///   - Its canonical string name (used by the formatters)
///   - The number of arguments it takes
///
/// Aliases are listed separately in [`FUNCTION_NAMES`].
macro_rules! functions {
    ($( $variant:ident => { name: $name:expr, arity: $arity:expr }, )*) => {
        /// Represents a built-in mathematical function.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FunctionKind {
            $( $variant, )*
        }

        impl FunctionKind {
            /// Returns the canonical name of the function.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            /// Returns how many arguments the function takes.
            pub fn arity(&self) -> Arity {
                match self {
                    $( Self::$variant => $arity, )*
                }
            }

            /// Returns a list of all canonical function names.
            pub fn names() -> Vec<&'static str> {
                vec![$($name),*]
            }
        }

        impl std::fmt::Display for FunctionKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

functions! {
    Abs        => { name: "abs",        arity: Arity::Exact(1) },
    Sqrt       => { name: "sqrt",       arity: Arity::Exact(1) },
    Root       => { name: "root",       arity: Arity::Exact(2) },
    Exp        => { name: "exp",        arity: Arity::Exact(1) },
    Ln         => { name: "ln",         arity: Arity::Exact(1) },
    Lg         => { name: "lg",         arity: Arity::Exact(1) },
    Lb         => { name: "lb",         arity: Arity::Exact(1) },
    Log        => { name: "log",        arity: Arity::Exact(2) },
    Ceil       => { name: "ceil",       arity: Arity::Exact(1) },
    Floor      => { name: "floor",      arity: Arity::Exact(1) },
    Round      => { name: "round",      arity: Arity::Range(1, 2) },
    Gcd        => { name: "gcd",        arity: Arity::AtLeast(2) },
    Lcm        => { name: "lcm",        arity: Arity::AtLeast(2) },
    Sin        => { name: "sin",        arity: Arity::Exact(1) },
    Cos        => { name: "cos",        arity: Arity::Exact(1) },
    Tan        => { name: "tan",        arity: Arity::Exact(1) },
    Cot        => { name: "cot",        arity: Arity::Exact(1) },
    Sec        => { name: "sec",        arity: Arity::Exact(1) },
    Csc        => { name: "csc",        arity: Arity::Exact(1) },
    Arcsin     => { name: "arcsin",     arity: Arity::Exact(1) },
    Arccos     => { name: "arccos",     arity: Arity::Exact(1) },
    Arctan     => { name: "arctan",     arity: Arity::Exact(1) },
    Arccot     => { name: "arccot",     arity: Arity::Exact(1) },
    Arcsec     => { name: "arcsec",     arity: Arity::Exact(1) },
    Arccsc     => { name: "arccsc",     arity: Arity::Exact(1) },
    Sinh       => { name: "sinh",       arity: Arity::Exact(1) },
    Cosh       => { name: "cosh",       arity: Arity::Exact(1) },
    Tanh       => { name: "tanh",       arity: Arity::Exact(1) },
    Coth       => { name: "coth",       arity: Arity::Exact(1) },
    Sech       => { name: "sech",       arity: Arity::Exact(1) },
    Csch       => { name: "csch",       arity: Arity::Exact(1) },
    Arsinh     => { name: "arsinh",     arity: Arity::Exact(1) },
    Arcosh     => { name: "arcosh",     arity: Arity::Exact(1) },
    Artanh     => { name: "artanh",     arity: Arity::Exact(1) },
    Arcoth     => { name: "arcoth",     arity: Arity::Exact(1) },
    Arsech     => { name: "arsech",     arity: Arity::Exact(1) },
    Arcsch     => { name: "arcsch",     arity: Arity::Exact(1) },
    Re         => { name: "re",         arity: Arity::Exact(1) },
    Im         => { name: "im",         arity: Arity::Exact(1) },
    Phase      => { name: "phase",      arity: Arity::Exact(1) },
    Conjugate  => { name: "conjugate",  arity: Arity::Exact(1) },
    Reciprocal => { name: "reciprocal", arity: Arity::Exact(1) },
    Transpose  => { name: "transpose",  arity: Arity::Exact(1) },
    Determinant => { name: "det",       arity: Arity::Exact(1) },
    Inverse    => { name: "inverse",    arity: Arity::Exact(1) },
    Sum        => { name: "sum",        arity: Arity::AtLeast(1) },
    Product    => { name: "product",    arity: Arity::AtLeast(1) },
    Avg        => { name: "avg",        arity: Arity::AtLeast(1) },
    Min        => { name: "min",        arity: Arity::AtLeast(1) },
    Max        => { name: "max",        arity: Arity::AtLeast(1) },
    Count      => { name: "count",      arity: Arity::AtLeast(1) },
    Var        => { name: "var",        arity: Arity::AtLeast(1) },
    Varp       => { name: "varp",       arity: Arity::AtLeast(1) },
    Stdev      => { name: "stdev",      arity: Arity::AtLeast(1) },
    Stdevp     => { name: "stdevp",     arity: Arity::AtLeast(1) },
}

impl FunctionKind {
    /// Returns `true` for the trigonometric functions whose argument is an angle.
    pub fn takes_angle(&self) -> bool {
        matches!(self, Self::Sin | Self::Cos | Self::Tan | Self::Cot | Self::Sec | Self::Csc)
    }

    /// Returns `true` for the inverse trigonometric functions whose result is an angle.
    pub fn returns_angle(&self) -> bool {
        matches!(self,
            Self::Arcsin | Self::Arccos | Self::Arctan | Self::Arccot | Self::Arcsec | Self::Arccsc)
    }

    /// Returns `true` for the N-ary statistical aggregates.
    pub fn is_statistical(&self) -> bool {
        matches!(self,
            Self::Sum | Self::Product | Self::Avg | Self::Min | Self::Max | Self::Count
            | Self::Var | Self::Varp | Self::Stdev | Self::Stdevp)
    }
}

/// Built-in call forms that are not plain functions: programming
/// constructs and meta-operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    If,
    For,
    While,
    Define,
    Undefine,
    Derivative,
    Simplify,
    Factorial,
}

impl Construct {
    /// Returns the canonical name of the construct.
    pub fn name(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::For => "for",
            Self::While => "while",
            Self::Define => "def",
            Self::Undefine => "undef",
            Self::Derivative => "deriv",
            Self::Simplify => "simplify",
            Self::Factorial => "fact",
        }
    }

    /// Returns how many arguments the construct takes.
    pub fn arity(&self) -> Arity {
        match self {
            Self::If => Arity::Range(2, 3),
            Self::For => Arity::Exact(4),
            Self::While => Arity::Exact(2),
            Self::Define => Arity::Exact(2),
            Self::Undefine => Arity::Exact(1),
            Self::Derivative => Arity::Range(1, 3),
            Self::Simplify => Arity::Exact(1),
            Self::Factorial => Arity::Exact(1),
        }
    }
}

/// Identifier of any built-in call form recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionId {
    Function(FunctionKind),
    Construct(Construct),
}

impl FunctionId {
    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Function(kind) => kind.name(),
            Self::Construct(construct) => construct.name(),
        }
    }

    /// Returns how many arguments the call accepts.
    pub fn arity(&self) -> Arity {
        match self {
            Self::Function(kind) => kind.arity(),
            Self::Construct(construct) => construct.arity(),
        }
    }
}

/// Map of every built-in function spelling to its identifier.
static FUNCTION_NAMES: Map<&'static str, FunctionId> = phf_map! {
    "abs" => FunctionId::Function(FunctionKind::Abs),
    "sqrt" => FunctionId::Function(FunctionKind::Sqrt),
    "root" => FunctionId::Function(FunctionKind::Root),
    "exp" => FunctionId::Function(FunctionKind::Exp),
    "ln" => FunctionId::Function(FunctionKind::Ln),
    "lg" => FunctionId::Function(FunctionKind::Lg),
    "lb" => FunctionId::Function(FunctionKind::Lb),
    "log2" => FunctionId::Function(FunctionKind::Lb),
    "log" => FunctionId::Function(FunctionKind::Log),
    "ceil" => FunctionId::Function(FunctionKind::Ceil),
    "floor" => FunctionId::Function(FunctionKind::Floor),
    "round" => FunctionId::Function(FunctionKind::Round),
    "gcd" => FunctionId::Function(FunctionKind::Gcd),
    "lcm" => FunctionId::Function(FunctionKind::Lcm),
    "sin" => FunctionId::Function(FunctionKind::Sin),
    "cos" => FunctionId::Function(FunctionKind::Cos),
    "tan" => FunctionId::Function(FunctionKind::Tan),
    "tg" => FunctionId::Function(FunctionKind::Tan),
    "cot" => FunctionId::Function(FunctionKind::Cot),
    "ctg" => FunctionId::Function(FunctionKind::Cot),
    "sec" => FunctionId::Function(FunctionKind::Sec),
    "csc" => FunctionId::Function(FunctionKind::Csc),
    "cosec" => FunctionId::Function(FunctionKind::Csc),
    "arcsin" => FunctionId::Function(FunctionKind::Arcsin),
    "arccos" => FunctionId::Function(FunctionKind::Arccos),
    "arctan" => FunctionId::Function(FunctionKind::Arctan),
    "arctg" => FunctionId::Function(FunctionKind::Arctan),
    "arccot" => FunctionId::Function(FunctionKind::Arccot),
    "arcctg" => FunctionId::Function(FunctionKind::Arccot),
    "arcsec" => FunctionId::Function(FunctionKind::Arcsec),
    "arccsc" => FunctionId::Function(FunctionKind::Arccsc),
    "arccosec" => FunctionId::Function(FunctionKind::Arccsc),
    "sinh" => FunctionId::Function(FunctionKind::Sinh),
    "sh" => FunctionId::Function(FunctionKind::Sinh),
    "cosh" => FunctionId::Function(FunctionKind::Cosh),
    "ch" => FunctionId::Function(FunctionKind::Cosh),
    "tanh" => FunctionId::Function(FunctionKind::Tanh),
    "th" => FunctionId::Function(FunctionKind::Tanh),
    "coth" => FunctionId::Function(FunctionKind::Coth),
    "cth" => FunctionId::Function(FunctionKind::Coth),
    "sech" => FunctionId::Function(FunctionKind::Sech),
    "csch" => FunctionId::Function(FunctionKind::Csch),
    "arsinh" => FunctionId::Function(FunctionKind::Arsinh),
    "arsh" => FunctionId::Function(FunctionKind::Arsinh),
    "arcosh" => FunctionId::Function(FunctionKind::Arcosh),
    "arch" => FunctionId::Function(FunctionKind::Arcosh),
    "artanh" => FunctionId::Function(FunctionKind::Artanh),
    "arth" => FunctionId::Function(FunctionKind::Artanh),
    "arcoth" => FunctionId::Function(FunctionKind::Arcoth),
    "arcth" => FunctionId::Function(FunctionKind::Arcoth),
    "arsech" => FunctionId::Function(FunctionKind::Arsech),
    "arsch" => FunctionId::Function(FunctionKind::Arsech),
    "arcsch" => FunctionId::Function(FunctionKind::Arcsch),
    "re" => FunctionId::Function(FunctionKind::Re),
    "im" => FunctionId::Function(FunctionKind::Im),
    "phase" => FunctionId::Function(FunctionKind::Phase),
    "conjugate" => FunctionId::Function(FunctionKind::Conjugate),
    "reciprocal" => FunctionId::Function(FunctionKind::Reciprocal),
    "transpose" => FunctionId::Function(FunctionKind::Transpose),
    "det" => FunctionId::Function(FunctionKind::Determinant),
    "determinant" => FunctionId::Function(FunctionKind::Determinant),
    "inverse" => FunctionId::Function(FunctionKind::Inverse),
    "sum" => FunctionId::Function(FunctionKind::Sum),
    "product" => FunctionId::Function(FunctionKind::Product),
    "avg" => FunctionId::Function(FunctionKind::Avg),
    "min" => FunctionId::Function(FunctionKind::Min),
    "max" => FunctionId::Function(FunctionKind::Max),
    "count" => FunctionId::Function(FunctionKind::Count),
    "var" => FunctionId::Function(FunctionKind::Var),
    "varp" => FunctionId::Function(FunctionKind::Varp),
    "stdev" => FunctionId::Function(FunctionKind::Stdev),
    "stdevp" => FunctionId::Function(FunctionKind::Stdevp),
    "if" => FunctionId::Construct(Construct::If),
    "for" => FunctionId::Construct(Construct::For),
    "while" => FunctionId::Construct(Construct::While),
    "def" => FunctionId::Construct(Construct::Define),
    "define" => FunctionId::Construct(Construct::Define),
    "undef" => FunctionId::Construct(Construct::Undefine),
    "undefine" => FunctionId::Construct(Construct::Undefine),
    "deriv" => FunctionId::Construct(Construct::Derivative),
    "simplify" => FunctionId::Construct(Construct::Simplify),
    "fact" => FunctionId::Construct(Construct::Factorial),
};

/// Looks up a built-in function by any of its spellings.
pub fn lookup(name: &str) -> Option<FunctionId> {
    FUNCTION_NAMES.get(name).copied()
}

/// Returns every recognized function spelling, aliases included.
pub fn names() -> Vec<&'static str> {
    FUNCTION_NAMES.keys().cloned().collect()
}

/// Applies a built-in function to already evaluated arguments.
///
/// The parser guarantees the argument count matches [`FunctionKind::arity`].
pub(crate) fn apply(kind: FunctionKind, args: &[Value], angle: AngleUnit) -> Result<Value, ExecutionError> {
    use FunctionKind::*;
    match kind {
        Transpose | Determinant | Inverse => matrix::apply(kind, &args[0]),
        _ if kind.is_statistical() => statistical::apply(kind, args),
        _ => scalar::apply(kind, args, angle),
    }
}
