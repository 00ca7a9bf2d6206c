//! # operators.rs
//!
//! Unary and binary operator kinds shared by the lexer, the parser and
//! every analyzer.
//!
//! Each operator is declared once in a macro table that records its
//! source symbol, its LaTeX spelling, its precedence and its
//! associativity. Precedence grows with binding strength:
//!
//! | level | operators                                   |
//! |-------|---------------------------------------------|
//! | 1     | `:=` `+=` `-=` `*=` `/=` (right assoc)      |
//! | 2     | `=>` `<=>`                                  |
//! | 3     | `or` `xor` `nor` `\|\|`                     |
//! | 4     | `and` `nand` `&&`                           |
//! | 5     | `==` `!=` `<` `<=` `>` `>=`                 |
//! | 6     | `+` `-`                                     |
//! | 7     | `*` `/` `%`                                 |
//! | 8     | prefix `-` and `not`                        |
//! | 9     | `^` (right assoc)                           |
//! | 10    | postfix `!` `++` `--`                       |

/// Precedence of `:=` and the compound assignments.
pub const ASSIGNMENT_PRECEDENCE: u8 = 1;

/// Precedence of prefix operators.
pub const PREFIX_PRECEDENCE: u8 = 8;

/// Precedence of postfix operators.
pub const POSTFIX_PRECEDENCE: u8 = 10;

/// Whether a unary operator is written before or after its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
}

#[doc(hidden)]
/// Internal macro to define all unary operators.
macro_rules! unary_operator_kinds {
    ($($name:ident => { symbol: $symbol:expr, latex: $latex:expr, fixity: $fixity:ident }),* $(,)?) => {
        /// Represents a unary operator in a mathematical expression.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum UnaryOperatorKind {
            $($name),*
        }

        impl UnaryOperatorKind {
            /// Returns the source spelling of the operator.
            pub fn symbol(&self) -> &'static str {
                match self {
                    $( Self::$name => $symbol, )*
                }
            }

            /// Returns the LaTeX spelling of the operator.
            pub fn latex(&self) -> &'static str {
                match self {
                    $( Self::$name => $latex, )*
                }
            }

            /// Returns whether the operator precedes or follows its operand.
            pub fn fixity(&self) -> Fixity {
                match self {
                    $( Self::$name => Fixity::$fixity, )*
                }
            }

            /// Returns a list of all supported unary operator symbols.
            pub fn names() -> Vec<&'static str> {
                vec![$($symbol),*]
            }
        }
    };
}

unary_operator_kinds! {
    Negate    => { symbol: "-",   latex: "-",      fixity: Prefix },
    Not       => { symbol: "not", latex: "\\neg ", fixity: Prefix },
    Factorial => { symbol: "!",   latex: "!",      fixity: Postfix },
    Increment => { symbol: "++",  latex: "++",     fixity: Postfix },
    Decrement => { symbol: "--",  latex: "--",     fixity: Postfix },
}

impl UnaryOperatorKind {
    /// Returns the binding strength of the operator.
    pub fn precedence(&self) -> u8 {
        match self.fixity() {
            Fixity::Prefix => PREFIX_PRECEDENCE,
            Fixity::Postfix => POSTFIX_PRECEDENCE,
        }
    }
}

impl std::fmt::Display for UnaryOperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Information about a binary operator in a mathematical expression.
///
/// Contains the operator's precedence and associativity, which are used
/// when parsing expressions to determine the order of operations and when
/// rendering them to decide where parentheses are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOperatorInfo {
    /// Operator precedence (higher value means higher precedence).
    pub precedence: u8,

    /// Whether the operator is left-associative.
    pub is_left_assoc: bool,
}

#[doc(hidden)]
/// Internal macro to define all binary operators.
///
/// It centralizes the enum variants, string representation, precedence and associativity.
macro_rules! binary_operator_kinds {
    ($($name:ident => {
        symbol: $symbol:expr,
        latex: $latex:expr,
        precedence: $prec:expr,
        left_assoc: $assoc:expr
    }),* $(,)?) => {
        /// Represents a binary operator in a mathematical expression.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BinaryOperatorKind {
            $($name),*
        }

        impl BinaryOperatorKind {
            /// Returns operator precedence and associativity.
            pub fn info(&self) -> BinaryOperatorInfo {
                match self {
                    $(Self::$name => BinaryOperatorInfo { precedence: $prec, is_left_assoc: $assoc },)*
                }
            }

            /// Returns the source spelling of the operator.
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Self::$name => $symbol,)*
                }
            }

            /// Returns the LaTeX spelling of the operator.
            pub fn latex(&self) -> &'static str {
                match self {
                    $(Self::$name => $latex,)*
                }
            }

            /// Returns a list of all supported binary operator symbols.
            pub fn names() -> Vec<&'static str> {
                vec![$($symbol),*]
            }
        }
    };
}

binary_operator_kinds! {
    Add            => { symbol: "+",    latex: "+",                  precedence: 6, left_assoc: true },
    Sub            => { symbol: "-",    latex: "-",                  precedence: 6, left_assoc: true },
    Mul            => { symbol: "*",    latex: "\\cdot",             precedence: 7, left_assoc: true },
    Div            => { symbol: "/",    latex: "/",                  precedence: 7, left_assoc: true },
    Mod            => { symbol: "%",    latex: "\\bmod",             precedence: 7, left_assoc: true },
    Pow            => { symbol: "^",    latex: "^",                  precedence: 9, left_assoc: false },
    And            => { symbol: "and",  latex: "\\land",             precedence: 4, left_assoc: true },
    NAnd           => { symbol: "nand", latex: "\\uparrow",          precedence: 4, left_assoc: true },
    Or             => { symbol: "or",   latex: "\\lor",              precedence: 3, left_assoc: true },
    NOr            => { symbol: "nor",  latex: "\\downarrow",        precedence: 3, left_assoc: true },
    XOr            => { symbol: "xor",  latex: "\\oplus",            precedence: 3, left_assoc: true },
    Implication    => { symbol: "=>",   latex: "\\Rightarrow",       precedence: 2, left_assoc: true },
    Equality       => { symbol: "<=>",  latex: "\\Leftrightarrow",   precedence: 2, left_assoc: true },
    ConditionalAnd => { symbol: "&&",   latex: "\\&\\&",             precedence: 4, left_assoc: true },
    ConditionalOr  => { symbol: "||",   latex: "\\|",                precedence: 3, left_assoc: true },
    Equal          => { symbol: "==",   latex: "=",                  precedence: 5, left_assoc: true },
    NotEqual       => { symbol: "!=",   latex: "\\neq",              precedence: 5, left_assoc: true },
    LessThan       => { symbol: "<",    latex: "<",                  precedence: 5, left_assoc: true },
    LessOrEqual    => { symbol: "<=",   latex: "\\leq",              precedence: 5, left_assoc: true },
    GreaterThan    => { symbol: ">",    latex: ">",                  precedence: 5, left_assoc: true },
    GreaterOrEqual => { symbol: ">=",   latex: "\\geq",              precedence: 5, left_assoc: true },
    AddAssign      => { symbol: "+=",   latex: "\\mathrel{+}=",      precedence: 1, left_assoc: false },
    SubAssign      => { symbol: "-=",   latex: "\\mathrel{-}=",      precedence: 1, left_assoc: false },
    MulAssign      => { symbol: "*=",   latex: "\\mathrel{*}=",      precedence: 1, left_assoc: false },
    DivAssign      => { symbol: "/=",   latex: "\\mathrel{/}=",      precedence: 1, left_assoc: false },
}

impl BinaryOperatorKind {
    /// Returns `true` for `+=`, `-=`, `*=` and `/=`.
    pub fn is_compound_assignment(&self) -> bool {
        matches!(self, Self::AddAssign | Self::SubAssign | Self::MulAssign | Self::DivAssign)
    }

    /// Returns the arithmetic operator a compound assignment applies.
    pub fn assignment_operator(&self) -> Option<Self> {
        match self {
            Self::AddAssign => Some(Self::Add),
            Self::SubAssign => Some(Self::Sub),
            Self::MulAssign => Some(Self::Mul),
            Self::DivAssign => Some(Self::Div),
            _ => None,
        }
    }
}

impl std::fmt::Display for BinaryOperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
