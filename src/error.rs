//! # error.rs
//!
//! Error types reported by every stage of the engine.
//!
//! Lexing and parsing failures carry the byte offset of the offending
//! lexeme so that a host can point at it. Execution failures abort the
//! whole evaluation and describe the failing operation.

use thiserror::Error;

/// What went wrong while splitting the input into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexErrorKind {
    #[error("the expression is empty")]
    EmptyInput,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("brackets are not balanced")]
    UnbalancedBrackets,
    #[error("malformed number literal '{0}'")]
    MalformedNumber(String),
}

/// Error produced by the lexer.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("lexer error at {position}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    /// Byte offset into the source text.
    pub position: usize,
}

impl LexError {
    pub(crate) fn new(kind: LexErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// What went wrong while building the tree from tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("missing operand for '{0}'")]
    MissingOperand(String),
    #[error("brackets are not balanced")]
    UnbalancedBrackets,
    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch { name: String, expected: String, found: usize },
    #[error("'{0}' cannot be assigned to")]
    InvalidAssignmentTarget(String),
    #[error("matrix rows must all have the same length")]
    RaggedMatrix,
    #[error("expression nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}

/// Error produced by the parser.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parser error at {position}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset of the token where parsing stopped.
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Failure of the symbolic differentiator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DifferentiationError {
    /// The node depends on the variable but has no calculus rule.
    #[error("'{0}' cannot be differentiated")]
    NotDifferentiable(String),
}

/// Failure of the simplifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplifyError {
    #[error("simplification did not reach a fixed point within {0} passes")]
    IterationLimit(usize),
}

/// Failure while editing a parameter collection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParametersError {
    #[error("constant '{0}' is already defined")]
    ConstantRedefinition(String),
    #[error("parameter '{0}' is read-only")]
    ReadOnly(String),
}

/// Failure while executing an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("type mismatch in '{operation}': unsupported {found}")]
    TypeMismatch { operation: String, found: String },
    #[error("variable '{0}' is not defined")]
    UndefinedVariable(String),
    #[error("function '{name}' with {arity} parameter(s) is not defined")]
    UndefinedFunction { name: String, arity: usize },
    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch { name: String, expected: usize, found: usize },
    #[error("domain error: {0}")]
    DomainError(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("parameter '{0}' is read-only")]
    ReadOnlyParameter(String),
    #[error("recursion limit of {0} nested calls exceeded")]
    RecursionLimitExceeded(usize),
    #[error(transparent)]
    Differentiation(#[from] DifferentiationError),
    #[error(transparent)]
    Simplify(#[from] SimplifyError),
}

impl From<ParametersError> for ExecutionError {
    fn from(err: ParametersError) -> Self {
        match err {
            ParametersError::ConstantRedefinition(name) | ParametersError::ReadOnly(name)
                => ExecutionError::ReadOnlyParameter(name),
        }
    }
}

/// Any error the crate can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Differentiation(#[from] DifferentiationError),
    #[error(transparent)]
    Simplify(#[from] SimplifyError),
    #[error(transparent)]
    Parameters(#[from] ParametersError),
}
