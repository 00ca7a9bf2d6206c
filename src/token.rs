//! # token.rs
//!
//! Tokens produced by the lexer and consumed by the parser.
//!
//! A [`Token`] pairs a [`TokenKind`] with the [`Lexeme`] it was read from,
//! so that the parser can report the text and position of whatever it
//! could not accept.

use std::ops::Range;

use crate::functions::FunctionId;
use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};

/// A slice of the source text together with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    text: String,
    span: Range<usize>,
}

impl Lexeme {
    /// Create a new `Lexeme`.
    pub fn new(text: &str, span: Range<usize>) -> Self {
        Self { text: text.to_string(), span }
    }

    /// Returns the text slice of the lexeme.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the start index of the lexeme in the original input string.
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Returns the span of the lexeme in the original input string.
    pub fn span(&self) -> &Range<usize> {
        &self.span
    }
}

impl std::fmt::Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{name} [{start}, {end})", name = self.text, start = self.span.start, end = self.span.end)
    }
}

/// Operator tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Unary(UnaryOperatorKind),
    Binary(BinaryOperatorKind),
    /// `:=`
    Assign,
}

/// Punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
}

impl Symbol {
    /// Returns the source spelling of the symbol.
    pub fn as_char(&self) -> char {
        match self {
            Self::OpenParen => '(',
            Self::CloseParen => ')',
            Self::OpenBrace => '{',
            Self::CloseBrace => '}',
            Self::Comma => ',',
        }
    }
}

/// What a token stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Bool(bool),
    Variable(String),
    Operator(Operator),
    /// A built-in function or construct. The lexer only emits it when the
    /// name is followed by `(`.
    Function(FunctionId),
    /// A call to a name that is not built in. `arg_count` is the number of
    /// top-level comma-separated items between the brackets.
    UserFunction { name: String, arg_count: usize },
    Symbol(Symbol),
}

/// A token with the source text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Lexeme,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: Lexeme) -> Self {
        Self { kind, lexeme }
    }

    /// Contribution of the token to the bracket nesting depth: `1` for an
    /// opening bracket, `-1` for a closing one and `0` otherwise.
    pub fn priority(&self) -> i32 {
        match self.kind {
            TokenKind::Symbol(Symbol::OpenParen | Symbol::OpenBrace) => 1,
            TokenKind::Symbol(Symbol::CloseParen | Symbol::CloseBrace) => -1,
            _ => 0,
        }
    }

    /// Returns `true` when the token ends an operand, so that a following
    /// value needs an implicit `*` and a following `-` is a subtraction.
    pub fn ends_operand(&self) -> bool {
        match &self.kind {
            TokenKind::Number(_) | TokenKind::Bool(_) | TokenKind::Variable(_) => true,
            TokenKind::Symbol(Symbol::CloseParen | Symbol::CloseBrace) => true,
            TokenKind::Operator(Operator::Unary(op)) => op.fixity() == crate::operators::Fixity::Postfix,
            _ => false,
        }
    }

    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Symbol(symbol)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme.text())
    }
}
