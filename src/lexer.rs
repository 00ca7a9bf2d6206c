//! # lexer.rs
//!
//! Splits an expression into a flat sequence of [`Token`]s.
//!
//! Besides recognizing lexemes the lexer resolves everything that only
//! needs local context:
//!
//! - radix literals (`0xFF`, `0b101`, `0755`) become plain numbers;
//! - a `-` after the start of input, an opening bracket, a comma or an
//!   operator becomes unary negation, a `+` in the same place is dropped;
//! - a number or closing bracket directly followed by a value gets an
//!   implicit `*` (`2x`, `(2)(3)`, `3pi`);
//! - `and`, `or`, `xor`, `not`, `nand` and `nor` are operators unless they
//!   are part of a longer identifier;
//! - an identifier followed by `(` is a built-in function when the name is
//!   known, otherwise a user function call whose argument count is taken
//!   from the text between the brackets;
//! - brackets must balance, and a closing bracket must match the kind of
//!   the innermost open one.

use log::trace;

use crate::error::{LexError, LexErrorKind};
use crate::functions;
use crate::operators::{BinaryOperatorKind, UnaryOperatorKind};
use crate::token::{Lexeme, Operator, Symbol, Token, TokenKind};

type CharIter<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

/// Multi-character operator spellings, longest first.
const LONG_OPERATORS: [(&str, Operator); 17] = [
    ("<=>", Operator::Binary(BinaryOperatorKind::Equality)),
    ("<->", Operator::Binary(BinaryOperatorKind::Equality)),
    (":=", Operator::Assign),
    ("+=", Operator::Binary(BinaryOperatorKind::AddAssign)),
    ("-=", Operator::Binary(BinaryOperatorKind::SubAssign)),
    ("*=", Operator::Binary(BinaryOperatorKind::MulAssign)),
    ("/=", Operator::Binary(BinaryOperatorKind::DivAssign)),
    ("++", Operator::Unary(UnaryOperatorKind::Increment)),
    ("--", Operator::Unary(UnaryOperatorKind::Decrement)),
    ("==", Operator::Binary(BinaryOperatorKind::Equal)),
    ("!=", Operator::Binary(BinaryOperatorKind::NotEqual)),
    ("<=", Operator::Binary(BinaryOperatorKind::LessOrEqual)),
    (">=", Operator::Binary(BinaryOperatorKind::GreaterOrEqual)),
    ("=>", Operator::Binary(BinaryOperatorKind::Implication)),
    ("->", Operator::Binary(BinaryOperatorKind::Implication)),
    ("&&", Operator::Binary(BinaryOperatorKind::ConditionalAnd)),
    ("||", Operator::Binary(BinaryOperatorKind::ConditionalOr)),
];

fn single_operator(ch: char) -> Option<Operator> {
    let op = match ch {
        '+' => Operator::Binary(BinaryOperatorKind::Add),
        '-' => Operator::Binary(BinaryOperatorKind::Sub),
        '*' => Operator::Binary(BinaryOperatorKind::Mul),
        '/' => Operator::Binary(BinaryOperatorKind::Div),
        '%' => Operator::Binary(BinaryOperatorKind::Mod),
        '^' => Operator::Binary(BinaryOperatorKind::Pow),
        '<' => Operator::Binary(BinaryOperatorKind::LessThan),
        '>' => Operator::Binary(BinaryOperatorKind::GreaterThan),
        '&' => Operator::Binary(BinaryOperatorKind::And),
        '|' => Operator::Binary(BinaryOperatorKind::Or),
        '!' => Operator::Unary(UnaryOperatorKind::Factorial),
        '~' => Operator::Unary(UnaryOperatorKind::Not),
        _ => return None,
    };
    Some(op)
}

fn word_operator(word: &str) -> Option<Operator> {
    let op = match word {
        "and" => Operator::Binary(BinaryOperatorKind::And),
        "or" => Operator::Binary(BinaryOperatorKind::Or),
        "xor" => Operator::Binary(BinaryOperatorKind::XOr),
        "nand" => Operator::Binary(BinaryOperatorKind::NAnd),
        "nor" => Operator::Binary(BinaryOperatorKind::NOr),
        "not" => Operator::Unary(UnaryOperatorKind::Not),
        _ => return None,
    };
    Some(op)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Whether the text after a postfix `++`/`--` can follow a complete
/// operand: end of input, a closing bracket, a comma or an operator.
///
/// Otherwise `x--2` would read as `(x--) 2` instead of `x - (-2)`.
fn can_follow_operand(rest: &str) -> bool {
    let rest = rest.trim_start();
    match rest.chars().next() {
        None => true,
        Some(ch) if is_ident_start(ch) => {
            let end = rest.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(rest.len());
            matches!(word_operator(&rest[..end]), Some(Operator::Binary(_)))
        },
        Some(ch) => !(ch.is_ascii_digit() || matches!(ch, '.' | '(' | '{' | '~')),
    }
}

/// Parses an identifier starting at `start_idx` and returns its end.
fn parse_ident(start_idx: usize, first: char, chars: &mut CharIter) -> usize {
    let mut end = start_idx + first.len_utf8();
    while let Some(&(idx, ch)) = chars.peek() {
        if ch.is_alphanumeric() || ch == '_' {
            chars.next();
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Consumes characters while `accept` holds and returns the end index.
fn take_while(mut end: usize, chars: &mut CharIter, accept: impl Fn(char) -> bool) -> usize {
    while let Some(&(idx, ch)) = chars.peek() {
        if accept(ch) {
            chars.next();
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn malformed(input: &str, span: std::ops::Range<usize>) -> LexError {
    LexError::new(LexErrorKind::MalformedNumber(input[span.clone()].to_string()), span.start)
}

/// Accumulates the digits of a radix literal into a double.
fn radix_value(digits: &str, radix: u32) -> f64 {
    digits.chars()
        .filter_map(|ch| ch.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64)
}

/// Parses `0x…` or `0b…` after the leading `0`. Returns `None` when the
/// prefix letter ends the input, in which case only the `0` is consumed.
fn parse_radix(
    input: &str,
    start_idx: usize,
    radix: u32,
    chars: &mut CharIter,
) -> Result<Option<(f64, usize)>, LexError> {
    let mut lookahead = chars.clone();
    let (prefix_idx, prefix) = match lookahead.next() {
        Some(next) => next,
        None => return Ok(None),
    };
    let digits_start = prefix_idx + prefix.len_utf8();
    match lookahead.peek() {
        None => return Ok(None),
        Some(&(_, ch)) if ch.is_digit(radix) => {},
        Some(&(idx, ch)) => return Err(malformed(input, start_idx..idx + ch.len_utf8())),
    }

    chars.next();
    let end = take_while(digits_start, chars, |ch| ch.is_digit(radix));
    let rejected = |ch: char| if radix == 16 { ch.is_alphanumeric() || ch == '.' } else { ch.is_ascii_digit() || ch == '.' };
    if let Some(&(idx, ch)) = chars.peek() {
        if rejected(ch) {
            return Err(malformed(input, start_idx..idx + ch.len_utf8()));
        }
    }
    Ok(Some((radix_value(&input[digits_start..end], radix), end)))
}

/// Parses a numeric literal starting at `start_idx` and returns its value
/// and end index.
fn parse_number(input: &str, start_idx: usize, first: char, chars: &mut CharIter) -> Result<(f64, usize), LexError> {
    if first == '0' {
        let radix = match chars.peek() {
            Some(&(_, 'x' | 'X')) => Some(16),
            Some(&(_, 'b' | 'B')) => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return match parse_radix(input, start_idx, radix, chars)? {
                Some(parsed) => Ok(parsed),
                None => Ok((0.0, start_idx + 1)),
            };
        }
    }

    let mut end = take_while(start_idx + 1, chars, |ch| ch.is_ascii_digit() || ch == '.');
    // exponent only when a digit follows directly, so `2e` stays `2 * e`
    let mut lookahead = chars.clone();
    if let (Some((_, 'e' | 'E')), Some((_, d))) = (lookahead.next(), lookahead.next()) {
        if d.is_ascii_digit() {
            chars.next();
            end = take_while(end + 1, chars, |ch| ch.is_ascii_digit());
        }
    }

    let text = &input[start_idx..end];
    let is_octal = text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| b.is_ascii_digit());
    if is_octal {
        if text.chars().any(|ch| !ch.is_digit(8)) {
            return Err(malformed(input, start_idx..end));
        }
        return Ok((radix_value(&text[1..], 8), end));
    }

    text.parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| malformed(input, start_idx..end))
}

/// Counts the top-level comma-separated items after the `(` at `open_idx`.
fn count_arguments(input: &str, open_idx: usize) -> usize {
    let mut depth = 0usize;
    let mut commas = 0;
    let mut empty = true;
    for ch in input[open_idx + 1..].chars() {
        match ch {
            '(' | '{' => depth += 1,
            ')' | '}' if depth == 0 => break,
            ')' | '}' => depth -= 1,
            ',' if depth == 0 => commas += 1,
            _ => {},
        }
        if !ch.is_whitespace() {
            empty = false;
        }
    }
    if empty { 0 } else { commas + 1 }
}

/// Position of the next non-whitespace character if it is `(`.
fn open_paren_after(input: &str, end: usize) -> Option<usize> {
    input[end..]
        .char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .filter(|(_, ch)| *ch == '(')
        .map(|(idx, _)| end + idx)
}

/// Token list under construction.
struct TokenStream {
    tokens: Vec<Token>,
    brackets: Vec<(Symbol, usize)>,
}

impl TokenStream {
    fn new() -> Self {
        Self { tokens: Vec::new(), brackets: Vec::new() }
    }

    /// `true` when the next `-` or `+` is a sign rather than a binary operator.
    fn expects_operand(&self) -> bool {
        self.tokens.last().map_or(true, |t| !t.ends_operand())
    }

    fn needs_implicit_multiplication(&self, next: &TokenKind) -> bool {
        let previous_allows = matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Number(_) | TokenKind::Symbol(Symbol::CloseParen | Symbol::CloseBrace))
        );
        let next_allows = matches!(
            next,
            TokenKind::Number(_) | TokenKind::Bool(_) | TokenKind::Variable(_)
                | TokenKind::Function(_) | TokenKind::UserFunction { .. }
                | TokenKind::Symbol(Symbol::OpenParen)
        );
        previous_allows && next_allows
    }

    fn push(&mut self, kind: TokenKind, lexeme: Lexeme) -> Result<(), LexError> {
        if self.needs_implicit_multiplication(&kind) {
            let at = lexeme.start();
            self.tokens.push(Token::new(
                TokenKind::Operator(Operator::Binary(BinaryOperatorKind::Mul)),
                Lexeme::new("*", at..at),
            ));
        }
        if let TokenKind::Symbol(symbol) = kind {
            self.track_bracket(symbol, lexeme.start())?;
        }
        self.tokens.push(Token::new(kind, lexeme));
        Ok(())
    }

    fn track_bracket(&mut self, symbol: Symbol, position: usize) -> Result<(), LexError> {
        let unbalanced = || LexError::new(LexErrorKind::UnbalancedBrackets, position);
        match symbol {
            Symbol::OpenParen | Symbol::OpenBrace => self.brackets.push((symbol, position)),
            Symbol::CloseParen => match self.brackets.pop() {
                Some((Symbol::OpenParen, _)) => {},
                _ => return Err(unbalanced()),
            },
            Symbol::CloseBrace => match self.brackets.pop() {
                Some((Symbol::OpenBrace, _)) => {},
                _ => return Err(unbalanced()),
            },
            Symbol::Comma => {},
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<Token>, LexError> {
        if let Some(&(_, position)) = self.brackets.last() {
            return Err(LexError::new(LexErrorKind::UnbalancedBrackets, position));
        }
        Ok(self.tokens)
    }
}

/// Splits `input` into tokens.
///
/// # Errors
///
/// Returns a [`LexError`] for empty input, an unknown character, a
/// malformed number or unbalanced brackets.
///
/// # Examples
///
/// ```
/// use symcalc::lexer::tokenize;
///
/// let tokens = tokenize("2x + 1").unwrap();
/// assert_eq!(tokens.len(), 5); // 2 * x + 1
/// ```
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    if input.trim().is_empty() {
        return Err(LexError::new(LexErrorKind::EmptyInput, 0));
    }

    let mut stream = TokenStream::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start_idx, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            let (value, end) = parse_number(input, start_idx, ch, &mut chars)?;
            stream.push(TokenKind::Number(value), Lexeme::new(&input[start_idx..end], start_idx..end))?;
            continue;
        }

        if is_ident_start(ch) {
            let end = parse_ident(start_idx, ch, &mut chars);
            let word = &input[start_idx..end];
            let kind = if let Some(op) = word_operator(word) {
                TokenKind::Operator(op)
            } else if word == "true" || word == "false" {
                TokenKind::Bool(word == "true")
            } else if let Some(open_idx) = open_paren_after(input, end) {
                match functions::lookup(word) {
                    Some(id) => TokenKind::Function(id),
                    None => TokenKind::UserFunction {
                        name: word.to_string(),
                        arg_count: count_arguments(input, open_idx),
                    },
                }
            } else {
                TokenKind::Variable(word.to_string())
            };
            stream.push(kind, Lexeme::new(word, start_idx..end))?;
            continue;
        }

        let symbol = match ch {
            '(' => Some(Symbol::OpenParen),
            ')' => Some(Symbol::CloseParen),
            '{' => Some(Symbol::OpenBrace),
            '}' => Some(Symbol::CloseBrace),
            ',' => Some(Symbol::Comma),
            _ => None,
        };
        if let Some(symbol) = symbol {
            let end = start_idx + 1;
            stream.push(TokenKind::Symbol(symbol), Lexeme::new(&input[start_idx..end], start_idx..end))?;
            continue;
        }

        let rest = &input[start_idx..];
        let long = LONG_OPERATORS.iter().find(|(text, op)| {
            let postfix_step = matches!(op, Operator::Unary(UnaryOperatorKind::Increment | UnaryOperatorKind::Decrement));
            let after_variable = matches!(stream.tokens.last().map(|t| &t.kind), Some(TokenKind::Variable(_)));
            rest.starts_with(*text)
                && (!postfix_step || (after_variable && can_follow_operand(&rest[text.len()..])))
        });
        let (op, end) = match long {
            Some((text, op)) => {
                for _ in 1..text.chars().count() {
                    chars.next();
                }
                (*op, start_idx + text.len())
            },
            None => match single_operator(ch) {
                Some(op) => (op, start_idx + ch.len_utf8()),
                None => return Err(LexError::new(LexErrorKind::UnexpectedCharacter(ch), start_idx)),
            },
        };

        let op = match op {
            Operator::Binary(BinaryOperatorKind::Add) if stream.expects_operand() => continue,
            Operator::Binary(BinaryOperatorKind::Sub) if stream.expects_operand()
                => Operator::Unary(UnaryOperatorKind::Negate),
            op => op,
        };
        stream.push(TokenKind::Operator(op), Lexeme::new(&input[start_idx..end], start_idx..end))?;
    }

    let tokens = stream.finish()?;
    trace!("tokens: {:?}", tokens.iter().map(|t| t.lexeme.text()).collect::<Vec<_>>());
    Ok(tokens)
}
