//! # parser.rs
//!
//! Builds an [`Expression`] tree from the token stream of the lexer.
//!
//! Operators are parsed by precedence climbing over the table in
//! [`crate::operators`]; function calls, bracketed sub-expressions and
//! vector/matrix literals are handled by explicit recursive rules.
//!
//! # Notes
//! - Prefix operators bind weaker than `^`, so `-x^2` is `-(x^2)`.
//! - Postfix operators bind to the operand directly before them.
//! - `:=` and the compound assignments are right-associative and only
//!   accept a variable (or, for `:=`, a user-function head) on the left.
//! - The argument count of every built-in call is checked here; user
//!   function calls are checked when executed.

use log::debug;

use crate::error::{ParseError, ParseErrorKind};
use crate::expression::Expression;
use crate::functions::{Construct, FunctionId};
use crate::operators::{Fixity, UnaryOperatorKind, ASSIGNMENT_PRECEDENCE, PREFIX_PRECEDENCE};
use crate::token::{Operator, Symbol, Token, TokenKind};

/// Maximum nesting depth of sub-expressions.
pub const MAX_NESTING: usize = 256;

/// Variable `deriv(f)` differentiates with respect to.
pub const DEFAULT_DERIVATIVE_VARIABLE: &str = "x";

/// Parses a complete token stream into an expression tree.
///
/// # Parameters
/// - `tokens`: Tokens as produced by [`crate::lexer::tokenize`].
///
/// # Returns
/// - `Ok(Expression)` representing the root of the tree.
/// - `Err(ParseError)` if the stream is empty, ends inside an expression,
///   contains a token where a value is expected, calls a built-in with the
///   wrong number of arguments or nests deeper than [`MAX_NESTING`].
pub fn parse(tokens: &[Token]) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression(0)?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(ParseErrorKind::UnexpectedToken(token.lexeme.text().to_string()), token));
    }
    debug!("parsed: {}", expr);
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset just past the last token.
    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.lexeme.span().end)
    }

    fn error_at(&self, kind: ParseErrorKind, token: &Token) -> ParseError {
        ParseError::new(kind, token.lexeme.start())
    }

    fn unexpected_end(&self) -> ParseError {
        ParseError::new(ParseErrorKind::UnexpectedEnd, self.end_position())
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token.is_symbol(symbol) => Ok(()),
            Some(token) => Err(self.error_at(ParseErrorKind::UnexpectedToken(token.lexeme.text().to_string()), token)),
            None if matches!(symbol, Symbol::CloseParen | Symbol::CloseBrace)
                => Err(ParseError::new(ParseErrorKind::UnbalancedBrackets, self.end_position())),
            None => Err(self.unexpected_end()),
        }
    }

    /// `true` if the next token can begin an operand.
    fn at_operand(&self) -> bool {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Number(_) | TokenKind::Bool(_) | TokenKind::Variable(_)) => true,
            Some(TokenKind::Function(_) | TokenKind::UserFunction { .. }) => true,
            Some(TokenKind::Symbol(Symbol::OpenParen | Symbol::OpenBrace)) => true,
            Some(TokenKind::Operator(Operator::Unary(op))) => op.fixity() == Fixity::Prefix,
            _ => false,
        }
    }

    /// Parses operators whose precedence is at least `min_precedence`.
    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let position = self.peek().map_or(self.end_position(), |t| t.lexeme.start());
            return Err(ParseError::new(ParseErrorKind::NestingTooDeep(MAX_NESTING), position));
        }
        let result = self.parse_binary(min_precedence);
        self.depth -= 1;
        result
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while let Some(token) = self.peek() {
            let (precedence, is_left_assoc) = match &token.kind {
                TokenKind::Operator(Operator::Binary(op)) => {
                    let info = op.info();
                    (info.precedence, info.is_left_assoc)
                },
                TokenKind::Operator(Operator::Assign) => (ASSIGNMENT_PRECEDENCE, false),
                _ => break,
            };
            if precedence < min_precedence {
                break;
            }
            self.next();

            if !self.at_operand() {
                return Err(match self.peek() {
                    Some(next) => self.error_at(ParseErrorKind::MissingOperand(token.lexeme.text().to_string()), next),
                    None => ParseError::new(
                        ParseErrorKind::MissingOperand(token.lexeme.text().to_string()),
                        self.end_position(),
                    ),
                });
            }
            let next_min = if is_left_assoc { precedence + 1 } else { precedence };
            let right = self.parse_expression(next_min)?;

            left = match &token.kind {
                TokenKind::Operator(Operator::Binary(op)) => {
                    if op.is_compound_assignment() && !matches!(left, Expression::Variable(_)) {
                        return Err(self.error_at(ParseErrorKind::InvalidAssignmentTarget(left.to_string()), token));
                    }
                    Expression::binary(*op, left, right)
                },
                _ => {
                    check_definition_target(&left).map_err(|kind| self.error_at(kind, token))?;
                    Expression::Define { target: Box::new(left), value: Box::new(right) }
                },
            };
        }

        Ok(left)
    }

    /// Parses prefix operators followed by an operand with its postfix
    /// operators.
    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        if let Some(token) = self.peek() {
            if let TokenKind::Operator(Operator::Unary(op)) = &token.kind {
                if op.fixity() == Fixity::Prefix {
                    self.next();
                    if !self.at_operand() {
                        return Err(match self.peek() {
                            Some(next) => self.error_at(ParseErrorKind::MissingOperand(op.symbol().to_string()), next),
                            None => self.unexpected_end(),
                        });
                    }
                    let arg = self.parse_expression(PREFIX_PRECEDENCE)?;
                    return Ok(Expression::unary(*op, arg));
                }
            }
        }
        let operand = self.parse_primary()?;
        self.parse_postfix(operand)
    }

    fn parse_postfix(&mut self, mut operand: Expression) -> Result<Expression, ParseError> {
        while let Some(token) = self.peek() {
            let op = match &token.kind {
                TokenKind::Operator(Operator::Unary(op)) if op.fixity() == Fixity::Postfix => *op,
                _ => break,
            };
            self.next();
            let steps_variable = matches!(op, UnaryOperatorKind::Increment | UnaryOperatorKind::Decrement);
            if steps_variable && !matches!(operand, Expression::Variable(_)) {
                return Err(self.error_at(ParseErrorKind::InvalidAssignmentTarget(operand.to_string()), token));
            }
            operand = Expression::unary(op, operand);
        }
        Ok(operand)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.next().ok_or_else(|| self.unexpected_end())?;
        match &token.kind {
            TokenKind::Number(x) => Ok(Expression::Number(*x)),
            TokenKind::Bool(b) => Ok(Expression::Bool(*b)),
            TokenKind::Variable(name) => Ok(Expression::Variable(name.clone())),
            TokenKind::Symbol(Symbol::OpenParen) => {
                let expr = self.parse_expression(0)?;
                self.expect_symbol(Symbol::CloseParen)?;
                Ok(expr)
            },
            TokenKind::Symbol(Symbol::OpenBrace) => self.parse_braces(),
            TokenKind::Function(id) => {
                let args = self.parse_arguments()?;
                let arity = id.arity();
                if !arity.accepts(args.len()) {
                    return Err(self.error_at(ParseErrorKind::ArityMismatch {
                        name: id.name().to_string(),
                        expected: arity.to_string(),
                        found: args.len(),
                    }, token));
                }
                build_call(*id, args).map_err(|kind| self.error_at(kind, token))
            },
            TokenKind::UserFunction { name, .. } => {
                let args = self.parse_arguments()?;
                Ok(Expression::UserFunction { name: name.clone(), args })
            },
            _ => Err(self.error_at(ParseErrorKind::UnexpectedToken(token.lexeme.text().to_string()), token)),
        }
    }

    /// Parses `( arg, arg, ... )` after a function name.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect_symbol(Symbol::OpenParen)?;
        self.parse_list(Symbol::CloseParen)
    }

    /// Parses comma-separated expressions up to and including `close`.
    fn parse_list(&mut self, close: Symbol) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        if self.peek().is_some_and(|t| t.is_symbol(close)) {
            self.next();
            return Ok(items);
        }
        loop {
            self.depth += 1;
            let item = self.parse_expression(0);
            self.depth -= 1;
            items.push(item?);
            match self.next() {
                Some(token) if token.is_symbol(Symbol::Comma) => continue,
                Some(token) if token.is_symbol(close) => return Ok(items),
                Some(token) => {
                    return Err(self.error_at(ParseErrorKind::UnexpectedToken(token.lexeme.text().to_string()), token))
                },
                None => return Err(ParseError::new(ParseErrorKind::UnbalancedBrackets, self.end_position())),
            }
        }
    }

    /// Parses a vector `{a, b}` or a matrix `{{a, b}, {c, d}}` after `{`.
    fn parse_braces(&mut self) -> Result<Expression, ParseError> {
        let start = self.pos.saturating_sub(1);
        let is_matrix = self.peek().is_some_and(|t| t.is_symbol(Symbol::OpenBrace));
        let items = self.parse_list(Symbol::CloseBrace)?;
        if !is_matrix {
            return Ok(Expression::Vector(items));
        }

        let position = self.tokens[start].lexeme.start();
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Expression::Vector(row) => rows.push(row),
                other => return Err(ParseError::new(ParseErrorKind::UnexpectedToken(other.to_string()), position)),
            }
        }
        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(ParseError::new(ParseErrorKind::RaggedMatrix, position));
        }
        Ok(Expression::Matrix(rows))
    }
}

/// Checks the left side of `:=`, `def` and `undef`.
fn check_definition_target(target: &Expression) -> Result<(), ParseErrorKind> {
    match target {
        Expression::Variable(_) => Ok(()),
        Expression::UserFunction { args, .. } if args.iter().all(|a| matches!(a, Expression::Variable(_))) => Ok(()),
        other => Err(ParseErrorKind::InvalidAssignmentTarget(other.to_string())),
    }
}

/// Builds the node for a built-in call whose arity was already checked.
fn build_call(id: FunctionId, args: Vec<Expression>) -> Result<Expression, ParseErrorKind> {
    let construct = match id {
        FunctionId::Function(kind) => return Ok(Expression::Function { kind, args }),
        FunctionId::Construct(construct) => construct,
    };

    let mut args = args.into_iter();
    let mut next = || args.next().map(Box::new).ok_or(ParseErrorKind::UnexpectedEnd);
    let expr = match construct {
        Construct::If => Expression::If {
            condition: next()?,
            then: next()?,
            otherwise: next().ok(),
        },
        Construct::For => Expression::For {
            body: next()?,
            init: next()?,
            condition: next()?,
            step: next()?,
        },
        Construct::While => Expression::While {
            body: next()?,
            condition: next()?,
        },
        Construct::Define => {
            let target = next()?;
            check_definition_target(&target)?;
            Expression::Define { target, value: next()? }
        },
        Construct::Undefine => {
            let target = next()?;
            check_definition_target(&target)?;
            Expression::Undefine(target)
        },
        Construct::Derivative => {
            let expr = next()?;
            let variable = match next().ok().map(|b| *b) {
                None => DEFAULT_DERIVATIVE_VARIABLE.to_string(),
                Some(Expression::Variable(name)) => name,
                Some(other) => return Err(ParseErrorKind::UnexpectedToken(other.to_string())),
            };
            Expression::Derivative { expr, variable, point: next().ok() }
        },
        Construct::Simplify => Expression::Simplify(next()?),
        Construct::Factorial => Expression::Unary { op: UnaryOperatorKind::Factorial, arg: next()? },
    };
    Ok(expr)
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::functions::FunctionKind;
    use crate::lexer::tokenize;
    use crate::operators::BinaryOperatorKind;

    fn parse_str(input: &str) -> Result<Expression, ParseError> {
        parse(&tokenize(input).unwrap())
    }

    fn p(input: &str) -> Expression {
        parse_str(input).unwrap()
    }

    fn err(input: &str) -> ParseErrorKind {
        parse_str(input).unwrap_err().kind
    }

    fn num(x: f64) -> Expression {
        Expression::Number(x)
    }

    fn var(name: &str) -> Expression {
        Expression::variable(name)
    }

    #[test]
    fn test_single_number() {
        assert_eq!(p("42"), num(42.0));
    }

    #[test]
    fn test_binary_operator_precedence() {
        assert_eq!(p("1 + 2 * 3"), num(1.0) + num(2.0) * num(3.0));
        assert_eq!(p("(1 + 2) * 3"), (num(1.0) + num(2.0)) * num(3.0));
        assert_eq!(p("2 - 3 - 4"), (num(2.0) - num(3.0)) - num(4.0));
        assert_eq!(p("2 ^ 3 ^ 2"), num(2.0) ^ (num(3.0) ^ num(2.0)));
    }

    #[test]
    fn test_logic_precedence() {
        let expected = Expression::binary(
            BinaryOperatorKind::Or,
            var("a"),
            Expression::binary(BinaryOperatorKind::And, var("b"), var("c")),
        );
        assert_eq!(p("a or b and c"), expected);
        let expected = Expression::binary(
            BinaryOperatorKind::And,
            Expression::binary(BinaryOperatorKind::LessThan, var("x"), num(1.0)),
            Expression::binary(BinaryOperatorKind::GreaterThan, var("y"), num(2.0)),
        );
        assert_eq!(p("x < 1 and y > 2"), expected);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(p("-x^2"), -(var("x") ^ num(2.0)));
        assert_eq!(p("-2 * 3"), (-num(2.0)) * num(3.0));
        assert_eq!(p("2^-1"), num(2.0) ^ -num(1.0));
        assert_eq!(p("3!"), Expression::unary(UnaryOperatorKind::Factorial, num(3.0)));
        assert_eq!(p("-3!"), -Expression::unary(UnaryOperatorKind::Factorial, num(3.0)));
        assert_eq!(p("fact(3)"), p("3!"));
        assert_eq!(p("not true"), Expression::unary(UnaryOperatorKind::Not, Expression::Bool(true)));
    }

    #[test]
    fn test_implicit_multiplication_matches_explicit() {
        assert_eq!(p("2x"), p("2*x"));
        assert_eq!(p("2sin(x)"), p("2*sin(x)"));
        assert_eq!(p("(x+1)(x-1)"), p("(x+1)*(x-1)"));
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(p("sin(x)"), Expression::call(FunctionKind::Sin, var("x")));
        assert_eq!(
            p("log(2, 8)"),
            Expression::Function { kind: FunctionKind::Log, args: vec![num(2.0), num(8.0)] }
        );
        assert_eq!(
            p("sum(1, 2, 3)"),
            Expression::Function { kind: FunctionKind::Sum, args: vec![num(1.0), num(2.0), num(3.0)] }
        );
        assert_eq!(
            p("f(x, 2)"),
            Expression::UserFunction { name: "f".into(), args: vec![var("x"), num(2.0)] }
        );
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(matches!(err("sin(1, 2)"), ParseErrorKind::ArityMismatch { found: 2, .. }));
        assert!(matches!(err("log(2)"), ParseErrorKind::ArityMismatch { found: 1, .. }));
        assert!(matches!(err("gcd(4)"), ParseErrorKind::ArityMismatch { .. }));
        assert!(matches!(err("sin()"), ParseErrorKind::ArityMismatch { found: 0, .. }));
    }

    #[test]
    fn test_missing_operands() {
        assert_eq!(err("2 +"), ParseErrorKind::MissingOperand("+".into()));
        assert!(matches!(err("(2 * )"), ParseErrorKind::MissingOperand(_)));
        assert!(matches!(err("sin(, 1)"), ParseErrorKind::UnexpectedToken(_)));
        assert!(matches!(err("2 3 +"), ParseErrorKind::MissingOperand(_)));
    }

    #[test]
    fn test_trailing_tokens() {
        assert!(matches!(err("x y"), ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn test_vectors_and_matrices() {
        assert_eq!(p("{1, 2}"), Expression::Vector(vec![num(1.0), num(2.0)]));
        assert_eq!(
            p("{{1, 2}, {3, 4}}"),
            Expression::Matrix(vec![vec![num(1.0), num(2.0)], vec![num(3.0), num(4.0)]])
        );
        assert_eq!(err("{{1, 2}, {3}}"), ParseErrorKind::RaggedMatrix);
        assert!(matches!(err("{{1, 2}, 3}"), ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            p("x := 2 + 3"),
            Expression::Define { target: Box::new(var("x")), value: Box::new(num(2.0) + num(3.0)) }
        );
        assert_eq!(p("def(x, 5)"), p("x := 5"));
        assert_eq!(
            p("f(x) := x^2"),
            Expression::Define {
                target: Box::new(Expression::UserFunction { name: "f".into(), args: vec![var("x")] }),
                value: Box::new(var("x") ^ num(2.0)),
            }
        );
        assert!(matches!(err("2 := 3"), ParseErrorKind::InvalidAssignmentTarget(_)));
        assert!(matches!(err("f(1) := 3"), ParseErrorKind::InvalidAssignmentTarget(_)));
        assert!(matches!(err("2 += 3"), ParseErrorKind::InvalidAssignmentTarget(_)));
        assert_eq!(p("x += 1"), Expression::binary(BinaryOperatorKind::AddAssign, var("x"), num(1.0)));
        assert!(matches!(err("(x + 1)++"), ParseErrorKind::MissingOperand(_)));
    }

    #[test]
    fn test_constructs() {
        assert!(matches!(p("if(x > 1, 2)"), Expression::If { otherwise: None, .. }));
        assert!(matches!(p("if(x > 1, 2, 3)"), Expression::If { otherwise: Some(_), .. }));
        assert!(matches!(p("for(x, i := 0, i < 10, i++)"), Expression::For { .. }));
        assert!(matches!(p("while(x += 1, x < 10)"), Expression::While { .. }));
        assert!(matches!(p("undef(x)"), Expression::Undefine(_)));
        assert!(matches!(p("simplify(x + 0)"), Expression::Simplify(_)));
    }

    #[test]
    fn test_derivative() {
        assert_eq!(
            p("deriv(x^2)"),
            Expression::Derivative { expr: Box::new(var("x") ^ num(2.0)), variable: "x".into(), point: None }
        );
        assert_eq!(
            p("deriv(y^2, y, 3)"),
            Expression::Derivative {
                expr: Box::new(var("y") ^ num(2.0)),
                variable: "y".into(),
                point: Some(Box::new(num(3.0))),
            }
        );
        assert!(matches!(err("deriv(x^2, 2)"), ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(err(&deep), ParseErrorKind::NestingTooDeep(MAX_NESTING));
        let shallow = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(p(&shallow), var("x"));
    }

    #[test]
    fn test_error_position() {
        let error = parse_str("1 + sin(1, 2)").unwrap_err();
        assert_eq!(error.position, 4);
    }
}
