//! Text syntax for expressions
//!
//! ```text
//! dep_time > 600 && dest %in% c("IAH", "HOU")
//! speed = distance / air_time * 60
//! mean(arr_delay, na_rm = true)
//! ```
//!
//! Precedence, lowest first: `||`, `&&`, `!`, equality, ordering, `+ -`,
//! `* / %`, `%in%`, unary `-`, `^` (right associative).

use std::iter::Peekable;
use std::str::Chars;

use crate::column::Value;
use crate::error::{Error, Result};
use crate::expr::{BinaryOp, Expr, ScalarFunc, UnaryOp};
use crate::groupby::AggFunc;

/// Token types for expression parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Column identifier
    Identifier(String),
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Missing value literal
    Null,
    /// Comparison operators
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Logical operators
    And,
    Or,
    Not,
    /// Arithmetic operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,
    /// `%in%`
    In,
    /// `=` in assignments and named arguments
    Assign,
    /// Parentheses
    LeftParen,
    RightParen,
    /// Function name (an identifier directly followed by `(`)
    Function(String),
    /// Comma separator
    Comma,
    /// End of input
    Eof,
}

/// Lexer for tokenizing expressions
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Tokenize the whole input, ending with `Token::Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.chars.peek() {
            None => return Ok(Token::Eof),
            Some(&ch) => ch,
        };

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '/' => self.single(Token::Divide),
            '^' => self.single(Token::Power),
            '*' => {
                self.chars.next();
                Ok(self.followed_by('*', Token::Power, Token::Multiply))
            }
            '%' => {
                self.chars.next();
                let mut ahead = self.chars.clone();
                if ahead.next() == Some('i') && ahead.next() == Some('n') && ahead.next() == Some('%') {
                    self.chars = ahead;
                    Ok(Token::In)
                } else {
                    Ok(Token::Modulo)
                }
            }
            '=' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::Equal, Token::Assign))
            }
            '!' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::NotEqual, Token::Not))
            }
            '<' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::LessThanOrEqual, Token::LessThan))
            }
            '>' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::GreaterThanOrEqual, Token::GreaterThan))
            }
            // `&` and `&&` are the same operator on vectors
            '&' => {
                self.chars.next();
                Ok(self.followed_by('&', Token::And, Token::And))
            }
            '|' => {
                self.chars.next();
                Ok(self.followed_by('|', Token::Or, Token::Or))
            }
            '\'' | '"' => self.read_string(),
            '`' => self.read_quoted_identifier(),
            '0'..='9' | '.' => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            _ => Err(Error::InvalidValue(format!("Unexpected character: {}", ch))),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.chars.next();
        Ok(token)
    }

    /// Consume `next` if it follows, choosing between two tokens
    fn followed_by(&mut self, next: char, matched: Token, otherwise: Token) -> Token {
        if self.chars.peek() == Some(&next) {
            self.chars.next();
            matched
        } else {
            otherwise
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Read a string literal
    fn read_string(&mut self) -> Result<Token> {
        let quote = match self.chars.next() {
            Some(q) => q,
            None => return Err(Error::InvalidValue("Unexpected end of input".to_string())),
        };
        let mut value = String::new();

        while let Some(ch) = self.chars.next() {
            if ch == quote {
                return Ok(Token::String(value));
            } else if ch == '\\' {
                if let Some(escaped) = self.chars.next() {
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '\'' => value.push('\''),
                        '"' => value.push('"'),
                        _ => {
                            value.push('\\');
                            value.push(escaped);
                        }
                    }
                }
            } else {
                value.push(ch);
            }
        }

        Err(Error::InvalidValue("Unterminated string literal".to_string()))
    }

    /// Column name in backticks, for names that are not identifiers
    fn read_quoted_identifier(&mut self) -> Result<Token> {
        self.chars.next();
        let mut name = String::new();
        for ch in self.chars.by_ref() {
            if ch == '`' {
                return Ok(Token::Identifier(name));
            }
            name.push(ch);
        }
        Err(Error::InvalidValue("Unterminated quoted column name".to_string()))
    }

    /// Read a number literal; no decimal point or exponent means integer
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                number.push(ch);
            } else if ch == '.' {
                is_float = true;
                number.push(ch);
            } else if ch == 'e' || ch == 'E' {
                is_float = true;
                number.push(ch);
                self.chars.next();
                if let Some(&sign) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        number.push(sign);
                        self.chars.next();
                    }
                }
                continue;
            } else {
                break;
            }
            self.chars.next();
        }

        if !is_float {
            if let Ok(value) = number.parse::<i64>() {
                return Ok(Token::Integer(value));
            }
        }

        match number.parse::<f64>() {
            Ok(value) => Ok(Token::Number(value)),
            Err(_) => Err(Error::InvalidValue(format!("Invalid number: {}", number))),
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Result<Token> {
        let mut identifier = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                identifier.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }

        match identifier.as_str() {
            "true" | "TRUE" => Ok(Token::Boolean(true)),
            "false" | "FALSE" => Ok(Token::Boolean(false)),
            "NA" | "null" => Ok(Token::Null),
            "and" => Ok(Token::And),
            "or" => Ok(Token::Or),
            "not" => Ok(Token::Not),
            _ => {
                if self.chars.peek() == Some(&'(') {
                    Ok(Token::Function(identifier))
                } else {
                    Ok(Token::Identifier(identifier))
                }
            }
        }
    }
}

/// Parser for building expression AST
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the tokens into one expression; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_or_expression()?;
        self.expect_end()?;
        Ok(expr)
    }

    /// Parse `name = expression`
    pub fn parse_assignment(&mut self) -> Result<(String, Expr)> {
        let name = match self.current_token().cloned() {
            Some(Token::Identifier(name)) => name,
            other => {
                return Err(Error::InvalidValue(format!(
                    "Expected a column name before '=', found {:?}",
                    other.unwrap_or(Token::Eof)
                )))
            }
        };
        self.advance();
        if !self.match_token(&Token::Assign) {
            return Err(Error::InvalidValue(format!("Expected '=' after '{}'", name)));
        }
        let expr = self.parse_or_expression()?;
        self.expect_end()?;
        Ok((name, expr))
    }

    fn expect_end(&self) -> Result<()> {
        match self.current_token() {
            None | Some(Token::Eof) => Ok(()),
            Some(token) => Err(Error::InvalidValue(format!("Unexpected token: {:?}", token))),
        }
    }

    /// Parse OR expressions
    fn parse_or_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expression()?;

        while self.match_token(&Token::Or) {
            let right = self.parse_and_expression()?;
            left = binary(left, BinaryOp::Or, right);
        }

        Ok(left)
    }

    /// Parse AND expressions
    fn parse_and_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_not_expression()?;

        while self.match_token(&Token::And) {
            let right = self.parse_not_expression()?;
            left = binary(left, BinaryOp::And, right);
        }

        Ok(left)
    }

    /// Negation binds looser than comparisons: `!x > 1` is `!(x > 1)`
    fn parse_not_expression(&mut self) -> Result<Expr> {
        if self.match_token(&Token::Not) {
            let operand = self.parse_not_expression()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_equality_expression()
    }

    /// Parse equality expressions (==, !=)
    fn parse_equality_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison_expression()?;

        while let Some(op) = self.match_equality_operator() {
            let right = self.parse_comparison_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse comparison expressions (<, <=, >, >=)
    fn parse_comparison_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expression()?;

        while let Some(op) = self.match_comparison_operator() {
            let right = self.parse_additive_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse additive expressions (+, -)
    fn parse_additive_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expression()?;

        while let Some(op) = self.match_additive_operator() {
            let right = self.parse_multiplicative_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse multiplicative expressions (*, /, %)
    fn parse_multiplicative_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_membership_expression()?;

        while let Some(op) = self.match_multiplicative_operator() {
            let right = self.parse_membership_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse `x %in% c(...)`
    fn parse_membership_expression(&mut self) -> Result<Expr> {
        let left = self.parse_unary_expression()?;

        if !self.match_token(&Token::In) {
            return Ok(left);
        }

        match self.current_token().cloned() {
            // `c(...)` or a bare parenthesised list
            Some(Token::Function(name)) if name == "c" => {
                self.advance();
                self.parse_literal_set(left)
            }
            Some(Token::LeftParen) => self.parse_literal_set(left),
            // a single literal on the right
            _ => {
                let value = literal_value(self.parse_unary_expression()?)?;
                Ok(Expr::InSet {
                    expr: Box::new(left),
                    set: vec![value],
                })
            }
        }
    }

    fn parse_literal_set(&mut self, left: Expr) -> Result<Expr> {
        let set = self
            .parse_arguments()?
            .into_iter()
            .map(|arg| match arg {
                Argument::Positional(expr) => literal_value(expr),
                Argument::Named(name, _) => Err(Error::InvalidValue(format!(
                    "Unexpected named argument '{}' in value list",
                    name
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Expr::InSet {
            expr: Box::new(left),
            set,
        })
    }

    /// Parse unary minus
    fn parse_unary_expression(&mut self) -> Result<Expr> {
        if self.match_token(&Token::Minus) {
            let operand = self.parse_unary_expression()?;
            return Ok(match operand {
                Expr::Literal(Value::Int64(i)) => Expr::Literal(Value::Int64(-i)),
                Expr::Literal(Value::Float64(f)) => Expr::Literal(Value::Float64(-f)),
                other => Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(other),
                },
            });
        }
        if self.match_token(&Token::Plus) {
            return self.parse_unary_expression();
        }
        self.parse_power_expression()
    }

    /// Parse power expressions (^, **); `-2^2` is `-(2^2)`
    fn parse_power_expression(&mut self) -> Result<Expr> {
        let left = self.parse_primary_expression()?;

        if self.match_token(&Token::Power) {
            // Right associative, and the exponent may carry a sign
            let right = self.parse_unary_expression()?;
            return Ok(binary(left, BinaryOp::Power, right));
        }

        Ok(left)
    }

    /// Parse primary expressions (literals, identifiers, function calls, parentheses)
    fn parse_primary_expression(&mut self) -> Result<Expr> {
        let token = match self.current_token().cloned() {
            Some(token) => token,
            None => return Err(Error::InvalidValue("Unexpected end of input".to_string())),
        };

        match token {
            Token::Integer(value) => {
                self.advance();
                Ok(Expr::Literal(Value::Int64(value)))
            }
            Token::Number(value) => {
                self.advance();
                Ok(Expr::Literal(Value::Float64(value)))
            }
            Token::String(value) => {
                self.advance();
                Ok(Expr::Literal(Value::Str(value)))
            }
            Token::Boolean(value) => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(value)))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            Token::Identifier(name) => {
                self.advance();
                Ok(Expr::Column(name))
            }
            Token::Function(name) => {
                self.advance();
                let args = self.parse_arguments()?;
                build_call(&name, args)
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or_expression()?;

                if !self.match_token(&Token::RightParen) {
                    return Err(Error::InvalidValue("Expected ')' after expression".to_string()));
                }

                Ok(expr)
            }
            Token::Eof => Err(Error::InvalidValue("Unexpected end of input".to_string())),
            _ => Err(Error::InvalidValue(format!("Unexpected token: {:?}", token))),
        }
    }

    /// Parse `( arg, name = arg, ... )`
    fn parse_arguments(&mut self) -> Result<Vec<Argument>> {
        if !self.match_token(&Token::LeftParen) {
            return Err(Error::InvalidValue("Expected '(' after function name".to_string()));
        }

        let mut args = Vec::new();
        if !self.check_token(&Token::RightParen) {
            loop {
                let named = match (self.current_token(), self.tokens.get(self.position + 1)) {
                    (Some(Token::Identifier(name)), Some(Token::Assign)) => Some(name.clone()),
                    _ => None,
                };
                match named {
                    Some(name) => {
                        self.advance();
                        self.advance();
                        args.push(Argument::Named(name, self.parse_or_expression()?));
                    }
                    None => args.push(Argument::Positional(self.parse_or_expression()?)),
                }

                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }

        if !self.match_token(&Token::RightParen) {
            return Err(Error::InvalidValue("Expected ')' after function arguments".to_string()));
        }

        Ok(args)
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.check_token(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_token(&self, expected: &Token) -> bool {
        if let Some(token) = self.current_token() {
            std::mem::discriminant(token) == std::mem::discriminant(expected)
        } else {
            false
        }
    }

    fn match_operator(&mut self, table: &[(Token, BinaryOp)]) -> Option<BinaryOp> {
        let current = self.current_token()?;
        let op = table
            .iter()
            .find(|(token, _)| token == current)
            .map(|(_, op)| *op)?;
        self.advance();
        Some(op)
    }

    fn match_equality_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::Equal, BinaryOp::Equal),
            (Token::NotEqual, BinaryOp::NotEqual),
        ])
    }

    fn match_comparison_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::LessThan, BinaryOp::LessThan),
            (Token::LessThanOrEqual, BinaryOp::LessThanOrEqual),
            (Token::GreaterThan, BinaryOp::GreaterThan),
            (Token::GreaterThanOrEqual, BinaryOp::GreaterThanOrEqual),
        ])
    }

    fn match_additive_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Subtract)])
    }

    fn match_multiplicative_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::Multiply, BinaryOp::Multiply),
            (Token::Divide, BinaryOp::Divide),
            (Token::Modulo, BinaryOp::Modulo),
        ])
    }
}

enum Argument {
    Positional(Expr),
    Named(String, Expr),
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn literal_value(expr: Expr) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value),
        other => Err(Error::InvalidValue(format!("Expected a literal, found `{}`", other))),
    }
}

fn literal_bool(name: &str, expr: Expr) -> Result<bool> {
    match literal_value(expr)? {
        Value::Bool(b) => Ok(b),
        other => Err(Error::InvalidValue(format!(
            "'{}' must be true or false, found {}",
            name, other
        ))),
    }
}

fn aggregate_by_name(name: &str) -> Option<AggFunc> {
    let func = match name {
        "n" => AggFunc::Count,
        "n_distinct" => AggFunc::CountDistinct,
        "mean" => AggFunc::Mean,
        "median" => AggFunc::Median,
        "quantile" => AggFunc::Quantile(0.5),
        "sum" => AggFunc::Sum,
        "count_true" => AggFunc::CountTrue,
        "min" => AggFunc::Min,
        "max" => AggFunc::Max,
        "sd" => AggFunc::Sd,
        "first" => AggFunc::First,
        "last" => AggFunc::Last,
        _ => return None,
    };
    Some(func)
}

fn build_call(name: &str, args: Vec<Argument>) -> Result<Expr> {
    if name == "c" {
        return Err(Error::InvalidValue("c(...) is only valid after %in%".to_string()));
    }

    let mut positional = Vec::new();
    let mut named = Vec::new();
    for arg in args {
        match arg {
            Argument::Positional(expr) => positional.push(expr),
            Argument::Named(key, expr) => named.push((key, expr)),
        }
    }

    if let Some(func) = ScalarFunc::from_name(name) {
        if let Some((key, _)) = named.first() {
            return Err(Error::InvalidValue(format!(
                "{}() has no argument named '{}'",
                name, key
            )));
        }
        return Ok(Expr::Function {
            func,
            args: positional,
        });
    }

    let mut func = aggregate_by_name(name)
        .ok_or_else(|| Error::InvalidValue(format!("Unknown function: {}", name)))?;

    let mut na_rm = false;
    let mut p = None;
    for (key, expr) in named {
        match key.as_str() {
            "na_rm" | "na.rm" => na_rm = literal_bool(&key, expr)?,
            "p" | "probs" if matches!(func, AggFunc::Quantile(_)) => p = Some(expr),
            _ => {
                return Err(Error::InvalidValue(format!(
                    "{}() has no argument named '{}'",
                    name, key
                )))
            }
        }
    }

    let mut positional = positional.into_iter();
    let arg = positional.next();
    if let AggFunc::Quantile(_) = func {
        let p = p.or_else(|| positional.next()).ok_or_else(|| {
            Error::InvalidValue("quantile() needs a probability argument".to_string())
        })?;
        let p = match literal_value(p)? {
            Value::Float64(f) => f,
            Value::Int64(i) => i as f64,
            other => {
                return Err(Error::InvalidValue(format!(
                    "quantile() probability must be a number, found {}",
                    other
                )))
            }
        };
        func = AggFunc::Quantile(p);
    }

    let extra = positional.count();
    match (func, arg) {
        (AggFunc::Count, None) => Ok(Expr::Aggregate {
            func,
            arg: None,
            na_rm,
        }),
        (AggFunc::Count, Some(_)) => Err(Error::InvalidValue("n() takes no arguments".to_string())),
        (_, None) => Err(Error::InvalidValue(format!("{}() needs an argument", name))),
        (_, Some(_)) if extra > 0 => Err(Error::InvalidValue(format!(
            "{}() got {} unexpected argument(s)",
            name, extra
        ))),
        (_, Some(arg)) => Ok(Expr::Aggregate {
            func,
            arg: Some(Box::new(arg)),
            na_rm,
        }),
    }
}

/// Parse an expression from text
pub fn parse(text: &str) -> Result<Expr> {
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens).parse()
}

/// Parse `name = expression`, as used by mutate and summarise
pub fn parse_named(text: &str) -> Result<(String, Expr)> {
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens).parse_assignment()
}
