//! Formula parser
//!
//! A recursive descent parser for spreadsheet formulas with spreadsheet
//! operator precedence. Errors carry the character position of the token
//! that could not be parsed, counted from the leading `=` (position 0).

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use cellcalc_core::{CellAddress, CellRange, CellValue, ErrorKind};
use std::fmt;
use tracing::debug;

/// Maximum nesting of parentheses, calls, array constants and prefix operators
pub const MAX_PARSE_DEPTH: usize = 100;

/// Maximum height of the produced syntax tree, counting operator chains
pub const MAX_AST_DEPTH: usize = 1000;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use cellcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// assert!(parse_formula("=SUM(").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();

    let body = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::parse(0, "formula must start with '='"))?;

    debug!(formula, "parsing formula");

    let mut parser = FormulaParser::new(body)?;
    if parser.current_token == Token::Eof {
        return Err(parser.error_here("empty formula"));
    }

    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    match parser.current_token {
        Token::Eof => Ok(expr),
        Token::RightParen => Err(parser.error_here("unmatched ')'")),
        ref token => {
            let message = format!("unexpected {} after expression", token);
            Err(parser.error_here(message))
        }
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(ErrorKind),

    // Identifiers and references
    Identifier(String), // Function name or bare name
    CellRef(CellAddress),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(_) => write!(f, "string literal"),
            Token::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Token::Error(kind) => write!(f, "{}", kind),
            Token::Identifier(name) => write!(f, "name '{}'", name),
            Token::CellRef(addr) => write!(f, "reference {}", addr),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Caret => write!(f, "'^'"),
            Token::Percent => write!(f, "'%'"),
            Token::Ampersand => write!(f, "'&'"),
            Token::Equal => write!(f, "'='"),
            Token::NotEqual => write!(f, "'<>'"),
            Token::LessThan => write!(f, "'<'"),
            Token::LessEqual => write!(f, "'<='"),
            Token::GreaterThan => write!(f, "'>'"),
            Token::GreaterEqual => write!(f, "'>='"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::LeftBrace => write!(f, "'{{'"),
            Token::RightBrace => write!(f, "'}}'"),
            Token::Eof => write!(f, "end of formula"),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    /// Byte offset of the scanner
    pos: usize,
    /// Byte offset where the current token starts
    token_start: usize,
    current_token: Token,
    nesting: usize,
    height: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            token_start: 0,
            current_token: Token::Eof,
            nesting: 0,
            height: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Positions and errors ===

    /// Character position of a byte offset, counting the stripped `=`
    fn position_of(&self, byte: usize) -> usize {
        self.input[..byte.min(self.input.len())].chars().count() + 1
    }

    fn error_at<S: Into<String>>(&self, byte: usize, message: S) -> FormulaError {
        FormulaError::parse(self.position_of(byte), message)
    }

    fn error_here<S: Into<String>>(&self, message: S) -> FormulaError {
        self.error_at(self.token_start, message)
    }

    fn unexpected(&self) -> FormulaError {
        match self.current_token {
            Token::Eof => self.error_here("unexpected end of formula"),
            ref token => self.error_here(format!("unexpected {}", token)),
        }
    }

    // === Depth tracking ===

    fn enter(&mut self) -> FormulaResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_PARSE_DEPTH {
            return Err(self.error_here(format!(
                "formula is nested more than {} levels deep",
                MAX_PARSE_DEPTH
            )));
        }
        self.grow()
    }

    fn leave(&mut self) {
        self.nesting -= 1;
        self.height -= 1;
    }

    fn grow(&mut self) -> FormulaResult<()> {
        self.height += 1;
        if self.height > MAX_AST_DEPTH {
            return Err(self.error_here(format!(
                "formula is more than {} operations deep",
                MAX_AST_DEPTH
            )));
        }
        Ok(())
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            '=' => Some(Token::Equal),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        if c == '"' {
            return self.scan_string();
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '#' {
            return self.scan_error_literal();
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        Err(self.error_at(self.pos, format!("unexpected character '{}'", c)))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    // Check for escaped quote ("")
                    if self.peek_char_at(1) == Some('"') {
                        s.push('"');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(self.error_at(start, "unterminated string literal")),
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance();
            }
            if !self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                return Err(self.error_at(start, "invalid number: missing exponent digits"));
            }
            self.skip_digits();
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) if num.is_finite() => Ok(Token::Number(num)),
            Ok(_) => Err(self.error_at(start, format!("number '{}' is out of range", num_str))),
            Err(_) => Err(self.error_at(start, format!("invalid number '{}'", num_str))),
        }
    }

    fn scan_error_literal(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip '#'
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        ErrorKind::parse(text)
            .map(Token::Error)
            .ok_or_else(|| self.error_at(start, format!("unknown error literal '{}'", text)))
    }

    fn scan_identifier_or_ref(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        if self.peek_char() == Some('!') {
            return Err(self.error_at(start, "references to other sheets are not supported"));
        }

        // A name followed by '(' is always a call: LOG10(100), TRUE()
        let is_call = self.next_non_space() == Some('(');

        if !is_call {
            if text.eq_ignore_ascii_case("TRUE") {
                return Ok(Token::Boolean(true));
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Ok(Token::Boolean(false));
            }
        }

        if !is_call && is_cell_reference(text) {
            return CellAddress::parse(text).map(Token::CellRef).map_err(|e| {
                self.error_at(start, format!("invalid cell reference '{}': {}", text, e))
            });
        }

        if text.contains('$') {
            return Err(self.error_at(start, format!("invalid cell reference '{}'", text)));
        }

        Ok(Token::Identifier(text.to_string()))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn next_non_space(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token, message: &str) -> FormulaResult<()> {
        if &self.current_token == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Addition/Subtraction: +, -
    // 3. Concatenation: &
    // 4. Multiplication/Division: *, /
    // 5. Unary prefix: -, +
    // 6. Exponentiation: ^ (right-assoc, signed exponent allowed)
    // 7. Postfix: %
    // 8. Range: :
    // 9. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let height = self.height;
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            self.grow()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }

        self.height = height;
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let height = self.height;
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            self.grow()?;
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        self.height = height;
        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let height = self.height;
        let mut left = self.parse_multiplicative()?;

        while self.current_token == Token::Ampersand {
            self.consume()?;
            self.grow()?;
            let right = self.parse_multiplicative()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        self.height = height;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let height = self.height;
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            self.grow()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        self.height = height;
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let op = match self.current_token {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_power(),
        };

        self.consume()?;
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();

        Ok(FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let base = self.parse_postfix()?;

        if self.current_token != Token::Caret {
            return Ok(base);
        }

        self.consume()?;
        self.enter()?;
        // Right associative, and the exponent may carry its own sign: 2^-1
        let exponent = self.parse_unary()?;
        self.leave();

        Ok(binary(BinaryOperator::Power, base, exponent))
    }

    fn parse_postfix(&mut self) -> FormulaResult<FormulaExpr> {
        let height = self.height;
        let mut expr = self.parse_range()?;

        while self.current_token == Token::Percent {
            self.consume()?;
            self.grow()?;
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        self.height = height;
        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if self.current_token != Token::Colon {
            return Ok(left);
        }

        let start = match left {
            FormulaExpr::Reference(addr) => addr,
            _ => return Err(self.error_here("':' must join two cell references")),
        };

        self.consume()?;
        match self.current_token {
            Token::CellRef(end) => {
                self.consume()?;
                Ok(FormulaExpr::RangeRef(CellRange::new(start, end)))
            }
            _ => Err(self.error_here("':' must join two cell references")),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token {
            Token::Number(n) => {
                self.consume()?;
                Ok(FormulaExpr::number(n))
            }

            Token::String(_) => match self.consume()? {
                Token::String(s) => Ok(FormulaExpr::Literal(CellValue::text(s))),
                _ => Err(self.unexpected()),
            },

            Token::Boolean(b) => {
                self.consume()?;
                Ok(FormulaExpr::boolean(b))
            }

            Token::Error(kind) => {
                self.consume()?;
                Ok(FormulaExpr::Literal(CellValue::error(kind)))
            }

            Token::LeftParen => {
                self.consume()?;
                if self.current_token == Token::RightParen {
                    return Err(self.error_here("empty parentheses"));
                }
                self.enter()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen, "missing closing ')'")?;
                self.leave();
                Ok(expr)
            }

            Token::LeftBrace => self.parse_array(),

            Token::CellRef(addr) => {
                self.consume()?;
                Ok(FormulaExpr::Reference(addr))
            }

            Token::Identifier(_) => {
                let name = match self.consume()? {
                    Token::Identifier(name) => name,
                    _ => return Err(self.unexpected()),
                };
                if self.current_token == Token::LeftParen {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::Name(name))
                }
            }

            _ => Err(self.unexpected()),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        let name = name.to_ascii_uppercase();
        self.expect(&Token::LeftParen, "expected '('")?;
        self.enter()?;

        let mut args = Vec::new();

        if self.current_token == Token::RightParen {
            self.consume()?;
            self.leave();
            return Ok(FormulaExpr::Function { name, args });
        }

        loop {
            if matches!(self.current_token, Token::Comma | Token::RightParen) {
                return Err(self.error_here(format!("empty argument in call to {}", name)));
            }

            args.push(self.parse_expression()?);

            match self.current_token {
                Token::Comma => {
                    self.consume()?;
                }
                Token::RightParen => {
                    self.consume()?;
                    break;
                }
                Token::Eof => {
                    return Err(self.error_here(format!("missing closing ')' for {}", name)))
                }
                ref token => {
                    let message = format!("expected ',' or ')' in call to {}, found {}", name, token);
                    return Err(self.error_here(message));
                }
            }
        }

        self.leave();
        Ok(FormulaExpr::Function { name, args })
    }

    fn parse_array(&mut self) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftBrace, "expected '{'")?;
        self.enter()?;

        let mut rows: Vec<Vec<FormulaExpr>> = Vec::new();
        let mut current_row = vec![self.parse_array_element()?];

        loop {
            match self.current_token {
                Token::Comma => {
                    self.consume()?;
                    current_row.push(self.parse_array_element()?);
                }
                Token::Semicolon => {
                    self.consume()?;
                    rows.push(std::mem::take(&mut current_row));
                    current_row.push(self.parse_array_element()?);
                }
                Token::RightBrace => break,
                Token::Eof => return Err(self.error_here("missing closing '}'")),
                _ => return Err(self.error_here("expected ',' ';' or '}' in array constant")),
            }
        }
        rows.push(current_row);

        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(self.error_here("array constant rows must have the same length"));
        }

        self.consume()?; // '}'
        self.leave();
        Ok(FormulaExpr::Array(rows))
    }

    /// Array constants hold literal values only, optionally signed numbers
    fn parse_array_element(&mut self) -> FormulaResult<FormulaExpr> {
        let negate = match self.current_token {
            Token::Minus => {
                self.consume()?;
                true
            }
            Token::Plus => {
                self.consume()?;
                false
            }
            _ => false,
        };

        match self.current_token {
            Token::Number(n) => {
                self.consume()?;
                Ok(FormulaExpr::number(if negate { -n } else { n }))
            }
            Token::String(_) | Token::Boolean(_) | Token::Error(_) if !negate => {
                self.parse_primary()
            }
            Token::RightBrace | Token::Comma | Token::Semicolon => {
                Err(self.error_here("empty element in array constant"))
            }
            _ => Err(self.error_here("array constants may only contain literal values")),
        }
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Whether text has the shape `[$]letters[$]digits`
fn is_cell_reference(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }

    let letter_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == letter_start {
        return false;
    }

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }

    let digit_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    i > digit_start && i == bytes.len()
}
