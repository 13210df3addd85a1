//! Lexer and precedence-climbing parser for the flow expression language.
//!
//! The language is a small JavaScript-like subset: literals, identifiers, member access,
//! indexing, `Namespace.function(...)` calls, array and object literals, unary and binary
//! operators and `?:`.

use super::operations::{BinaryOp, UnaryOp};
use crate::error::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `object.field`
    Member(Box<Expr>, String),
    /// `object[index]`
    Index(Box<Expr>, Box<Expr>),
    /// `Namespace.function(arguments)`
    Call(String, Vec<Expr>),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
}

impl Expr {
    /// Whether the expression denotes a storage location.
    pub fn is_assignable(&self) -> bool {
        match self {
            Expr::Identifier(_) | Expr::Member(..) | Expr::Index(..) => true,
            Expr::Conditional(_, consequent, alternate) => {
                consequent.is_assignable() && alternate.is_assignable()
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    Number(f64),
    String(String),
    Identifier(String),
    Punct(&'static str),
    Eof,
}

// Longest first, so `<=` wins over `<`.
const PUNCTUATORS: [&str; 30] = [
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "&", "|",
    "^", "!", "~", "?", ":", "(", ")", "[", "]", "{", "}", ".", ",",
];

struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ExpressionError> {
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

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        if c.is_ascii_digit() {
            return self.scan_number();
        }
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }
        if is_id_start(c) {
            let start = self.position;
            while self.peek_char().is_some_and(is_id_continue) {
                self.advance();
            }
            return Ok(Token::Identifier(self.source[start..self.position].to_string()));
        }
        for punct in PUNCTUATORS {
            if self.rest().starts_with(punct) {
                self.position += punct.len();
                return Ok(Token::Punct(punct));
            }
        }
        Err(ExpressionError::Syntax(format!(
            "Unexpected character '{}' at {}",
            c, self.position
        )))
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn scan_number(&mut self) -> Result<Token, ExpressionError> {
        let start = self.position;
        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.position += 2;
            let digits_start = self.position;
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = &self.source[digits_start..self.position];
            return i64::from_str_radix(digits, 16)
                .map(Token::Integer)
                .map_err(|_| ExpressionError::Syntax(format!("Invalid number '0x{}'", digits)));
        }

        let mut is_float = false;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek_char() == Some('.')
            && self.rest()[1..].chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.source[start..self.position];
        if !is_float {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(Token::Integer(value));
            }
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ExpressionError::Syntax(format!("Invalid number '{}'", text)))
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ExpressionError> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(ExpressionError::Syntax("Unterminated string".to_string())),
                Some(c) if c == quote => return Ok(Token::String(value)),
                Some('\\') => {
                    let escaped = self
                        .advance()
                        .ok_or_else(|| ExpressionError::Syntax("Unterminated string".to_string()))?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                Some(c) => value.push(c),
            }
        }
    }
}

fn is_id_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_id_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Deepest nesting of sub-expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses an expression. The whole input must be consumed.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
    };
    let expr = parser.parse_conditional()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        token => Err(ExpressionError::Syntax(format!(
            "Unexpected {} after expression",
            describe(token)
        ))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Current depth of the tree being built; bounds recursion here and in every later walk.
    depth: usize,
}

impl Parser {
    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ExpressionError::Syntax(format!(
                "Expression is nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Token::Punct(p) if *p == punct) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ExpressionError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(ExpressionError::Syntax(format!(
                "Expected '{}' but found {}",
                punct,
                describe(self.peek())
            )))
        }
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExpressionError> {
        self.descend()?;
        let expr = self.parse_conditional_branches()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_conditional_branches(&mut self) -> Result<Expr, ExpressionError> {
        let test = self.parse_binary(1)?;
        if self.eat("?") {
            let consequent = self.parse_conditional()?;
            self.expect(":")?;
            let alternate = self.parse_conditional()?;
            return Ok(Expr::Conditional(
                Box::new(test),
                Box::new(consequent),
                Box::new(alternate),
            ));
        }
        Ok(test)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;
        let mut chained = 0;
        while let Some(op) = self.peek_binary_op() {
            if op.precedence() < min_precedence {
                break;
            }
            self.position += 1;
            self.descend()?;
            chained += 1;
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        let Token::Punct(p) = self.peek() else {
            return None;
        };
        let op = match *p {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "<<" => BinaryOp::LeftShift,
            ">>" => BinaryOp::RightShift,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessOrEqual,
            ">=" => BinaryOp::GreaterOrEqual,
            "&&" => BinaryOp::LogicalAnd,
            "||" => BinaryOp::LogicalOr,
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        let op = match self.peek() {
            Token::Punct("+") => Some(UnaryOp::Plus),
            Token::Punct("-") => Some(UnaryOp::Minus),
            Token::Punct("~") => Some(UnaryOp::Complement),
            Token::Punct("!") => Some(UnaryOp::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                self.position += 1;
                self.descend()?;
                let argument = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr::Unary(op, Box::new(argument)))
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_primary()?;
        let mut chained = 0;
        loop {
            if matches!(self.peek(), Token::Punct("." | "[" | "(")) {
                self.descend()?;
                chained += 1;
            }
            if self.eat(".") {
                match self.next() {
                    Token::Identifier(name) => expr = Expr::Member(Box::new(expr), name),
                    token => {
                        return Err(ExpressionError::Syntax(format!(
                            "Expected field name but found {}",
                            describe(&token)
                        )));
                    }
                }
            } else if self.eat("[") {
                let index = self.parse_conditional()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat("(") {
                let name = match &expr {
                    Expr::Member(object, function) => match object.as_ref() {
                        Expr::Identifier(namespace) => format!("{}.{}", namespace, function),
                        _ => return Err(ExpressionError::Syntax("Invalid call expression".to_string())),
                    },
                    _ => return Err(ExpressionError::Syntax("Invalid call expression".to_string())),
                };
                let arguments = self.parse_list(")")?;
                expr = Expr::Call(name, arguments);
            } else {
                self.depth -= chained;
                return Ok(expr);
            }
        }
    }

    fn parse_list(&mut self, close: &str) -> Result<Vec<Expr>, ExpressionError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_conditional()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.next() {
            Token::Integer(value) => Ok(Expr::Literal(Literal::Integer(value))),
            Token::Number(value) => Ok(Expr::Literal(Literal::Number(value))),
            Token::String(value) => Ok(Expr::Literal(Literal::String(value))),
            Token::Identifier(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Literal::Boolean(true)),
                "false" => Expr::Literal(Literal::Boolean(false)),
                "null" => Expr::Literal(Literal::Null),
                "undefined" => Expr::Literal(Literal::Undefined),
                _ => Expr::Identifier(name),
            }),
            Token::Punct("(") => {
                let expr = self.parse_conditional()?;
                self.expect(")")?;
                Ok(expr)
            }
            Token::Punct("[") => Ok(Expr::Array(self.parse_list("]")?)),
            Token::Punct("{") => self.parse_object(),
            token => Err(ExpressionError::Syntax(format!("Unexpected {}", describe(&token)))),
        }
    }

    fn parse_object(&mut self) -> Result<Expr, ExpressionError> {
        let mut fields = Vec::new();
        if self.eat("}") {
            return Ok(Expr::Object(fields));
        }
        loop {
            let key = match self.next() {
                Token::Identifier(name) | Token::String(name) => name,
                token => {
                    return Err(ExpressionError::Syntax(format!(
                        "Expected field name but found {}",
                        describe(&token)
                    )));
                }
            };
            self.expect(":")?;
            fields.push((key, self.parse_conditional()?));
            if self.eat("}") {
                return Ok(Expr::Object(fields));
            }
            self.expect(",")?;
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Integer(value) => format!("number {}", value),
        Token::Number(value) => format!("number {}", value),
        Token::String(value) => format!("string {:?}", value),
        Token::Identifier(name) => format!("identifier '{}'", name),
        Token::Punct(p) => format!("'{}'", p),
        Token::Eof => "end of expression".to_string(),
    }
}

/// Turns `Text {expr} more` into `"Text " + (expr) + " more"`.
///
/// `{{` and `}}` stand for literal braces.
pub fn template_literal_to_expression(template: &str) -> Result<String, ExpressionError> {
    let mut parts: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                if !text.is_empty() {
                    parts.push(quote(&text));
                    text.clear();
                }
                let mut inner = String::new();
                let mut depth = 1;
                loop {
                    match chars.next() {
                        None => {
                            return Err(ExpressionError::Syntax(
                                "Unterminated '{' in template literal".to_string(),
                            ));
                        }
                        Some('{') => {
                            depth += 1;
                            inner.push('{');
                        }
                        Some('}') => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            inner.push('}');
                        }
                        Some(other) => inner.push(other),
                    }
                }
                parts.push(format!("({})", inner.trim()));
            }
            other => text.push(other),
        }
    }
    if !text.is_empty() || parts.is_empty() {
        parts.push(quote(&text));
    }
    Ok(parts.join(" + "))
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
