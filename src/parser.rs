use thiserror::Error;

use crate::ast::{BinaryOperator, Expression, Program, Statement};
use crate::token::{Token, TokenKind};

/// Raised on the first grammar violation; parsing never recovers and
/// never yields a partial program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} (found '{found}' at line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub found: String,
    pub line: usize,
    pub column: usize,
}

/// Recursive-descent parser over the lexer's token sequence.
///
/// The token list must end with an `Eof` token, which `lexer::tokenize`
/// guarantees.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.matches(TokenKind::Var) {
            return self.parse_var_declaration();
        }
        if self.matches(TokenKind::Function) {
            return self.parse_function_declaration();
        }
        if self.matches(TokenKind::If) {
            return self.parse_if_statement();
        }
        if self.matches(TokenKind::Return) {
            return self.parse_return_statement();
        }
        if self.matches(TokenKind::LBrace) {
            return self.parse_block();
        }
        if self.matches(TokenKind::While) {
            return self.parse_while_statement();
        }
        Err(self.error_at_current("Expected a statement"))
    }

    fn parse_var_declaration(&mut self) -> Result<Statement, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        self.consume(TokenKind::Assign, "Expect '=' after variable name.")?;
        let initializer = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Statement::VarDecl {
            name: name.lexeme.to_string(),
            initializer,
        })
    }

    // The function name and parameter list are consumed but not retained;
    // the body is lowered to a plain block and the name is not callable.
    fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LParen, "Expect '(' after function name.")?;
        self.consume(TokenKind::RParen, "Expect ')' after function parameters.")?;
        self.consume(TokenKind::LBrace, "Expect '{' before function body.")?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace, "Expect '}' after function body.")?;
        Ok(Statement::Block(body))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::LParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after condition.")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let value = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after return statement.")?;
        Ok(Statement::Return(value))
    }

    fn parse_block(&mut self) -> Result<Statement, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace, "Expect '}' after block.")?;
        Ok(Statement::Block(statements))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.consume(TokenKind::LParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While { condition, body })
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_comparison()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Greater => BinaryOperator::Greater,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                TokenKind::Less => BinaryOperator::Less,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_term()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_factor()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_unary()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    // Prefix minus desugars to `0 - operand`; the operand is a primary,
    // so the minus cannot be stacked.
    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.check(TokenKind::Minus) {
            let token = self.advance();
            let right = self.parse_primary()?;
            return Ok(Expression::Binary {
                left: Box::new(Expression::Literal {
                    text: "0".to_string(),
                    span: token.span,
                }),
                op: BinaryOperator::Sub,
                right: Box::new(right),
                span: token.span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.peek().kind {
            TokenKind::Number => {
                let token = self.advance();
                Ok(Expression::Literal {
                    text: token.lexeme.to_string(),
                    span: token.span,
                })
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expression::Identifier {
                    name: token.lexeme.to_string(),
                    span: token.span,
                })
            }
            _ => Err(self.error_at_current("Expected an expression")),
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token<'a>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.tokens[self.current];
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn error_at_current(&self, message: &str) -> ParseError {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            token.lexeme.to_string()
        };
        ParseError {
            message: message.to_string(),
            found,
            line: token.span.line,
            column: token.span.column,
        }
    }
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}
