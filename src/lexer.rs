use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

/// Single-pass scanner with one character of lookahead.
///
/// Lexing is total: an unrecognized character becomes a `TokenKind::Error`
/// token rather than aborting, so the scan always runs to the end of the
/// input and always terminates with an `Eof` token.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub fn scan(mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();

        let span = Span {
            line: self.line,
            column: self.column,
        };
        let (start, ch) = match self.chars.peek() {
            Some(&(index, c)) => (index, c),
            None => return Token::new(TokenKind::Eof, "", span),
        };

        match ch {
            '(' => self.single_char(start, TokenKind::LParen, span),
            ')' => self.single_char(start, TokenKind::RParen, span),
            '{' => self.single_char(start, TokenKind::LBrace, span),
            '}' => self.single_char(start, TokenKind::RBrace, span),
            ';' => self.single_char(start, TokenKind::Semicolon, span),
            ',' => self.single_char(start, TokenKind::Comma, span),
            '+' => self.single_char(start, TokenKind::Plus, span),
            '-' => self.single_char(start, TokenKind::Minus, span),
            '*' => self.single_char(start, TokenKind::Star, span),
            '/' => self.single_char(start, TokenKind::Slash, span),
            '=' => self.one_or_two(start, TokenKind::Assign, TokenKind::EqualEqual, span),
            // There is no unary logical negation; '!' is only valid in '!='.
            '!' => self.one_or_two(start, TokenKind::Error, TokenKind::BangEqual, span),
            '<' => self.one_or_two(start, TokenKind::Less, TokenKind::LessEqual, span),
            '>' => self.one_or_two(start, TokenKind::Greater, TokenKind::GreaterEqual, span),
            c if c.is_ascii_digit() => self.read_number(start, span),
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(start, span),
            _ => self.single_char(start, TokenKind::Error, span),
        }
    }

    fn single_char(&mut self, start: usize, kind: TokenKind, span: Span) -> Token<'a> {
        self.advance_char();
        Token::new(kind, self.lexeme_from(start), span)
    }

    fn one_or_two(
        &mut self,
        start: usize,
        single: TokenKind,
        double: TokenKind,
        span: Span,
    ) -> Token<'a> {
        self.advance_char();
        let kind = if matches!(self.chars.peek(), Some(&(_, '='))) {
            self.advance_char();
            double
        } else {
            single
        };
        Token::new(kind, self.lexeme_from(start), span)
    }

    fn read_number(&mut self, start: usize, span: Span) -> Token<'a> {
        self.advance_char(); // Consume first digit
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }

        // A '.' belongs to the number only when a digit follows it;
        // a trailing '.' is left for the next token.
        if matches!(self.chars.peek(), Some(&(_, '.'))) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                self.advance_char(); // Consume the '.'
                while let Some(&(_, c)) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        self.advance_char();
                    } else {
                        break;
                    }
                }
            }
        }

        Token::new(TokenKind::Number, self.lexeme_from(start), span)
    }

    fn read_identifier(&mut self, start: usize, span: Span) -> Token<'a> {
        self.advance_char(); // Consume first char
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let lexeme = self.lexeme_from(start);
        let kind = match lexeme {
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "var" => TokenKind::Var,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, lexeme, span)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance_char();
                }
                _ => break,
            }
        }
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn lexeme_from(&mut self, start: usize) -> &'a str {
        let end = self.current_index();
        &self.input[start..end]
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(index, _)| index)
            .unwrap_or(self.input.len())
    }
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).scan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn whitespace_only_input_produces_a_single_eof() {
        for input in ["", "   ", " \r\t\n \n"] {
            let tokens = tokenize(input);
            assert_eq!(tokens.len(), 1, "input {input:?}");
            assert_eq!(tokens[0].kind, TokenKind::Eof);
            assert_eq!(tokens[0].lexeme, "");
        }
    }

    #[test]
    fn scans_a_simple_program() {
        let input = indoc! {"
            var x = 0;
            if (2 < 3) {
                var x = x + 1;
            }
            return x;
        "};
        let expected = vec![
            TokenKind::Var,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::If,
            TokenKind::LParen,
            TokenKind::Number,
            TokenKind::Less,
            TokenKind::Number,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Var,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Identifier,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Return,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn number_lexeme_covers_the_full_match() {
        let tokens = tokenize("3.14");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "3.14");

        let tokens = tokenize("42");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "42");
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        let tokens = tokenize("1.");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, ".");
    }

    #[test]
    fn keywords_are_reclassified_identifiers() {
        assert_eq!(
            kinds("function if else while return var variable"),
            vec![
                TokenKind::Function,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_character_operators_win_over_single() {
        assert_eq!(
            kinds("= == != < <= > >="),
            vec![
                TokenKind::Assign,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lone_bang_is_an_error_token() {
        let tokens = tokenize("!x");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme, "!");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn unrecognized_characters_become_error_tokens() {
        let tokens = tokenize("var x = 1 @ 2;");
        let error = tokens
            .iter()
            .find(|token| token.kind == TokenKind::Error)
            .expect("expected an error token");
        assert_eq!(error.lexeme, "@");
    }

    #[test]
    fn tracks_line_and_column_positions() {
        let tokens = tokenize("var x;\n  return x;");
        assert_eq!(tokens[0].span, Span { line: 1, column: 1 }); // var
        assert_eq!(tokens[1].span, Span { line: 1, column: 5 }); // x
        assert_eq!(tokens[3].span, Span { line: 2, column: 3 }); // return
        let eof = tokens.last().expect("token stream is never empty");
        assert_eq!(eof.span, Span { line: 2, column: 12 });
    }
}
