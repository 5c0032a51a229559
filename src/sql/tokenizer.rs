use std::iter::Peekable;
use std::str::Chars;

use crate::common::{Result, StrataError};

use super::token::{Keyword, Token};

/// Splits a statement string into tokens.
///
/// Identifiers are lowered here, which makes the whole dialect
/// case-insensitive. String literals use single quotes with `''` as the
/// escape for one quote.
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Consumes the whole input, ending the stream with [`Token::Eof`].
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

    fn next_token(&mut self) -> Result<Token> {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&chr) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        match chr {
            '(' => self.consume(Token::LeftParen),
            ')' => self.consume(Token::RightParen),
            ',' => self.consume(Token::Comma),
            ';' => self.consume(Token::SemiColon),
            '*' => self.consume(Token::Asterisk),
            '-' => self.consume(Token::Minus),
            '\'' => self.tokenize_string(),
            c if c.is_ascii_digit() => Ok(self.tokenize_number()),
            c if is_ident_start(c) => Ok(self.tokenize_ident()),
            other => Err(StrataError::Syntax(format!(
                "unexpected character '{}'",
                other
            ))),
        }
    }

    fn consume(&mut self, token: Token) -> Result<Token> {
        self.chars.next();
        Ok(token)
    }

    fn tokenize_string(&mut self) -> Result<Token> {
        self.chars.next(); // opening quote

        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some('\'') => {
                    // Two quotes in a row escape one quote.
                    if self.chars.next_if(|&c| c == '\'').is_some() {
                        value.push('\'');
                    } else {
                        return Ok(Token::String(value));
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(StrataError::Syntax(
                        "unterminated string literal".to_string(),
                    ))
                }
            }
        }
    }

    fn tokenize_number(&mut self) -> Token {
        let mut value = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit()) {
            value.push(c);
        }
        Token::Number(value)
    }

    fn tokenize_ident(&mut self) -> Token {
        let mut value = String::new();
        while let Some(c) = self.chars.next_if(|&c| is_ident_part(c)) {
            value.push(c.to_ascii_lowercase());
        }

        match Keyword::from_lowered(&value) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(value),
        }
    }
}

fn is_ident_start(chr: char) -> bool {
    chr.is_ascii_alphabetic() || chr == '_'
}

fn is_ident_part(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || chr == '_'
}
