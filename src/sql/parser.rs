use crate::common::{Result, StrataError};
use crate::tuple::DataType;

use super::statement::{ColumnDef, Literal, Projection, Statement};
use super::token::{Keyword, Token};
use super::tokenizer::Tokenizer;

/// Recursive-descent parser over the fixed four-statement grammar:
///
/// ```sql
/// CREATE TABLE <name> (<col> <type>, ...);
/// DROP TABLE <name>;
/// INSERT INTO <name> VALUES (<literal>, ...);
/// SELECT <cols | *> FROM <name>;
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parses an input string into a list of statements, each terminated by
/// a semicolon.
pub fn parse(input: &str) -> Result<Vec<Statement>> {
    Parser::new(input)?.parse_statements()
}

impl Parser {
    pub fn new(input: &str) -> Result<Self> {
        let tokens = Tokenizer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn parse_statements(mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        while *self.peek() != Token::Eof {
            statements.push(self.parse_statement()?);
            self.expect(&Token::SemiColon)?;
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.next() {
            Token::Keyword(Keyword::Create) => self.parse_create_table(),
            Token::Keyword(Keyword::Drop) => self.parse_drop_table(),
            Token::Keyword(Keyword::Insert) => self.parse_insert(),
            Token::Keyword(Keyword::Select) => self.parse_select(),
            other => Err(unexpected("a statement", &other)),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect(&Token::Keyword(Keyword::Table))?;
        let table = self.expect_identifier()?;
        self.expect(&Token::LeftParen)?;

        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let data_type = self.parse_data_type()?;
            columns.push(ColumnDef { name, data_type });

            if !self.advance_if(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RightParen)?;

        Ok(Statement::CreateTable { table, columns })
    }

    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.expect(&Token::Keyword(Keyword::Table))?;
        let table = self.expect_identifier()?;
        Ok(Statement::DropTable { table })
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect(&Token::Keyword(Keyword::Into))?;
        let table = self.expect_identifier()?;
        self.expect(&Token::Keyword(Keyword::Values))?;
        self.expect(&Token::LeftParen)?;

        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if !self.advance_if(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RightParen)?;

        Ok(Statement::Insert { table, values })
    }

    fn parse_select(&mut self) -> Result<Statement> {
        let projection = if self.advance_if(&Token::Asterisk) {
            Projection::All
        } else {
            let mut columns = vec![self.expect_identifier()?];
            while self.advance_if(&Token::Comma) {
                columns.push(self.expect_identifier()?);
            }
            Projection::Columns(columns)
        };

        self.expect(&Token::Keyword(Keyword::From))?;
        let table = self.expect_identifier()?;

        Ok(Statement::Select { projection, table })
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        match self.next() {
            Token::Keyword(Keyword::Int) => Ok(DataType::Int32),
            Token::Keyword(Keyword::Text) => Ok(DataType::Text),
            other => Err(unexpected("a column type", &other)),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.next() {
            Token::Number(n) => parse_int(&n),
            Token::Minus => match self.next() {
                Token::Number(n) => parse_int(&format!("-{}", n)),
                other => Err(unexpected("a number", &other)),
            },
            Token::String(s) => Ok(Literal::Text(s)),
            Token::Keyword(Keyword::Null) => Ok(Literal::Null),
            other => Err(unexpected("a literal", &other)),
        }
    }

    fn peek(&self) -> &Token {
        // The tokenizer always terminates the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn advance_if(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        let found = self.next();
        if &found == expected {
            Ok(())
        } else {
            Err(StrataError::Syntax(format!(
                "expected {}, found {}",
                expected, found
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.next() {
            Token::Identifier(ident) => Ok(ident),
            other => Err(unexpected("an identifier", &other)),
        }
    }
}

fn parse_int(text: &str) -> Result<Literal> {
    text.parse::<i32>()
        .map(Literal::Int)
        .map_err(|_| StrataError::Syntax(format!("integer literal '{}' out of range", text)))
}

fn unexpected(expected: &str, found: &Token) -> StrataError {
    StrataError::Syntax(format!("expected {}, found {}", expected, found))
}
