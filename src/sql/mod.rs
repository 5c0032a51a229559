mod parser;
mod statement;
mod token;
mod tokenizer;

pub use parser::{parse, Parser};
pub use statement::{ColumnDef, Literal, Projection, Statement};
pub use token::{Keyword, Token};
pub use tokenizer::Tokenizer;
