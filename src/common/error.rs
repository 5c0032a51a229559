use thiserror::Error;

use super::types::PageId;

/// Database error types
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database already exists")]
    DatabaseAlreadyExists,

    #[error("table {0} already exists")]
    TableAlreadyExists(String),

    #[error("table {0} not found")]
    TableNotFound(String),

    #[error("invalid magic number in {0} file")]
    InvalidMagic(&'static str),

    #[error("insufficient data for {0}")]
    InsufficientData(&'static str),

    #[error("invalid length in {0}")]
    InvalidLength(&'static str),

    #[error("page {0} is out of range")]
    PageOutOfRange(PageId),

    #[error("unsupported column type tag: {0}")]
    UnsupportedType(u32),

    #[error("buffer pool is full, no evictable frames available")]
    NoEvictableFrame,

    #[error("tuple size {tuple_size} exceeds free space {available}")]
    PageOverflow { tuple_size: usize, available: usize },

    #[error("table name '{0}' exceeds the 32 byte limit")]
    TableNameTooLong(String),

    #[error("column name '{0}' exceeds the 32 byte limit")]
    ColumnNameTooLong(String),

    #[error("table must have between 1 and 32 columns, got {0}")]
    InvalidColumnCount(usize),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StrataError>;
