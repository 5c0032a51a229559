use std::fmt;

use crate::common::{Result, StrataError};

use super::DataType;

/// A typed cell value stored in a row.
///
/// Null carries no bytes on disk; the tuple's null bitmap records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int32(i32),
    Text(String),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value can be stored in a column of the given
    /// type. Null is compatible with every type; nullability is checked
    /// separately against the column definition.
    pub fn matches_type(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::Int32(_), DataType::Int32) => true,
            (Value::Text(_), DataType::Text) => true,
            _ => false,
        }
    }

    /// Returns the number of payload bytes this value serializes to.
    pub fn size(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Int32(_) => 4,
            Value::Text(s) => 4 + s.len(),
        }
    }

    /// Serializes the value into its tuple payload form. Null values
    /// produce no bytes.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Int32(v) => (*v as u32).to_be_bytes().to_vec(),
            Value::Text(s) => {
                let mut data = Vec::with_capacity(4 + s.len());
                data.extend_from_slice(&(s.len() as u32).to_be_bytes());
                data.extend_from_slice(s.as_bytes());
                data
            }
        }
    }

    /// Deserializes a value of the given type from the start of `data`.
    /// Returns the value and the number of bytes consumed.
    pub fn deserialize(data: &[u8], data_type: DataType) -> Result<(Self, usize)> {
        match data_type {
            DataType::Int32 => {
                if data.len() < 4 {
                    return Err(StrataError::InsufficientData("int32 cell"));
                }
                let v = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as i32;
                Ok((Value::Int32(v), 4))
            }
            DataType::Text => {
                if data.len() < 4 {
                    return Err(StrataError::InsufficientData("text cell length"));
                }
                let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
                if data.len() < 4 + len {
                    return Err(StrataError::InsufficientData("text cell"));
                }
                let s = String::from_utf8_lossy(&data[4..4 + len]).into_owned();
                Ok((Value::Text(s), 4 + len))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
