use crate::common::{Result, StrataError, TUPLE_HEADER_SIZE};

use super::schema::null_bitmap_size;
use super::{Column, Value};

/// A row is one value per table column, in schema order.
pub type Row = Vec<Value>;

/// The on-disk form of one row.
///
/// Layout: `length: u32 | null_bitmap_size: u32 | null_bitmap | payload`,
/// all integers big-endian. `length` covers the whole tuple including
/// the two fixed fields. Bit `i` of the bitmap set means column `i` is
/// null and contributes no payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTuple {
    pub length: u32,
    pub null_bitmap_size: u32,
    pub null_bitmap: Vec<u8>,
    pub payload: Vec<u8>,
}

impl RawTuple {
    /// Serializes the tuple into exactly `length` bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.length as usize);
        data.extend_from_slice(&self.length.to_be_bytes());
        data.extend_from_slice(&self.null_bitmap_size.to_be_bytes());
        data.extend_from_slice(&self.null_bitmap);
        data.extend_from_slice(&self.payload);
        data
    }

    /// Deserializes a tuple from the start of `data`.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < TUPLE_HEADER_SIZE {
            return Err(StrataError::InsufficientData("tuple header"));
        }

        let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let bitmap_size = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

        if (length as usize) < TUPLE_HEADER_SIZE + bitmap_size as usize {
            return Err(StrataError::InvalidLength("tuple"));
        }
        if data.len() < length as usize {
            return Err(StrataError::InsufficientData("tuple"));
        }

        let bitmap_end = TUPLE_HEADER_SIZE + bitmap_size as usize;
        Ok(Self {
            length,
            null_bitmap_size: bitmap_size,
            null_bitmap: data[TUPLE_HEADER_SIZE..bitmap_end].to_vec(),
            payload: data[bitmap_end..length as usize].to_vec(),
        })
    }

    /// Returns whether bit `index` of the null bitmap is set.
    pub fn is_null(&self, index: usize) -> bool {
        let byte = index / 8;
        let bit = index % 8;
        self.null_bitmap
            .get(byte)
            .map(|b| b & (1 << bit) != 0)
            .unwrap_or(false)
    }
}

/// Converts a row into its on-disk tuple form. The bitmap is sized from
/// the row's column count, so empty rows and rows beyond the 32-column
/// limit are rejected.
pub fn row_to_tuple(row: &Row) -> Result<RawTuple> {
    let bitmap_size = null_bitmap_size(row.len())?;

    let mut bitmap = vec![0u8; bitmap_size];
    let mut payload = Vec::new();
    for (i, value) in row.iter().enumerate() {
        if value.is_null() {
            bitmap[i / 8] |= 1 << (i % 8);
        } else {
            payload.extend_from_slice(&value.serialize());
        }
    }

    Ok(RawTuple {
        length: (TUPLE_HEADER_SIZE + bitmap_size + payload.len()) as u32,
        null_bitmap_size: bitmap_size as u32,
        null_bitmap: bitmap,
        payload,
    })
}

/// Converts an on-disk tuple back into a row. The schema supplies the
/// column order and types; null columns are read from the bitmap and
/// consume no payload bytes.
pub fn tuple_to_row(tuple: &RawTuple, columns: &[Column]) -> Result<Row> {
    let mut row = Row::with_capacity(columns.len());
    let mut offset = 0usize;

    for (i, column) in columns.iter().enumerate() {
        if tuple.is_null(i) {
            row.push(Value::Null);
            continue;
        }

        let (value, consumed) = Value::deserialize(&tuple.payload[offset..], column.data_type())?;
        offset += consumed;
        row.push(value);
    }

    Ok(row)
}
