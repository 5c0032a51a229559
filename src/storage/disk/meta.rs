use crate::common::{
    Result, StrataError, COLUMN_INFO_SIZE, COLUMN_NAME_MAX_LEN, META_FILE_MAGIC,
    META_HEADER_SIZE, TABLE_NAME_MAX_LEN,
};
use crate::tuple::{Column, DataType, Schema};

/// Fixed 52-byte meta file header: magic, name length, column count,
/// the table name zero-padded to 32 bytes, and the auto-increment
/// cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaHeader {
    pub table_name: String,
    pub column_count: u32,
    pub next_row_id: u64,
}

impl MetaHeader {
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = vec![0u8; META_HEADER_SIZE];
        let name = self.table_name.as_bytes();
        data[..4].copy_from_slice(&META_FILE_MAGIC.to_be_bytes());
        data[4..8].copy_from_slice(&(name.len() as u32).to_be_bytes());
        data[8..12].copy_from_slice(&self.column_count.to_be_bytes());
        data[12..12 + name.len()].copy_from_slice(name);
        data[44..52].copy_from_slice(&self.next_row_id.to_be_bytes());
        data
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < META_HEADER_SIZE {
            return Err(StrataError::InsufficientData("meta header"));
        }
        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != META_FILE_MAGIC {
            return Err(StrataError::InvalidMagic("meta"));
        }

        let name_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
        if name_len > TABLE_NAME_MAX_LEN {
            return Err(StrataError::InvalidLength("meta table name"));
        }
        let column_count = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let table_name = String::from_utf8_lossy(&data[12..12 + name_len]).into_owned();
        let next_row_id = u64::from_be_bytes(data[44..52].try_into().unwrap());

        Ok(Self {
            table_name,
            column_count,
            next_row_id,
        })
    }
}

/// Encodes one column into its 56-byte meta file record: name length,
/// type tag, the four flag words, and the name zero-padded to 32 bytes.
pub fn encode_column(column: &Column) -> Vec<u8> {
    let mut data = vec![0u8; COLUMN_INFO_SIZE];
    let name = column.name().as_bytes();
    data[..4].copy_from_slice(&(name.len() as u32).to_be_bytes());
    data[4..8].copy_from_slice(&column.data_type().type_id().to_be_bytes());
    data[8..12].copy_from_slice(&(column.is_nullable() as u32).to_be_bytes());
    data[12..16].copy_from_slice(&(column.is_primary_key() as u32).to_be_bytes());
    data[16..20].copy_from_slice(&(column.is_auto_increment() as u32).to_be_bytes());
    data[20..24].copy_from_slice(&column.default_value().to_be_bytes());
    data[24..24 + name.len()].copy_from_slice(name);
    data
}

/// Decodes a 56-byte column record.
pub fn decode_column(data: &[u8]) -> Result<Column> {
    if data.len() < COLUMN_INFO_SIZE {
        return Err(StrataError::InsufficientData("column info"));
    }

    let name_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if name_len > COLUMN_NAME_MAX_LEN {
        return Err(StrataError::InvalidLength("column name"));
    }
    let type_id = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    let data_type = DataType::from_type_id(type_id)?;
    let nullable = u32::from_be_bytes([data[8], data[9], data[10], data[11]]) != 0;
    let primary_key = u32::from_be_bytes([data[12], data[13], data[14], data[15]]) != 0;
    let auto_increment = u32::from_be_bytes([data[16], data[17], data[18], data[19]]) != 0;
    let default_value = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    let name = String::from_utf8_lossy(&data[24..24 + name_len]).into_owned();

    Ok(Column::with_attributes(
        name,
        data_type,
        nullable,
        primary_key,
        auto_increment,
        default_value,
    ))
}

/// The meta file's in-memory form: header plus one record per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub header: MetaHeader,
    pub columns: Vec<Column>,
}

impl TableMeta {
    /// Builds the meta for a new table, validating the name and column
    /// limits.
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let table_name = table_name.into();
        if table_name.len() > TABLE_NAME_MAX_LEN {
            return Err(StrataError::TableNameTooLong(table_name));
        }
        // Schema construction enforces the column count and name limits.
        let schema = Schema::new(columns)?;
        let columns = schema.columns().to_vec();

        Ok(Self {
            header: MetaHeader {
                table_name,
                column_count: columns.len() as u32,
                next_row_id: 0,
            },
            columns,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            META_HEADER_SIZE + self.columns.len() * COLUMN_INFO_SIZE,
        );
        data.extend_from_slice(&self.header.serialize());
        for column in &self.columns {
            data.extend_from_slice(&encode_column(column));
        }
        data
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let header = MetaHeader::deserialize(data)?;

        let mut columns = Vec::with_capacity(header.column_count as usize);
        for i in 0..header.column_count as usize {
            let start = META_HEADER_SIZE + i * COLUMN_INFO_SIZE;
            let end = start + COLUMN_INFO_SIZE;
            if data.len() < end {
                return Err(StrataError::InsufficientData("column info"));
            }
            columns.push(decode_column(&data[start..end])?);
        }

        Ok(Self { header, columns })
    }
}
