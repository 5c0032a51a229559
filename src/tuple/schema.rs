use crate::common::{Result, StrataError, COLUMN_NAME_MAX_LEN, MAX_TABLE_COLUMNS};

use super::DataType;

/// A single column definition.
///
/// Beyond the name and type the column carries the flags persisted in
/// the meta file: nullability, primary key, auto increment and a
/// numeric default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: bool,
    primary_key: bool,
    auto_increment: bool,
    default_value: u32,
}

impl Column {
    /// Creates a plain nullable column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            default_value: 0,
        }
    }

    /// Creates a column with every persisted attribute spelled out.
    pub fn with_attributes(
        name: impl Into<String>,
        data_type: DataType,
        nullable: bool,
        primary_key: bool,
        auto_increment: bool,
        default_value: u32,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            primary_key,
            auto_increment,
            default_value,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn default_value(&self) -> u32 {
        self.default_value
    }

    /// Validates the limits the meta file format imposes.
    pub fn validate(&self) -> Result<()> {
        if self.name.len() > COLUMN_NAME_MAX_LEN {
            return Err(StrataError::ColumnNameTooLong(self.name.clone()));
        }
        Ok(())
    }
}

/// Computes the null bitmap size in bytes for a column count: one bit
/// per column, rounded up. Rejects zero columns and anything beyond the
/// 32-column table limit.
pub fn null_bitmap_size(column_count: usize) -> Result<usize> {
    if column_count == 0 || column_count > MAX_TABLE_COLUMNS {
        return Err(StrataError::InvalidColumnCount(column_count));
    }
    Ok((column_count + 7) / 8)
}

/// An ordered set of columns describing one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema, enforcing the column count and name limits.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        null_bitmap_size(columns.len())?;
        for column in &columns {
            column.validate()?;
        }
        Ok(Self { columns })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Size of the null bitmap for this schema. Infallible because the
    /// column count was validated at construction.
    pub fn null_bitmap_size(&self) -> usize {
        (self.columns.len() + 7) / 8
    }
}
