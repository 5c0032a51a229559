use std::fmt;

use crate::buffer::BufferPool;
use crate::common::{
    PageId, Result, StrataError, PAGE_HEADER_SIZE, PAGE_SIZE, SLOT_SIZE,
};
use crate::sql::{ColumnDef, Literal, Projection, Statement};
use crate::tuple::{row_to_tuple, Column, Row, Schema, Value};

/// The rows a SELECT produced, with the projected column names.
///
/// `Display` renders an aligned text table followed by a row count,
/// which is what the console prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let separator = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            for width in &widths {
                write!(f, "+{}", "-".repeat(width + 2))?;
            }
            writeln!(f, "+")
        };

        separator(f)?;
        for (i, column) in self.columns.iter().enumerate() {
            write!(f, "| {:<width$} ", column, width = widths[i])?;
        }
        writeln!(f, "|")?;
        separator(f)?;
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                write!(f, "| {:<width$} ", cell, width = widths[i])?;
            }
            writeln!(f, "|")?;
        }
        separator(f)?;
        write!(f, "({} rows)", self.rows.len())
    }
}

/// Translates parsed statements into buffer pool calls.
///
/// Every page access pins the frame through `get_page`/`add_new_page`
/// and unpins exactly once, with page guards released before the pool
/// is re-entered.
pub struct Executor {
    pool: BufferPool,
}

impl Executor {
    pub fn new(pool: BufferPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Runs one statement. DDL and INSERT return `None`; SELECT returns
    /// the collected rows.
    pub fn execute(&self, statement: Statement) -> Result<Option<QueryResult>> {
        match statement {
            Statement::CreateTable { table, columns } => {
                self.create_table(&table, columns)?;
                Ok(None)
            }
            Statement::DropTable { table } => {
                self.pool.drop_table(&table)?;
                Ok(None)
            }
            Statement::Insert { table, values } => {
                self.insert(&table, values)?;
                Ok(None)
            }
            Statement::Select { projection, table } => {
                Ok(Some(self.select(&table, projection)?))
            }
        }
    }

    fn create_table(&self, table: &str, defs: Vec<ColumnDef>) -> Result<()> {
        let columns = defs
            .into_iter()
            .map(|def| Column::new(def.name, def.data_type))
            .collect();
        self.pool.create_table(table, columns)
    }

    fn insert(&self, table: &str, values: Vec<Literal>) -> Result<()> {
        let mut info = self.pool.read_meta(table)?;
        let columns = info.meta.columns.clone();

        if values.len() != columns.len() {
            return Err(StrataError::Validation(format!(
                "table {} has {} columns but {} values were supplied",
                table,
                columns.len(),
                values.len()
            )));
        }

        let mut next_row_id = info.meta.header.next_row_id;
        let mut row = Row::with_capacity(columns.len());
        for (literal, column) in values.into_iter().zip(&columns) {
            row.push(coerce(literal, column, &mut next_row_id)?);
        }

        // Size the tuple up front so page placement can be decided. A
        // row must fit in one page; there is no spanning.
        let tuple_size = row_to_tuple(&row)?.length as usize;
        if tuple_size + SLOT_SIZE > PAGE_SIZE - PAGE_HEADER_SIZE {
            return Err(StrataError::Validation(format!(
                "row of {} bytes does not fit in one page",
                tuple_size
            )));
        }

        let mut pages_count = info.data_header.pages_count;
        let frame = if pages_count == 0 {
            pages_count = 1;
            let frame = self.pool.add_new_page(table, PageId::new(1))?;
            info.directory.push_page(1, frame.page().free_space() as u32);
            frame
        } else {
            let last = PageId::new(pages_count);
            let frame = self.pool.get_page(table, last)?;
            if frame.page().can_insert(tuple_size) {
                frame
            } else {
                self.pool.unpin(table, last);
                pages_count += 1;
                let next = PageId::new(pages_count);
                let frame = self.pool.add_new_page(table, next)?;
                info.directory
                    .push_page(pages_count, frame.page().free_space() as u32);
                frame
            }
        };

        let page_id = frame.page_id();
        let inserted = {
            let mut page = frame.page_mut();
            page.insert_row(row).map(|_| page.free_space())
        };
        let free_space = match inserted {
            Ok(free_space) => free_space,
            Err(e) => {
                self.pool.unpin(table, page_id);
                return Err(e);
            }
        };
        self.pool.mark_dirty(table, page_id);
        self.pool.unpin(table, page_id);

        if let Some(entry) = info.directory.entry_mut(page_id.as_u32()) {
            entry.free_space = free_space as u32;
        }
        info.data_header.pages_count = pages_count;
        info.data_header.record_count += 1;
        info.meta.header.next_row_id = next_row_id;
        self.pool.write_meta(table, info)
    }

    fn select(&self, table: &str, projection: Projection) -> Result<QueryResult> {
        let info = self.pool.read_meta(table)?;
        let schema = Schema::new(info.meta.columns.clone())?;

        let indexes: Vec<usize> = match &projection {
            Projection::All => (0..schema.column_count()).collect(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| {
                    schema.column_index(name).ok_or_else(|| {
                        StrataError::Validation(format!(
                            "column {} does not exist in table {}",
                            name, table
                        ))
                    })
                })
                .collect::<Result<_>>()?,
        };

        let mut rows = Vec::new();
        for page_number in 1..=info.data_header.pages_count {
            let page_id = PageId::new(page_number);
            let frame = self.pool.get_page(table, page_id)?;
            {
                let page = frame.page();
                for row in page.live_rows() {
                    rows.push(indexes.iter().map(|&i| row[i].clone()).collect());
                }
            }
            self.pool.unpin(table, page_id);
        }

        Ok(QueryResult {
            columns: indexes
                .iter()
                .filter_map(|&i| schema.column(i))
                .map(|c| c.name().to_string())
                .collect(),
            rows,
        })
    }
}

/// Checks a literal against its column and produces the stored value.
/// A NULL literal in an auto-increment column draws the next row id.
fn coerce(literal: Literal, column: &Column, next_row_id: &mut u64) -> Result<Value> {
    let value = match literal {
        Literal::Int(v) => Value::Int32(v),
        Literal::Text(s) => Value::Text(s),
        Literal::Null => {
            if column.is_auto_increment() {
                *next_row_id += 1;
                return Ok(Value::Int32(*next_row_id as i32));
            }
            if !column.is_nullable() {
                return Err(StrataError::Validation(format!(
                    "column {} is not nullable",
                    column.name()
                )));
            }
            return Ok(Value::Null);
        }
    };

    if !value.matches_type(column.data_type()) {
        return Err(StrataError::Validation(format!(
            "column {} expects {}",
            column.name(),
            column.data_type()
        )));
    }
    Ok(value)
}
