//! Strata - an embedded relational storage engine
//!
//! Tables persist as on-disk files organized into fixed-size 4 KB
//! pages. Reads and writes go through an in-memory page cache with an
//! LRU-K replacement policy and a background flusher that writes dirty
//! pages back once per second.
//!
//! # Architecture
//!
//! - **Tuple layer** (`tuple`): column types, typed values, schemas and
//!   the tuple binary format (null bitmap + payload).
//! - **Storage layer** (`storage`): the slotted-page codec and the
//!   `DiskManager`, which owns the on-disk layout - a global catalog
//!   plus `.meta`, `.dir` and `.data` files per table.
//! - **Buffer pool** (`buffer`): `BufferPool` caches decoded pages in
//!   pinned frames, tracks dirty state and evicts through
//!   `LruKReplacer`; a background thread flushes dirty frames.
//! - **SQL front-end** (`sql`): tokenizer and recursive-descent parser
//!   for the four-statement dialect.
//! - **Execution** (`execution`): `Executor` translates statements into
//!   buffer pool calls and renders query results.
//!
//! # Example
//!
//! ```rust,no_run
//! use strata::buffer::BufferPool;
//! use strata::execution::Executor;
//! use strata::sql::parse;
//!
//! let pool = BufferPool::new(".", 64, 2).unwrap();
//! let executor = Executor::new(pool);
//!
//! for statement in parse("CREATE TABLE users (id INT, name TEXT);").unwrap() {
//!     executor.execute(statement).unwrap();
//! }
//!
//! for statement in parse("INSERT INTO users VALUES (1, 'ada');").unwrap() {
//!     executor.execute(statement).unwrap();
//! }
//!
//! let select = parse("SELECT * FROM users;").unwrap().remove(0);
//! let result = executor.execute(select).unwrap().unwrap();
//! println!("{}", result);
//! ```

pub mod buffer;
pub mod common;
pub mod execution;
pub mod sql;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{PageId, Result, StrataError};
pub use tuple::{Column, DataType, Row, Value};
