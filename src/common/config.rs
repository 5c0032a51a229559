use std::time::Duration;

/// Size of a page in bytes (4 KB).
///
/// Disk reads and writes happen in blocks of roughly this size on most
/// devices, so the page size matches the block size.
pub const PAGE_SIZE: usize = 4096;

/// Size of the page header in bytes.
pub const PAGE_HEADER_SIZE: usize = 16;

/// Size of one slot entry in bytes (offset + length + flags).
pub const SLOT_SIZE: usize = 12;

/// First valid page id; page ids grow by one from here. Zero is reserved
/// as the invalid id.
pub const PAGE_INITIAL_ID: u32 = 1;

/// Maximum length of a table name in bytes.
pub const TABLE_NAME_MAX_LEN: usize = 32;

/// Maximum length of a column name in bytes.
pub const COLUMN_NAME_MAX_LEN: usize = 32;

/// Maximum number of columns in a table.
pub const MAX_TABLE_COLUMNS: usize = 32;

// Magic numbers. Each file type starts with its own fixed 32-bit value,
// validated whenever the file is opened.
pub const META_FILE_MAGIC: u32 = 0x9ABC_DEF0;
pub const PAGE_DIRECTORY_MAGIC: u32 = 0x8ABC_DEF1;
pub const DATA_FILE_MAGIC: u32 = 0x1234_5678;
pub const CATALOG_MAGIC: u32 = 0x7ABC_DEF2;

/// Size of the catalog file header in bytes.
pub const CATALOG_HEADER_SIZE: usize = 4;

/// Size of one catalog entry in bytes (name length + padded name + file id).
pub const CATALOG_ENTRY_SIZE: usize = 40;

/// Size of the meta file header in bytes (magic + name length +
/// column count + padded name + next row id).
pub const META_HEADER_SIZE: usize = 52;

/// Size of one serialized column record in the meta file.
pub const COLUMN_INFO_SIZE: usize = 56;

/// Size of the page directory file header in bytes.
pub const PAGE_DIRECTORY_HEADER_SIZE: usize = 12;

/// Size of one page directory entry in bytes.
pub const PAGE_DIRECTORY_ENTRY_SIZE: usize = 12;

/// Size of the data file header in bytes.
pub const DATA_FILE_HEADER_SIZE: usize = 12;

/// Size of the two fixed tuple header fields (length + null bitmap size).
pub const TUPLE_HEADER_SIZE: usize = 8;

/// Default K value for the LRU-K replacement policy.
pub const DEFAULT_LRUK_K: usize = 2;

/// Default buffer pool capacity (number of frames).
pub const DEFAULT_POOL_SIZE: usize = 64;

/// How often the background flusher wakes up to write dirty frames.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);
