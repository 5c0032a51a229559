use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::common::{
    PageId, Result, StrataError, DATA_FILE_HEADER_SIZE, PAGE_SIZE,
};
use crate::storage::page::{Page, RawPage};
use crate::tuple::Column;

use super::catalog::TableCatalog;
use super::data_file::DataFileHeader;
use super::directory::PageDirectory;
use super::meta::TableMeta;

/// Stateless facade over the filesystem.
///
/// All files live under `<root>/tables/`: the global catalog at
/// `tables/list/table_list.bin` and, per table, `<name>.meta`,
/// `<name>.dir` and `<name>.data`. The root is an instance field so
/// callers (and tests) choose where the database lives; file handles
/// are opened per operation and closed on drop.
pub struct DiskManager {
    root: PathBuf,
}

impl DiskManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tables_dir(&self) -> PathBuf {
        self.root.join("tables")
    }

    fn catalog_path(&self) -> PathBuf {
        self.tables_dir().join("list").join("table_list.bin")
    }

    fn meta_path(&self, table: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.meta", table))
    }

    fn directory_path(&self, table: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.dir", table))
    }

    fn data_path(&self, table: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.data", table))
    }

    fn page_offset(page_id: PageId) -> u64 {
        DATA_FILE_HEADER_SIZE as u64 + (page_id.as_u32() as u64 - 1) * PAGE_SIZE as u64
    }

    // ========================== Database ==========================

    /// Creates the catalog file with only its header. Not idempotent:
    /// an existing catalog is an error.
    pub fn create_database(&self) -> Result<()> {
        let path = self.catalog_path();
        if path.exists() {
            return Err(StrataError::DatabaseAlreadyExists);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, TableCatalog::new().serialize())?;

        debug!("created database catalog at {}", path.display());
        Ok(())
    }

    /// Whether the catalog file is present.
    pub fn database_exists(&self) -> bool {
        self.catalog_path().exists()
    }

    pub fn read_catalog(&self) -> Result<TableCatalog> {
        let data = fs::read(self.catalog_path())?;
        TableCatalog::deserialize(&data)
    }

    fn write_catalog(&self, catalog: &TableCatalog) -> Result<()> {
        fs::write(self.catalog_path(), catalog.serialize())?;
        Ok(())
    }

    // ========================== Tables ==========================

    /// Creates the three table files with initialized headers and adds
    /// a catalog entry with a fresh `file_id`. No data page is created;
    /// the table starts with zero pages.
    pub fn create_table(&self, table: &str, columns: Vec<Column>) -> Result<()> {
        // Validates the name and column limits before any file exists.
        let meta = TableMeta::new(table, columns)?;

        for path in [
            self.meta_path(table),
            self.directory_path(table),
            self.data_path(table),
        ] {
            if path.exists() {
                return Err(StrataError::TableAlreadyExists(table.to_string()));
            }
        }

        fs::write(self.meta_path(table), meta.serialize())?;
        fs::write(self.directory_path(table), PageDirectory::new().serialize())?;
        fs::write(self.data_path(table), DataFileHeader::new().serialize())?;

        let mut catalog = self.read_catalog()?;
        let file_id = catalog.len() as u32 + 1;
        catalog.tables.insert(table.to_string(), file_id);
        self.write_catalog(&catalog)?;

        debug!("created table {} (file_id {})", table, file_id);
        Ok(())
    }

    /// Removes the three table files and the catalog entry. Any missing
    /// file is corruption and reported as not found.
    pub fn drop_table(&self, table: &str) -> Result<()> {
        for path in [
            self.meta_path(table),
            self.directory_path(table),
            self.data_path(table),
        ] {
            if !path.exists() {
                return Err(StrataError::TableNotFound(table.to_string()));
            }
            fs::remove_file(path)?;
        }

        let mut catalog = self.read_catalog()?;
        catalog.tables.remove(table);
        self.write_catalog(&catalog)?;

        debug!("dropped table {}", table);
        Ok(())
    }

    // ========================== Meta ==========================

    pub fn read_meta(&self, table: &str) -> Result<TableMeta> {
        let path = self.meta_path(table);
        if !path.exists() {
            return Err(StrataError::TableNotFound(table.to_string()));
        }
        TableMeta::deserialize(&fs::read(path)?)
    }

    pub fn write_meta(&self, table: &str, meta: &TableMeta) -> Result<()> {
        let path = self.meta_path(table);
        if !path.exists() {
            return Err(StrataError::TableNotFound(table.to_string()));
        }
        fs::write(path, meta.serialize())?;
        Ok(())
    }

    // ========================== Page directory ==========================

    pub fn read_directory(&self, table: &str) -> Result<PageDirectory> {
        let path = self.directory_path(table);
        if !path.exists() {
            return Err(StrataError::TableNotFound(table.to_string()));
        }
        PageDirectory::deserialize(&fs::read(path)?)
    }

    pub fn write_directory(&self, table: &str, directory: &PageDirectory) -> Result<()> {
        let path = self.directory_path(table);
        if !path.exists() {
            return Err(StrataError::TableNotFound(table.to_string()));
        }
        fs::write(path, directory.serialize())?;
        Ok(())
    }

    // ========================== Data header ==========================

    pub fn read_data_header(&self, table: &str) -> Result<DataFileHeader> {
        let path = self.data_path(table);
        if !path.exists() {
            return Err(StrataError::TableNotFound(table.to_string()));
        }

        let mut file = File::open(path)?;
        let mut buf = [0u8; DATA_FILE_HEADER_SIZE];
        file.read_exact(&mut buf)
            .map_err(|e| map_eof(e, "data file header"))?;
        DataFileHeader::deserialize(&buf)
    }

    pub fn write_data_header(&self, table: &str, header: &DataFileHeader) -> Result<()> {
        let path = self.data_path(table);
        if !path.exists() {
            return Err(StrataError::TableNotFound(table.to_string()));
        }

        let mut file = OpenOptions::new().write(true).open(path)?;
        file.write_all(&header.serialize())?;
        file.flush()?;
        Ok(())
    }

    // ========================== Pages ==========================

    /// Reads one page and decodes it against the table's schema. The
    /// page id must be in `[1, pages_count]`.
    pub fn read_page(&self, table: &str, page_id: PageId) -> Result<Page> {
        let header = self.read_data_header(table)?;
        if page_id.is_invalid() || page_id.as_u32() > header.pages_count {
            return Err(StrataError::PageOutOfRange(page_id));
        }

        let mut file = File::open(self.data_path(table))?;
        file.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
        let mut buf = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut buf).map_err(|e| map_eof(e, "page"))?;

        let raw = RawPage::deserialize(&buf)?;
        let meta = self.read_meta(table)?;
        Page::from_raw(raw, meta.columns)
    }

    /// Encodes and writes one page at its offset.
    pub fn write_page(&self, table: &str, page_id: PageId, page: &Page) -> Result<()> {
        let header = self.read_data_header(table)?;
        if page_id.is_invalid() || page_id.as_u32() > header.pages_count {
            return Err(StrataError::PageOutOfRange(page_id));
        }

        let bytes = page.to_raw()?.serialize();
        let mut file = OpenOptions::new().write(true).open(self.data_path(table))?;
        file.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }

    /// Appends one initialized page to the data file and persists the
    /// incremented `pages_count`. The caller-supplied id must be the
    /// natural next id, i.e. equal `pages_count` after the increment.
    pub fn add_new_page(&self, table: &str, page_id: PageId) -> Result<Page> {
        let mut header = self.read_data_header(table)?;
        header.pages_count += 1;
        if page_id.as_u32() != header.pages_count {
            return Err(StrataError::PageOutOfRange(page_id));
        }

        let raw = RawPage::new(page_id);
        let mut file = OpenOptions::new().write(true).open(self.data_path(table))?;
        file.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
        file.write_all(&raw.serialize())?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header.serialize())?;
        file.flush()?;

        debug!("added page {} to table {}", page_id, table);

        let meta = self.read_meta(table)?;
        Ok(Page::new(page_id, meta.columns))
    }
}

fn map_eof(e: std::io::Error, what: &'static str) -> StrataError {
    if e.kind() == ErrorKind::UnexpectedEof {
        StrataError::InsufficientData(what)
    } else {
        StrataError::Io(e)
    }
}
