use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;

use crate::common::{PageId, Result, StrataError, FLUSH_INTERVAL};
use crate::storage::disk::{
    DataFileHeader, DiskManager, PageDirectory, TableCatalog, TableMeta,
};
use crate::tuple::Column;

use super::flusher::Flusher;
use super::frame::BufferFrame;
use super::lru_k_replacer::LruKReplacer;

/// The three decoded control structures of one table, cached for fast
/// reuse. An entry lives exactly as long as the table is in the
/// catalog.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub meta: TableMeta,
    pub directory: PageDirectory,
    pub data_header: DataFileHeader,
}

/// Everything the pool mutates, behind one lock. The flusher thread
/// shares this through an `Arc`, so foreground operations and flush
/// passes serialize against each other.
pub(crate) struct PoolState {
    pub(crate) frames: HashMap<PageId, Arc<BufferFrame>>,
    pub(crate) dirty_pages: HashSet<PageId>,
    pub(crate) pin_counts: HashMap<PageId, u32>,
    pub(crate) replacer: LruKReplacer,
    pub(crate) meta_cache: HashMap<String, TableInfo>,
    pub(crate) catalog: TableCatalog,
}

/// The page cache between the executor and the disk manager.
///
/// Owns the frame table, the dirty set, the shadow pin counts, the
/// LRU-K replacer, the per-table metadata cache, the catalog snapshot
/// and the background flusher.
pub struct BufferPool {
    max_size: usize,
    disk: Arc<DiskManager>,
    state: Arc<Mutex<PoolState>>,
    // Held for its Drop: shutdown and join of the flusher thread.
    _flusher: Flusher,
}

impl BufferPool {
    /// Opens (or initializes) the database under `root` and starts the
    /// background flusher. `max_size` caps the number of resident
    /// frames; `k` is the LRU-K promotion threshold.
    pub fn new(root: impl AsRef<Path>, max_size: usize, k: usize) -> Result<Self> {
        Self::with_flush_interval(root, max_size, k, FLUSH_INTERVAL)
    }

    /// Like [`new`](Self::new) with an explicit flusher tick, which
    /// tests use to keep wall-clock waits short.
    pub fn with_flush_interval(
        root: impl AsRef<Path>,
        max_size: usize,
        k: usize,
        flush_interval: Duration,
    ) -> Result<Self> {
        let disk = Arc::new(DiskManager::new(root));

        // An existing catalog means the database was created by an
        // earlier run; everything else is a real failure.
        match disk.create_database() {
            Ok(()) => info!("initialized database at {}", disk.root().display()),
            Err(StrataError::DatabaseAlreadyExists) => {}
            Err(e) => return Err(e),
        }

        let catalog = disk.read_catalog()?;
        let mut meta_cache = HashMap::with_capacity(catalog.len());
        for table in catalog.tables.keys() {
            meta_cache.insert(table.clone(), read_table_info(&disk, table)?);
        }

        let state = Arc::new(Mutex::new(PoolState {
            frames: HashMap::with_capacity(max_size),
            dirty_pages: HashSet::new(),
            pin_counts: HashMap::new(),
            replacer: LruKReplacer::new(k, max_size),
            meta_cache,
            catalog,
        }));

        let flusher = Flusher::spawn(Arc::clone(&state), Arc::clone(&disk), flush_interval);

        Ok(Self {
            max_size,
            disk,
            state,
            _flusher: flusher,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns a pinned frame for the page, reading it from disk on a
    /// cache miss. Every successful call must be paired with exactly
    /// one [`unpin`](Self::unpin).
    pub fn get_page(&self, table: &str, page_id: PageId) -> Result<Arc<BufferFrame>> {
        let mut state = self.state.lock();

        if let Some(frame) = state.frames.get(&page_id).cloned() {
            state.replacer.access(page_id);
            frame.touch();
            frame.pin();
            *state.pin_counts.entry(page_id).or_insert(0) += 1;
            return Ok(frame);
        }

        if state.frames.len() >= self.max_size {
            self.evict_one(&mut state)?;
        }

        let page = self.disk.read_page(table, page_id)?;

        let frame = Arc::new(BufferFrame::new(page_id, table.to_string(), page));
        frame.pin();
        state.frames.insert(page_id, Arc::clone(&frame));
        state.pin_counts.insert(page_id, 1);
        state.replacer.access(page_id);

        Ok(frame)
    }

    /// Appends a fresh page to the table and installs it as a pinned,
    /// clean frame. The page is durable on disk before any cache
    /// resident is dropped to make room for it.
    pub fn add_new_page(&self, table: &str, page_id: PageId) -> Result<Arc<BufferFrame>> {
        let mut state = self.state.lock();

        let page = self.disk.add_new_page(table, page_id)?;

        if state.frames.len() >= self.max_size {
            self.evict_one(&mut state)?;
        }

        let frame = Arc::new(BufferFrame::new(page_id, table.to_string(), page));
        frame.pin();
        state.frames.insert(page_id, Arc::clone(&frame));
        state.pin_counts.insert(page_id, 1);
        state.replacer.access(page_id);

        Ok(frame)
    }

    /// Flags a resident page for write-back. Silent no-op for pages
    /// that are not resident.
    pub fn mark_dirty(&self, _table: &str, page_id: PageId) {
        let mut state = self.state.lock();
        if let Some(frame) = state.frames.get(&page_id).cloned() {
            frame.set_dirty(true);
            state.dirty_pages.insert(page_id);
        }
    }

    /// Releases one pin on a resident page. The count never goes below
    /// zero; non-resident pages are a silent no-op.
    pub fn unpin(&self, _table: &str, page_id: PageId) {
        let mut state = self.state.lock();
        if let Some(frame) = state.frames.get(&page_id).cloned() {
            frame.unpin();
            if let Some(count) = state.pin_counts.get_mut(&page_id) {
                *count = count.saturating_sub(1);
            }
        }
    }

    /// Creates the table on disk, then caches its control structures
    /// and refreshes the catalog snapshot.
    pub fn create_table(&self, table: &str, columns: Vec<Column>) -> Result<()> {
        let mut state = self.state.lock();

        self.disk.create_table(table, columns)?;

        let info = read_table_info(&self.disk, table)?;
        state.meta_cache.insert(table.to_string(), info);
        state.catalog = self.disk.read_catalog()?;

        Ok(())
    }

    /// Drops the table on disk and forgets its cached control
    /// structures. Resident frames of the table are not proactively
    /// evicted; LRU-K pressure reclaims them.
    pub fn drop_table(&self, table: &str) -> Result<()> {
        let mut state = self.state.lock();

        self.disk.drop_table(table)?;

        state.meta_cache.remove(table);
        state.catalog = self.disk.read_catalog()?;

        Ok(())
    }

    /// Returns the cached control structures of a table.
    pub fn read_meta(&self, table: &str) -> Result<TableInfo> {
        let state = self.state.lock();
        state
            .meta_cache
            .get(table)
            .cloned()
            .ok_or_else(|| StrataError::TableNotFound(table.to_string()))
    }

    /// Replaces the cached control structures and flushes all three to
    /// disk.
    pub fn write_meta(&self, table: &str, info: TableInfo) -> Result<()> {
        let mut state = self.state.lock();

        if !state.meta_cache.contains_key(table) {
            return Err(StrataError::TableNotFound(table.to_string()));
        }

        self.disk.write_meta(table, &info.meta)?;
        self.disk.write_directory(table, &info.directory)?;
        self.disk.write_data_header(table, &info.data_header)?;
        state.meta_cache.insert(table.to_string(), info);

        Ok(())
    }

    /// A snapshot of the catalog as of the last create/drop.
    pub fn catalog(&self) -> TableCatalog {
        self.state.lock().catalog.clone()
    }

    /// Shadow pin count of a page, None when not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.state.lock().pin_counts.get(&page_id).copied()
    }

    /// Whether a page currently sits in the frame table.
    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.state.lock().frames.contains_key(&page_id)
    }

    /// Whether a page is in the dirty set.
    pub fn is_dirty(&self, page_id: PageId) -> bool {
        self.state.lock().dirty_pages.contains(&page_id)
    }

    /// Number of resident frames.
    pub fn resident_count(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Evicts one unpinned frame, writing it back first when dirty.
    /// A failed write-back aborts the eviction: the page stays resident
    /// and dirty, and the I/O error propagates.
    fn evict_one(&self, state: &mut PoolState) -> Result<()> {
        let pin_counts = &state.pin_counts;
        let victim = state
            .replacer
            .choose_victim(Some(&|page_id: PageId| {
                pin_counts.get(&page_id).map_or(false, |&count| count > 0)
            }))
            .ok_or(StrataError::NoEvictableFrame)?;

        // The replacer tracks exactly the resident pages.
        let frame = state
            .frames
            .get(&victim)
            .cloned()
            .ok_or(StrataError::NoEvictableFrame)?;

        if frame.is_dirty() {
            self.disk
                .write_page(frame.table_name(), victim, &frame.page())?;
        }

        state.frames.remove(&victim);
        state.dirty_pages.remove(&victim);
        state.pin_counts.remove(&victim);
        state.replacer.evict(victim);

        debug!("evicted page {}", victim);
        Ok(())
    }
}

fn read_table_info(disk: &DiskManager, table: &str) -> Result<TableInfo> {
    Ok(TableInfo {
        meta: disk.read_meta(table)?,
        directory: disk.read_directory(table)?,
        data_header: disk.read_data_header(table)?,
    })
}
