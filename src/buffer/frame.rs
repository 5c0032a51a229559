use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// One cached page and its bookkeeping.
///
/// Frames are owned by the buffer pool and handed out behind an `Arc`;
/// a caller holds one only while it holds a pin. The decoded page sits
/// behind its own lock so readers and the flusher can share it.
pub struct BufferFrame {
    page_id: PageId,
    table_name: String,
    page: RwLock<Page>,
    dirty: AtomicBool,
    pin_count: AtomicU32,
    last_accessed: Mutex<Instant>,
}

impl BufferFrame {
    pub fn new(page_id: PageId, table_name: String, page: Page) -> Self {
        Self {
            page_id,
            table_name,
            page: RwLock::new(page),
            dirty: AtomicBool::new(false),
            pin_count: AtomicU32::new(0),
            last_accessed: Mutex::new(Instant::now()),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Read access to the cached page.
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Write access to the cached page. Release the guard before
    /// calling back into the buffer pool; holding it across a pool call
    /// can deadlock against the flusher.
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// A frame is pinned exactly while its pin count is positive.
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Increments the pin count and returns the new value.
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value. Returns None
    /// if the count was already zero; it never goes negative.
    pub fn unpin(&self) -> Option<u32> {
        loop {
            let current = self.pin_count.load(Ordering::Acquire);
            if current == 0 {
                return None;
            }
            if self
                .pin_count
                .compare_exchange(current, current - 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current - 1);
            }
        }
    }

    pub fn last_accessed(&self) -> Instant {
        *self.last_accessed.lock()
    }

    /// Stamps the frame with the current time.
    pub fn touch(&self) {
        *self.last_accessed.lock() = Instant::now();
    }
}
