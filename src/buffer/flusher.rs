use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::common::PageId;
use crate::storage::disk::DiskManager;

use super::buffer_pool::PoolState;

/// Background flusher: wakes up once per interval and writes back every
/// frame in the dirty set, clearing the bit on success.
///
/// Shutdown is cooperative. Dropping the flusher sends on the shutdown
/// channel; the worker runs one final flush pass and exits, and the
/// owning thread joins it.
pub(crate) struct Flusher {
    shutdown_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Flusher {
    pub(crate) fn spawn(
        state: Arc<Mutex<PoolState>>,
        disk: Arc<DiskManager>,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let handle = thread::spawn(move || loop {
            match shutdown_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => flush_pass(&state, &disk),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    flush_pass(&state, &disk);
                    break;
                }
            }
        });

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// One pass over the dirty set. Failed writes are logged and left dirty
/// for the next tick.
pub(crate) fn flush_pass(state: &Mutex<PoolState>, disk: &DiskManager) {
    let mut state = state.lock();

    let dirty: Vec<PageId> = state.dirty_pages.iter().copied().collect();
    if !dirty.is_empty() {
        debug!("flushing {} dirty page(s)", dirty.len());
    }

    for page_id in dirty {
        let Some(frame) = state.frames.get(&page_id).cloned() else {
            continue;
        };

        let page_guard = frame.page();
        match disk.write_page(frame.table_name(), page_id, &page_guard) {
            Ok(()) => {
                frame.set_dirty(false);
                state.dirty_pages.remove(&page_id);
            }
            Err(e) => warn!("flush of page {} failed: {}", page_id, e),
        }
    }
}
