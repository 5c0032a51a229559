mod buffer_pool;
mod flusher;
mod frame;
mod lru_k_replacer;

pub use buffer_pool::{BufferPool, TableInfo};
pub use frame::BufferFrame;
pub use lru_k_replacer::LruKReplacer;
