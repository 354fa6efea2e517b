//! Generated content: storage, caching and the cache-or-fetch protocol

pub mod cache;
pub mod dispatch;
pub mod keys;
pub mod markdown;
pub mod orchestrator;
pub mod storage;

pub use cache::ContentCache;
pub use dispatch::FetchDispatcher;
pub use keys::{CacheKey, KeyClass};
pub use markdown::render_markdown;
pub use orchestrator::{CacheFetch, Commit, GenerationCounter, Ticket, ViewState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
