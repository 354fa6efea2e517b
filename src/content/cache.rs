use crate::content::keys::{CacheKey, KeyClass};
use crate::content::orchestrator::GenerationCounter;
use crate::content::storage::{KeyValueStore, MemoryStore};
use crate::prelude::{Arc, HashMap, Mutex};
use crate::traits::{CacheStats, CacheValue};
use crate::{Error, Result};
use lru::LruCache;
use std::num::NonZeroUsize;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Two-tier content cache: an LRU of serialized entries in front of a
/// persistent [`KeyValueStore`].
///
/// Entries are stored as JSON. Reads re-validate the shape, and entries that
/// fail to parse or validate are removed from both tiers.
#[derive(Clone)]
pub struct ContentCache {
    memory: Arc<Mutex<LruCache<String, Arc<str>>>>,
    store: Arc<dyn KeyValueStore>,
    stats: Arc<Mutex<CacheStats>>,
    generations: Arc<Mutex<HashMap<KeyClass, GenerationCounter>>>,
}

impl ContentCache {
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
        Self {
            memory: Arc::new(Mutex::new(LruCache::new(capacity))),
            store,
            stats: Arc::new(Mutex::new(CacheStats::default())),
            generations: Arc::new(Mutex::new(HashMap::default())),
        }
    }

    /// Cache over a fresh in-memory store
    pub fn in_memory(capacity: usize) -> Self {
        Self::new(Arc::new(MemoryStore::new()), capacity)
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Reads and validates an entry. Corrupt entries are dropped and read as
    /// a miss.
    pub fn read<T: CacheValue>(&self, key: &CacheKey) -> Option<T> {
        let storage_key = key.storage_key();
        let Some(raw) = self.raw(&storage_key) else {
            self.record(false);
            return None;
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) if value.is_valid() => {
                self.record(true);
                Some(value)
            }
            Ok(_) => {
                log::debug!("discarding cache entry {storage_key}: failed shape check");
                self.evict(&storage_key);
                self.record(false);
                None
            }
            Err(err) => {
                log::debug!("discarding cache entry {storage_key}: {err}");
                self.evict(&storage_key);
                self.record(false);
                None
            }
        }
    }

    /// Validates and writes an entry to both tiers.
    ///
    /// The memory tier is updated even when the persistent write fails.
    pub fn write<T: CacheValue>(&self, key: &CacheKey, value: &T) -> Result<()> {
        let storage_key = key.storage_key();
        if !value.is_valid() {
            return Err(Error::InvalidContent(format!(
                "refusing to cache invalid entry {storage_key}"
            )));
        }

        let raw = serde_json::to_string(value)?;
        if let Ok(mut memory) = self.memory.lock() {
            memory.put(storage_key.clone(), Arc::from(raw.as_str()));
        }
        self.store.set(&storage_key, &raw)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.raw(&key.storage_key()).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().map(|s| *s).unwrap_or_default();
        stats.size = self.memory.lock().map(|m| m.len()).unwrap_or(0);
        stats
    }

    /// Request counter shared by every fetch of one key class over this
    /// cache
    pub fn generations(&self, class: KeyClass) -> GenerationCounter {
        match self.generations.lock() {
            Ok(mut counters) => counters.entry(class).or_default().clone(),
            Err(_) => GenerationCounter::new(),
        }
    }

    fn raw(&self, storage_key: &str) -> Option<Arc<str>> {
        if let Some(raw) = self
            .memory
            .lock()
            .ok()
            .and_then(|mut memory| memory.get(storage_key).cloned())
        {
            return Some(raw);
        }

        match self.store.get(storage_key) {
            Ok(Some(raw)) => {
                let raw: Arc<str> = Arc::from(raw.as_str());
                if let Ok(mut memory) = self.memory.lock() {
                    memory.put(storage_key.to_string(), raw.clone());
                }
                Some(raw)
            }
            Ok(None) => None,
            Err(err) => {
                log::debug!("cache read of {storage_key} failed: {err}");
                None
            }
        }
    }

    fn evict(&self, storage_key: &str) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.pop(storage_key);
        }
        if let Err(err) = self.store.remove(storage_key) {
            log::warn!("failed to remove corrupt entry {storage_key}: {err}");
        }
    }

    fn record(&self, hit: bool) {
        if let Ok(mut stats) = self.stats.lock() {
            if hit {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
