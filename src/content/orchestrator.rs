//! Stale-while-revalidate fetching on top of [`ContentCache`].
//!
//! A fetch for key K goes through [`CacheFetch::begin`], which renders any
//! valid cached value straight away (or enters `Loading`), and
//! [`CacheFetch::complete`], which commits the network result. The network
//! call is always made, even on a cache hit. Completions carry the
//! generation they were started with and are dropped once a newer request
//! has begun.

use crate::content::cache::ContentCache;
use crate::content::keys::{CacheKey, KeyClass};
use crate::prelude::{Arc, Future};
use crate::traits::CacheValue;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_FAILURE_MESSAGE: &str =
    "Something went wrong while loading this content. Please try again.";

/// Monotonic request counter shared by every request of one key class
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, invalidating all earlier ones
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// What the view shows for one piece of content
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready {
        content: T,
        /// false while showing a cached value that is being revalidated
        fresh: bool,
    },
    Failed {
        message: String,
    },
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn content(&self) -> Option<&T> {
        match self {
            ViewState::Ready { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ViewState::Failed { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Issued by [`CacheFetch::begin`]; hand it back with the fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: CacheKey,
    pub generation: u64,
    pub had_cache: bool,
}

/// Outcome of committing a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Fresh content rendered (and persisted)
    Fresh,
    /// Fetch failed; the cached content stays on screen
    KeptCache,
    /// Fetch failed with nothing cached; the view shows a retry prompt
    Failed,
    /// A newer request has started; the result was discarded
    Stale,
}

/// One cache-or-fetch view slot for keys of a single [`KeyClass`].
///
/// Slots of the same class over the same cache share one generation
/// counter, so starting a request in any of them makes the others' in-flight
/// results stale.
#[derive(Debug)]
pub struct CacheFetch<T: CacheValue> {
    cache: ContentCache,
    class: KeyClass,
    generations: GenerationCounter,
    state: ViewState<T>,
    current: Option<Ticket>,
    failure_message: String,
}

impl<T: CacheValue> CacheFetch<T> {
    pub fn new(cache: ContentCache, class: KeyClass) -> Self {
        Self {
            generations: cache.generations(class),
            cache,
            class,
            state: ViewState::Idle,
            current: None,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn current_key(&self) -> Option<&CacheKey> {
        self.current.as_ref().map(|ticket| &ticket.key)
    }

    pub fn class(&self) -> KeyClass {
        self.class
    }

    pub fn generations(&self) -> &GenerationCounter {
        &self.generations
    }

    /// Starts a request for `key`: renders a valid cached value or enters
    /// `Loading`. The caller must then run the fetch and pass its result to
    /// [`CacheFetch::complete`].
    pub fn begin(&mut self, key: CacheKey) -> Ticket {
        if key.class() != self.class {
            log::warn!("{key} started in a {:?} slot", self.class);
        }
        let generation = self.generations.advance();
        let cached = self.cache.read::<T>(&key);
        let had_cache = cached.is_some();

        self.state = match cached {
            Some(content) => ViewState::Ready {
                content,
                fresh: false,
            },
            None => ViewState::Loading,
        };

        log::debug!("fetch {key} started (generation {generation}, cached: {had_cache})");
        let ticket = Ticket {
            key,
            generation,
            had_cache,
        };
        self.current = Some(ticket.clone());
        ticket
    }

    /// Commits a fetch result for `ticket`
    pub fn complete(&mut self, ticket: &Ticket, result: Result<T>) -> Commit {
        if !self.generations.is_current(ticket.generation) {
            log::debug!(
                "dropping stale result for {} (generation {}, now {})",
                ticket.key,
                ticket.generation,
                self.generations.current()
            );
            return Commit::Stale;
        }

        let result = result.and_then(|content| {
            if content.is_valid() {
                Ok(content)
            } else {
                Err(Error::InvalidContent(format!("empty result for {}", ticket.key)))
            }
        });

        match result {
            Ok(content) => {
                if let Err(err) = self.cache.write(&ticket.key, &content) {
                    log::warn!("failed to persist {}: {err}", ticket.key);
                }
                self.state = ViewState::Ready {
                    content,
                    fresh: true,
                };
                Commit::Fresh
            }
            Err(err) if ticket.had_cache => {
                log::warn!("refresh of {} failed, keeping cached content: {err}", ticket.key);
                Commit::KeptCache
            }
            Err(err) => {
                log::error!("failed to load {}: {err}", ticket.key);
                self.state = ViewState::Failed {
                    message: self.failure_message.clone(),
                };
                Commit::Failed
            }
        }
    }

    /// Re-runs the whole procedure for the current key
    pub fn retry(&mut self) -> Option<Ticket> {
        let key = self.current.as_ref()?.key.clone();
        Some(self.begin(key))
    }

    /// Forgets the current request; any in-flight result becomes stale
    pub fn cancel(&mut self) {
        self.generations.advance();
        self.current = None;
        self.state = ViewState::Idle;
    }

    /// `begin`, await `fetch`, `complete`
    pub async fn run<F>(&mut self, key: CacheKey, fetch: F) -> Commit
    where
        F: Future<Output = Result<T>>,
    {
        let ticket = self.begin(key);
        let result = fetch.await;
        self.complete(&ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(city: &str) -> CacheKey {
        CacheKey::topic_guide(city, "visa")
    }

    fn guides(cache: ContentCache) -> CacheFetch<String> {
        CacheFetch::new(cache, KeyClass::TopicGuide)
    }

    fn failure() -> Result<String> {
        Err(Error::Service {
            status: 503,
            message: "unavailable".into(),
        })
    }

    #[test]
    fn test_miss_then_success() {
        let cache = ContentCache::in_memory(8);
        let mut fetch = guides(cache.clone());

        let ticket = fetch.begin(key("milan"));
        assert!(!ticket.had_cache);
        assert!(fetch.state().is_loading());

        assert_eq!(fetch.complete(&ticket, Ok("guide".into())), Commit::Fresh);
        assert_eq!(
            fetch.state(),
            &ViewState::Ready {
                content: "guide".to_string(),
                fresh: true
            }
        );
        assert_eq!(cache.read::<String>(&key("milan")).as_deref(), Some("guide"));
    }

    #[test]
    fn test_hit_renders_immediately_and_survives_failure() {
        let cache = ContentCache::in_memory(8);
        cache.write(&key("rome"), &"cached".to_string()).unwrap();
        let mut fetch = guides(cache);

        let ticket = fetch.begin(key("rome"));
        assert!(ticket.had_cache);
        assert_eq!(fetch.state().content().map(String::as_str), Some("cached"));

        assert_eq!(fetch.complete(&ticket, failure()), Commit::KeptCache);
        assert_eq!(
            fetch.state(),
            &ViewState::Ready {
                content: "cached".to_string(),
                fresh: false
            }
        );
    }

    #[test]
    fn test_miss_then_failure_then_retry() {
        let cache = ContentCache::in_memory(8);
        let mut fetch = guides(cache).with_failure_message("try again");

        let ticket = fetch.begin(key("pisa"));
        assert_eq!(fetch.complete(&ticket, failure()), Commit::Failed);
        assert_eq!(fetch.state().error_message(), Some("try again"));

        let retry = fetch.retry().unwrap();
        assert_eq!(retry.key, key("pisa"));
        assert!(fetch.state().is_loading());
        assert_eq!(fetch.complete(&retry, Ok("fresh".into())), Commit::Fresh);
        assert_eq!(fetch.state().content().map(String::as_str), Some("fresh"));
    }

    #[test]
    fn test_empty_result_counts_as_failure() {
        let cache = ContentCache::in_memory(8);
        let mut fetch = guides(cache.clone());

        let ticket = fetch.begin(key("siena"));
        assert_eq!(fetch.complete(&ticket, Ok("   ".into())), Commit::Failed);
        assert!(!cache.contains(&key("siena")));
    }

    #[test]
    fn test_stale_completion_is_dropped_without_writing() {
        let cache = ContentCache::in_memory(8);
        let mut fetch = guides(cache.clone());

        let old = fetch.begin(key("milan"));
        let new = fetch.begin(key("naples"));

        assert_eq!(fetch.complete(&old, Ok("milan guide".into())), Commit::Stale);
        assert!(fetch.state().is_loading());
        assert!(!cache.contains(&key("milan")));

        assert_eq!(fetch.complete(&new, Ok("naples guide".into())), Commit::Fresh);
        assert_eq!(fetch.current_key(), Some(&key("naples")));
    }

    #[test]
    fn test_cancel_invalidates_in_flight() {
        let mut fetch = guides(ContentCache::in_memory(8));
        let ticket = fetch.begin(key("bologna"));
        fetch.cancel();

        assert_eq!(fetch.complete(&ticket, Ok("late".into())), Commit::Stale);
        assert_eq!(fetch.state(), &ViewState::Idle);
        assert!(fetch.retry().is_none());
    }

    #[test]
    fn test_slots_of_one_class_share_a_counter() {
        let cache = ContentCache::in_memory(8);
        let mut first = guides(cache.clone());
        let mut second = guides(cache.clone());
        let mut stats = CacheFetch::<String>::new(cache, KeyClass::CityStats);

        let ticket = first.begin(key("genoa"));
        let stats_ticket = stats.begin(CacheKey::city_stats("genoa"));
        second.begin(key("turin"));

        assert_eq!(first.complete(&ticket, Ok("x".into())), Commit::Stale);
        assert_eq!(stats.complete(&stats_ticket, Ok("y".into())), Commit::Fresh);
    }
}
