//! Like/dislike feedback on generated guides

use crate::content::keys::{feedback_key, feedback_tally_key};
use crate::content::storage::{flag_is_set, set_flag, KeyValueStore};
use crate::prelude::{Arc, Mutex};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
}

/// Running counts for one city and topic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTally {
    pub city_id: String,
    pub topic_id: String,
    pub like_count: u64,
    pub dislike_count: u64,
}

impl FeedbackTally {
    fn record(&mut self, kind: FeedbackKind) {
        match kind {
            FeedbackKind::Like => self.like_count += 1,
            FeedbackKind::Dislike => self.dislike_count += 1,
        }
    }
}

/// Where feedback is recorded. Duplicate increments must be tolerated.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn record_feedback(&self, city_id: &str, topic_id: &str, kind: FeedbackKind) -> Result<()>;
}

/// Keeps tallies in the local key-value store
pub struct LocalFeedbackStore {
    store: Arc<dyn KeyValueStore>,
    // serializes read-modify-write of tallies
    write_lock: Mutex<()>,
}

impl LocalFeedbackStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn tally(&self, city_id: &str, topic_id: &str) -> Result<FeedbackTally> {
        let raw = self.store.get(&feedback_tally_key(city_id, topic_id))?;
        let tally = match raw {
            Some(raw) => serde_json::from_str(&raw)?,
            None => FeedbackTally {
                city_id: city_id.to_string(),
                topic_id: topic_id.to_string(),
                ..FeedbackTally::default()
            },
        };
        Ok(tally)
    }
}

#[async_trait]
impl FeedbackStore for LocalFeedbackStore {
    async fn record_feedback(&self, city_id: &str, topic_id: &str, kind: FeedbackKind) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Storage("feedback lock poisoned".into()))?;

        let mut tally = self.tally(city_id, topic_id).unwrap_or_else(|err| {
            log::debug!("resetting unreadable feedback tally for {city_id}/{topic_id}: {err}");
            FeedbackTally {
                city_id: city_id.to_string(),
                topic_id: topic_id.to_string(),
                ..FeedbackTally::default()
            }
        });
        tally.record(kind);
        self.store
            .set(&feedback_tally_key(city_id, topic_id), &serde_json::to_string(&tally)?)
    }
}

impl std::fmt::Debug for LocalFeedbackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFeedbackStore").finish_non_exhaustive()
    }
}

/// Sends feedback at most once per city and topic.
///
/// The local flag is only set after the store accepted the feedback, so a
/// failed send can be tried again.
#[derive(Clone)]
pub struct FeedbackTracker {
    flags: Arc<dyn KeyValueStore>,
    store: Arc<dyn FeedbackStore>,
}

impl FeedbackTracker {
    pub fn new(flags: Arc<dyn KeyValueStore>, store: Arc<dyn FeedbackStore>) -> Self {
        Self { flags, store }
    }

    pub fn already_sent(&self, city_id: &str, topic_id: &str) -> bool {
        flag_is_set(self.flags.as_ref(), &feedback_key(city_id, topic_id))
    }

    /// Returns false without sending when feedback was already given
    pub async fn send(&self, city_id: &str, topic_id: &str, kind: FeedbackKind) -> Result<bool> {
        if self.already_sent(city_id, topic_id) {
            return Ok(false);
        }
        self.store.record_feedback(city_id, topic_id, kind).await?;
        set_flag(self.flags.as_ref(), &feedback_key(city_id, topic_id));
        log::info!("recorded {kind:?} for {city_id}/{topic_id}");
        Ok(true)
    }
}

impl std::fmt::Debug for FeedbackTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackTracker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::storage::MemoryStore;

    struct Unreachable;

    #[async_trait]
    impl FeedbackStore for Unreachable {
        async fn record_feedback(&self, _: &str, _: &str, _: FeedbackKind) -> Result<()> {
            Err(Error::Storage("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_tally_tolerates_duplicates() {
        let store = LocalFeedbackStore::new(Arc::new(MemoryStore::new()));
        store.record_feedback("milan", "visa", FeedbackKind::Like).await.unwrap();
        store.record_feedback("milan", "visa", FeedbackKind::Like).await.unwrap();
        store.record_feedback("milan", "visa", FeedbackKind::Dislike).await.unwrap();

        let tally = store.tally("milan", "visa").unwrap();
        assert_eq!((tally.like_count, tally.dislike_count), (2, 1));
        assert_eq!(tally.city_id, "milan");
    }

    #[tokio::test]
    async fn test_tracker_sends_once() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let local = Arc::new(LocalFeedbackStore::new(kv.clone()));
        let tracker = FeedbackTracker::new(kv, local.clone());

        assert!(tracker.send("rome", "food", FeedbackKind::Like).await.unwrap());
        assert!(!tracker.send("rome", "food", FeedbackKind::Dislike).await.unwrap());
        assert!(tracker.already_sent("rome", "food"));
        assert_eq!(local.tally("rome", "food").unwrap().like_count, 1);
    }

    #[tokio::test]
    async fn test_failed_send_can_be_retried() {
        let tracker = FeedbackTracker::new(Arc::new(MemoryStore::new()), Arc::new(Unreachable));
        assert!(tracker.send("pisa", "visa", FeedbackKind::Like).await.is_err());
        assert!(!tracker.already_sent("pisa", "visa"));
    }
}
