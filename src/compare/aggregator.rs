use crate::constants::{MAX_COMPARISON_CITIES, MISSING_SUMMARY};
use crate::content::cache::ContentCache;
use crate::content::keys::CacheKey;
use crate::core::catalog::{City, SubTopic, Topic};
use crate::prelude::Arc;
use crate::service::model::ComparisonDataPoint;
use crate::service::{queries, ContentService};
use crate::{Error, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

/// Ratings for one city in a comparison batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityComparisonResult {
    pub city_id: String,
    /// One point per requested criterion; empty when `error` is set
    pub data: Vec<ComparisonDataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The fetch failed and this is the last successful answer
    #[serde(default)]
    pub from_cache: bool,
}

impl CityComparisonResult {
    fn unavailable(city_id: &str) -> Self {
        Self {
            city_id: city_id.to_string(),
            data: Vec::new(),
            error: Some(MISSING_SUMMARY.to_string()),
            from_cache: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Rating for a criterion by name; 0 when missing
    pub fn rating(&self, sub_topic: &str) -> u8 {
        self.data
            .iter()
            .find(|point| point.sub_topic == sub_topic)
            .map(|point| point.rating)
            .unwrap_or(crate::constants::MISSING_RATING)
    }
}

/// Fetches structured ratings for up to three cities in parallel.
///
/// One city failing never fails the batch: its entry falls back to the last
/// cached answer, or is marked unavailable with no data.
#[derive(Clone)]
pub struct ComparisonAggregator {
    service: Arc<dyn ContentService>,
    cache: ContentCache,
}

impl ComparisonAggregator {
    pub fn new(service: Arc<dyn ContentService>, cache: ContentCache) -> Self {
        Self { service, cache }
    }

    /// Checks a batch before any request is made
    pub fn validate(cities: &[City], sub_topics: &[SubTopic]) -> Result<()> {
        if cities.is_empty() {
            return Err(Error::InvalidRequest("select at least one city to compare".into()));
        }
        if cities.len() > MAX_COMPARISON_CITIES {
            return Err(Error::InvalidRequest(format!(
                "at most {MAX_COMPARISON_CITIES} cities can be compared"
            )));
        }
        if sub_topics.is_empty() {
            return Err(Error::InvalidRequest("select at least one criterion".into()));
        }
        Ok(())
    }

    fn key(city: &City, topic: &Topic, sub_topics: &[SubTopic]) -> CacheKey {
        let ids: Vec<String> = sub_topics.iter().map(|st| st.id.clone()).collect();
        CacheKey::comparison(&city.id, &topic.id, &ids)
    }

    /// The whole batch from cache, if every city has a cached answer
    pub fn cached(&self, cities: &[City], topic: &Topic, sub_topics: &[SubTopic]) -> Option<Vec<CityComparisonResult>> {
        cities
            .iter()
            .map(|city| {
                self.cache
                    .read::<Vec<ComparisonDataPoint>>(&Self::key(city, topic, sub_topics))
                    .map(|data| CityComparisonResult {
                        city_id: city.id.clone(),
                        data,
                        error: None,
                        from_cache: true,
                    })
            })
            .collect()
    }

    /// Runs one request per city concurrently; results keep the input order
    pub async fn compare(
        &self,
        cities: &[City],
        topic: &Topic,
        sub_topics: &[SubTopic],
    ) -> Result<Vec<CityComparisonResult>> {
        Self::validate(cities, sub_topics)?;

        let requests = cities.iter().map(|city| self.compare_one(city, topic, sub_topics));
        let results = join_all(requests).await;

        let failed = results.iter().filter(|r| r.is_error()).count();
        log::info!(
            "compared {} cities on {} ({} unavailable)",
            results.len(),
            topic.id,
            failed
        );
        Ok(results)
    }

    async fn compare_one(&self, city: &City, topic: &Topic, sub_topics: &[SubTopic]) -> CityComparisonResult {
        let key = Self::key(city, topic, sub_topics);

        match queries::fetch_structured_comparison(self.service.as_ref(), city, topic, sub_topics).await {
            Ok(data) => {
                if let Err(err) = self.cache.write(&key, &data) {
                    log::warn!("failed to persist {key}: {err}");
                }
                CityComparisonResult {
                    city_id: city.id.clone(),
                    data,
                    error: None,
                    from_cache: false,
                }
            }
            Err(err) => match self.cache.read::<Vec<ComparisonDataPoint>>(&key) {
                Some(data) => {
                    log::warn!("comparison for {} failed, using cached ratings: {err}", city.id);
                    CityComparisonResult {
                        city_id: city.id.clone(),
                        data,
                        error: None,
                        from_cache: true,
                    }
                }
                None => {
                    log::warn!("comparison for {} failed: {err}", city.id);
                    CityComparisonResult::unavailable(&city.id)
                }
            },
        }
    }
}

impl std::fmt::Debug for ComparisonAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonAggregator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::service::{GenerateRequest, Generation};
    use async_trait::async_trait;

    /// Answers every criterion with 7, except for prompts naming `fail_on`
    struct Ratings {
        fail_on: &'static str,
    }

    #[async_trait]
    impl ContentService for Ratings {
        async fn generate(&self, request: GenerateRequest) -> Result<Generation> {
            if request.prompt.contains(self.fail_on) {
                return Err(Error::Service {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(Generation::new(
                r#"[{"subTopic":"Affordability","rating":7,"summary":"fine"},
                    {"subTopic":"Variety","rating":8,"summary":"wide"}]"#,
            ))
        }
    }

    fn fixture(names: &[&str]) -> (Vec<City>, Topic) {
        let catalog = Catalog::seeded();
        let cities = names.iter().map(|id| catalog.city(id).unwrap().clone()).collect();
        (cities, catalog.topic("food").unwrap().clone())
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_batch() {
        let (cities, topic) = fixture(&["milan", "rome", "naples"]);
        let aggregator = ComparisonAggregator::new(
            Arc::new(Ratings { fail_on: "Roma" }),
            ContentCache::in_memory(16),
        );

        let results = aggregator.compare(&cities, &topic, &topic.sub_topics).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].city_id, "rome");
        assert!(results[1].is_error());
        assert!(results[1].data.is_empty());

        for ok in [&results[0], &results[2]] {
            assert!(!ok.is_error());
            assert_eq!(ok.data.len(), 3);
            assert_eq!(ok.rating("Variety"), 8);
            // not in the answer
            assert_eq!(ok.rating("Student Spots"), 0);
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_cache() {
        let (cities, topic) = fixture(&["rome"]);
        let cache = ContentCache::in_memory(16);

        let healthy = ComparisonAggregator::new(Arc::new(Ratings { fail_on: "\u{0}" }), cache.clone());
        healthy.compare(&cities, &topic, &topic.sub_topics).await.unwrap();
        assert!(healthy.cached(&cities, &topic, &topic.sub_topics).is_some());

        let failing = ComparisonAggregator::new(Arc::new(Ratings { fail_on: "Roma" }), cache);
        let results = failing.compare(&cities, &topic, &topic.sub_topics).await.unwrap();
        assert!(!results[0].is_error());
        assert!(results[0].from_cache);
    }

    #[test]
    fn test_validation() {
        let (cities, topic) = fixture(&["milan", "rome", "naples", "pisa"]);
        assert!(ComparisonAggregator::validate(&cities, &topic.sub_topics).is_err());
        assert!(ComparisonAggregator::validate(&cities[..2], &[]).is_err());
        assert!(ComparisonAggregator::validate(&[], &topic.sub_topics).is_err());
        assert!(ComparisonAggregator::validate(&cities[..3], &topic.sub_topics[..1]).is_ok());
    }
}
