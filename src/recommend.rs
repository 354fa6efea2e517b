//! Survey-based city recommendations and the first-run prompts.
//!
//! Recommendations are one-shot: nothing is cached, and the only thing kept
//! is the flag saying the survey was answered or skipped.

use crate::content::keys::{COMPLETED_SURVEY_KEY, SEEN_TOUR_KEY};
use crate::content::storage::{flag_is_set, set_flag, KeyValueStore};
use crate::core::catalog::City;
use crate::prelude::{Arc, HashSet};
use crate::service::{queries, ContentService};
use crate::{Error, Result};

pub use crate::service::model::{Budget, CityLife, CityRecommendation, FieldOfStudy, SurveyAnswers};

/// Number of cities a survey answer yields
pub const RECOMMENDATION_COUNT: usize = 3;

pub const RECOMMENDATION_FAILURE_NOTICE: &str =
    "Recommendations could not be created right now. You can keep exploring the map.";

#[derive(Clone)]
pub struct RecommendationClient {
    service: Arc<dyn ContentService>,
}

impl RecommendationClient {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }

    /// Up to three recommendations in the model's order. Unknown or repeated
    /// city ids are dropped; an answer with none left is an error.
    pub async fn recommend(&self, answers: &SurveyAnswers, cities: &[City]) -> Result<Vec<CityRecommendation>> {
        let raw = queries::fetch_recommendations(self.service.as_ref(), answers, cities).await?;
        let total = raw.len();

        let mut seen = HashSet::default();
        let recommendations: Vec<CityRecommendation> = raw
            .into_iter()
            .filter(|rec| cities.iter().any(|city| city.id == rec.city_id))
            .filter(|rec| seen.insert(rec.city_id.clone()))
            .take(RECOMMENDATION_COUNT)
            .collect();

        if recommendations.is_empty() {
            return Err(Error::InvalidContent(format!(
                "none of the {total} recommended cities are known"
            )));
        }
        if recommendations.len() < total {
            log::debug!("kept {} of {total} recommendations", recommendations.len());
        }
        Ok(recommendations)
    }
}

impl std::fmt::Debug for RecommendationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationClient").finish_non_exhaustive()
    }
}

/// Which first-run prompt to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRunPrompt {
    Tour,
    Survey,
}

/// Persisted flags for the welcome tour and the survey
#[derive(Clone)]
pub struct Onboarding {
    store: Arc<dyn KeyValueStore>,
}

impl Onboarding {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The tour comes first; the survey follows once the tour was seen
    pub fn pending_prompt(&self) -> Option<FirstRunPrompt> {
        if !self.has_seen_tour() {
            Some(FirstRunPrompt::Tour)
        } else if !self.has_completed_survey() {
            Some(FirstRunPrompt::Survey)
        } else {
            None
        }
    }

    pub fn has_seen_tour(&self) -> bool {
        flag_is_set(self.store.as_ref(), SEEN_TOUR_KEY)
    }

    pub fn has_completed_survey(&self) -> bool {
        flag_is_set(self.store.as_ref(), COMPLETED_SURVEY_KEY)
    }

    /// Marks the tour seen and returns the prompt to show next
    pub fn finish_tour(&self) -> Option<FirstRunPrompt> {
        set_flag(self.store.as_ref(), SEEN_TOUR_KEY);
        self.pending_prompt()
    }

    /// Called on submit (whatever the outcome) and on skip
    pub fn complete_survey(&self) {
        set_flag(self.store.as_ref(), COMPLETED_SURVEY_KEY);
    }
}

impl std::fmt::Debug for Onboarding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Onboarding")
            .field("pending", &self.pending_prompt())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::storage::MemoryStore;
    use crate::core::catalog::Catalog;
    use crate::service::{GenerateRequest, Generation};
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl ContentService for Canned {
        async fn generate(&self, _request: GenerateRequest) -> Result<Generation> {
            Ok(Generation::new(self.0))
        }
    }

    #[tokio::test]
    async fn test_recommend_filters_and_truncates() {
        let client = RecommendationClient::new(Arc::new(Canned(
            r#"[{"cityId":"pisa","reason":"quiet"},
                {"cityId":"atlantis","reason":"?"},
                {"cityId":"pisa","reason":"again"},
                {"cityId":"bologna","reason":"students"},
                {"cityId":"turin","reason":"tech"},
                {"cityId":"milan","reason":"jobs"}]"#,
        )));
        let catalog = Catalog::seeded();

        let recs = client
            .recommend(&SurveyAnswers::default(), catalog.cities())
            .await
            .unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.city_id.as_str()).collect();
        assert_eq!(ids, vec!["pisa", "bologna", "turin"]);
    }

    #[tokio::test]
    async fn test_recommend_with_no_known_city_fails() {
        let client = RecommendationClient::new(Arc::new(Canned(r#"[{"cityId":"oslo","reason":"cold"}]"#)));
        let catalog = Catalog::seeded();
        assert!(client
            .recommend(&SurveyAnswers::default(), catalog.cities())
            .await
            .is_err());
    }

    #[test]
    fn test_first_run_order() {
        let onboarding = Onboarding::new(Arc::new(MemoryStore::new()));
        assert_eq!(onboarding.pending_prompt(), Some(FirstRunPrompt::Tour));
        assert_eq!(onboarding.finish_tour(), Some(FirstRunPrompt::Survey));
        onboarding.complete_survey();
        assert_eq!(onboarding.pending_prompt(), None);
    }
}
