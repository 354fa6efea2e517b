//! State of the comparison window: chosen topic, chosen criteria and the
//! latest batch of results

use crate::compare::aggregator::CityComparisonResult;
use crate::content::orchestrator::{GenerationCounter, ViewState};
use crate::core::catalog::{SubTopic, Topic};

pub const NO_CRITERIA_MESSAGE: &str = "Select at least one criterion to compare.";

#[derive(Debug, Default)]
pub struct ComparisonPanel {
    topic: Option<Topic>,
    selected: Vec<String>,
    state: ViewState<Vec<CityComparisonResult>>,
    validation_error: Option<String>,
    generations: GenerationCounter,
}

impl ComparisonPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panel whose batches are ordered by a shared request counter
    pub fn with_generations(generations: GenerationCounter) -> Self {
        Self {
            generations,
            ..Self::default()
        }
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    /// Chooses a topic with all of its criteria selected
    pub fn set_topic(&mut self, topic: Topic) {
        self.selected = topic.sub_topics.iter().map(|st| st.id.clone()).collect();
        self.topic = Some(topic);
        self.validation_error = None;
        self.invalidate();
    }

    pub fn is_selected(&self, sub_topic_id: &str) -> bool {
        self.selected.iter().any(|id| id == sub_topic_id)
    }

    /// Flips a criterion of the current topic; returns whether it is now
    /// selected
    pub fn toggle_sub_topic(&mut self, sub_topic_id: &str) -> bool {
        let Some(topic) = &self.topic else {
            return false;
        };
        if topic.sub_topic(sub_topic_id).is_none() {
            return false;
        }

        let now_selected = if let Some(pos) = self.selected.iter().position(|id| id == sub_topic_id) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(sub_topic_id.to_string());
            true
        };
        self.validation_error = None;
        now_selected
    }

    /// Selected criteria in topic order
    pub fn selected_sub_topics(&self) -> Vec<SubTopic> {
        self.topic
            .iter()
            .flat_map(|topic| topic.sub_topics.iter())
            .filter(|st| self.is_selected(&st.id))
            .cloned()
            .collect()
    }

    pub fn state(&self) -> &ViewState<Vec<CityComparisonResult>> {
        &self.state
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub(crate) fn reject(&mut self, message: impl Into<String>) {
        self.validation_error = Some(message.into());
    }

    /// Starts a batch: shows `cached` results while the fetch runs.
    /// Returns the batch generation.
    pub(crate) fn begin(&mut self, cached: Option<Vec<CityComparisonResult>>) -> u64 {
        self.validation_error = None;
        self.state = match cached {
            Some(content) if !content.is_empty() => ViewState::Ready { content, fresh: false },
            _ => ViewState::Loading,
        };
        self.generations.advance()
    }

    /// Commits a batch; returns false when a newer batch has started
    pub(crate) fn complete(&mut self, generation: u64, result: crate::Result<Vec<CityComparisonResult>>) -> bool {
        if !self.generations.is_current(generation) {
            log::debug!("dropping stale comparison batch {generation}");
            return false;
        }
        match result {
            Ok(content) => {
                self.state = ViewState::Ready { content, fresh: true };
            }
            Err(err) if matches!(self.state, ViewState::Ready { .. }) => {
                log::warn!("comparison failed, keeping cached results: {err}");
            }
            Err(err) => {
                log::error!("comparison failed: {err}");
                self.state = ViewState::Failed {
                    message: err.to_string(),
                };
            }
        }
        true
    }

    /// Drops results and makes any running batch stale
    pub fn invalidate(&mut self) {
        self.generations.advance();
        self.state = ViewState::Idle;
    }

    /// Back to no topic, nothing selected
    pub fn clear(&mut self) {
        self.topic = None;
        self.selected.clear();
        self.validation_error = None;
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;

    fn food() -> Topic {
        Catalog::seeded().topic("food").unwrap().clone()
    }

    #[test]
    fn test_topic_preselects_all_criteria() {
        let mut panel = ComparisonPanel::new();
        panel.set_topic(food());
        assert_eq!(panel.selected_sub_topics().len(), 3);

        assert!(!panel.toggle_sub_topic("variety"));
        assert!(!panel.toggle_sub_topic("unknown"));
        let names: Vec<_> = panel.selected_sub_topics().into_iter().map(|st| st.id).collect();
        assert_eq!(names, vec!["affordability", "student-spots"]);
        assert!(panel.toggle_sub_topic("variety"));
        assert_eq!(panel.selected_sub_topics()[1].id, "variety");
    }

    #[test]
    fn test_stale_batch_is_dropped() {
        let mut panel = ComparisonPanel::new();
        panel.set_topic(food());

        let first = panel.begin(None);
        assert!(panel.state().is_loading());
        let second = panel.begin(None);

        assert!(!panel.complete(first, Ok(vec![])));
        assert!(panel.complete(second, Err(crate::Error::InvalidRequest("x".into()))));
        assert!(panel.state().is_failed());

        let third = panel.begin(None);
        panel.invalidate();
        assert!(!panel.complete(third, Ok(vec![])));
        assert_eq!(panel.state(), &ViewState::Idle);
    }
}
