use crate::core::constants::MAX_COMPARISON_CITIES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SelectionMode {
    /// Single city detail view
    #[default]
    Explore,
    /// Building a comparison set
    Compare,
}

/// What a city click did to the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(String),
    /// The already selected city was clicked again; the view resets
    Deselected,
    Added(String),
    Removed(String),
    LimitReached,
}

/// Current city/topic choice and comparison set.
///
/// The two modes are exclusive: in compare mode there is no detail city or
/// topic, in explore mode the comparison set is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    city: Option<String>,
    topic: Option<String>,
    mode: SelectionMode,
    comparison: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_comparing(&self) -> bool {
        self.mode == SelectionMode::Compare
    }

    pub fn comparison(&self) -> &[String] {
        &self.comparison
    }

    pub fn select_city(&mut self, id: &str) -> SelectOutcome {
        match self.mode {
            SelectionMode::Explore => {
                if self.city.as_deref() == Some(id) {
                    self.clear();
                    SelectOutcome::Deselected
                } else {
                    self.city = Some(id.to_string());
                    self.topic = None;
                    SelectOutcome::Selected(id.to_string())
                }
            }
            SelectionMode::Compare => {
                if let Some(pos) = self.comparison.iter().position(|c| c == id) {
                    self.comparison.remove(pos);
                    SelectOutcome::Removed(id.to_string())
                } else if self.comparison.len() < MAX_COMPARISON_CITIES {
                    self.comparison.push(id.to_string());
                    SelectOutcome::Added(id.to_string())
                } else {
                    SelectOutcome::LimitReached
                }
            }
        }
    }

    /// Opens a topic for the current city. Ignored without a city.
    pub fn select_topic(&mut self, id: &str) -> bool {
        if self.mode != SelectionMode::Explore || self.city.is_none() {
            return false;
        }
        self.topic = Some(id.to_string());
        true
    }

    pub fn clear_topic(&mut self) {
        self.topic = None;
    }

    /// Drops city, topic and comparison set, keeping the mode
    pub fn clear(&mut self) {
        self.city = None;
        self.topic = None;
        self.comparison.clear();
    }

    /// Flips between explore and compare, starting from an empty selection
    pub fn toggle_mode(&mut self) -> SelectionMode {
        self.clear();
        self.mode = match self.mode {
            SelectionMode::Explore => SelectionMode::Compare,
            SelectionMode::Compare => SelectionMode::Explore,
        };
        self.mode
    }

    /// Sets city and topic together, as a deep link does. Leaves compare mode.
    pub fn open(&mut self, city: &str, topic: &str) {
        self.mode = SelectionMode::Explore;
        self.comparison.clear();
        self.city = Some(city.to_string());
        self.topic = Some(topic.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explore_select_and_reselect() {
        let mut selection = SelectionState::new();
        assert_eq!(selection.select_city("milan"), SelectOutcome::Selected("milan".into()));
        assert!(selection.select_topic("visa"));

        assert_eq!(selection.select_city("rome"), SelectOutcome::Selected("rome".into()));
        assert_eq!(selection.topic(), None);

        assert_eq!(selection.select_city("rome"), SelectOutcome::Deselected);
        assert_eq!(selection.city(), None);
    }

    #[test]
    fn test_topic_requires_city() {
        let mut selection = SelectionState::new();
        assert!(!selection.select_topic("visa"));
        assert_eq!(selection.topic(), None);
    }

    #[test]
    fn test_comparison_set_is_capped() {
        let mut selection = SelectionState::new();
        selection.toggle_mode();

        for id in ["milan", "rome", "pisa"] {
            assert_eq!(selection.select_city(id), SelectOutcome::Added(id.into()));
        }
        assert_eq!(selection.select_city("naples"), SelectOutcome::LimitReached);
        assert_eq!(selection.comparison(), ["milan", "rome", "pisa"]);

        assert_eq!(selection.select_city("rome"), SelectOutcome::Removed("rome".into()));
        assert_eq!(selection.select_city("naples"), SelectOutcome::Added("naples".into()));
        assert_eq!(selection.comparison(), ["milan", "pisa", "naples"]);
        assert_eq!(selection.city(), None);
    }

    #[test]
    fn test_toggle_mode_resets() {
        let mut selection = SelectionState::new();
        selection.select_city("milan");
        assert_eq!(selection.toggle_mode(), SelectionMode::Compare);
        assert_eq!(selection.city(), None);

        selection.select_city("rome");
        assert_eq!(selection.toggle_mode(), SelectionMode::Explore);
        assert!(selection.comparison().is_empty());
    }
}
