//! Storage key scheme. Every feature owns one prefix.

use std::fmt;

pub const CITY_INTROS_KEY: &str = "italy_guide_cities";
pub const SEEN_TOUR_KEY: &str = "hasSeenTour";
pub const COMPLETED_SURVEY_KEY: &str = "hasCompletedSurvey";
pub const MARKER_STYLE_KEY: &str = "map_marker_style";
pub const MARKER_COLOR_KEY: &str = "map_marker_color";

/// Identifies one unit of generated content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Markdown guide for a city and topic
    TopicGuide { city: String, topic: String },
    /// Overview statistics for a city
    CityStats { city: String },
    /// Structured ratings for a city, topic and sub-topic selection
    Comparison {
        city: String,
        topic: String,
        sub_topics: Vec<String>,
    },
    /// Refreshed one-line descriptions for all cities
    CityIntros,
}

/// Which orchestrator a key belongs to; each class has its own generation
/// counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    TopicGuide,
    CityStats,
    Comparison,
    CityIntros,
}

impl CacheKey {
    pub fn topic_guide(city: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::TopicGuide {
            city: city.into(),
            topic: topic.into(),
        }
    }

    pub fn city_stats(city: impl Into<String>) -> Self {
        Self::CityStats { city: city.into() }
    }

    /// Sub-topic ids are sorted so the key does not depend on toggle order
    pub fn comparison(city: impl Into<String>, topic: impl Into<String>, sub_topics: &[String]) -> Self {
        let mut sub_topics = sub_topics.to_vec();
        sub_topics.sort();
        sub_topics.dedup();
        Self::Comparison {
            city: city.into(),
            topic: topic.into(),
            sub_topics,
        }
    }

    pub fn class(&self) -> KeyClass {
        match self {
            CacheKey::TopicGuide { .. } => KeyClass::TopicGuide,
            CacheKey::CityStats { .. } => KeyClass::CityStats,
            CacheKey::Comparison { .. } => KeyClass::Comparison,
            CacheKey::CityIntros => KeyClass::CityIntros,
        }
    }

    /// The string used in persistent storage
    pub fn storage_key(&self) -> String {
        match self {
            CacheKey::TopicGuide { city, topic } => format!("info_content_{city}_{topic}"),
            CacheKey::CityStats { city } => format!("city_stats_{city}"),
            CacheKey::Comparison {
                city,
                topic,
                sub_topics,
            } => format!("comparison_{city}_{topic}_{}", sub_topics.join("+")),
            CacheKey::CityIntros => CITY_INTROS_KEY.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

pub fn feedback_key(city: &str, topic: &str) -> String {
    format!("feedback_{city}_{topic}")
}

pub fn feedback_tally_key(city: &str, topic: &str) -> String {
    format!("feedback_tally_{city}_{topic}")
}

pub fn checklist_key(city: &str) -> String {
    format!("checklist_{city}")
}
