//! Content returned by the generative service, as cached and rendered

use crate::constants::{DEFAULT_TUITION_MAX, TUITION_MAX, TUITION_MIN, TUITION_STEP};
use crate::traits::CacheValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A web citation backing grounded content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

impl Source {
    /// Title for display, falling back to the URI
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.uri
        } else {
            &self.title
        }
    }
}

/// Guide for one city and topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicGuide {
    pub markdown: String,
    pub html: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl CacheValue for TopicGuide {
    fn is_valid(&self) -> bool {
        !self.markdown.trim().is_empty() && !self.html.trim().is_empty()
    }
}

/// One overview metric for a city, scored 0 to 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStat {
    pub metric: String,
    pub value: u8,
    pub summary: String,
}

impl CacheValue for CityStat {
    fn is_valid(&self) -> bool {
        !self.metric.trim().is_empty() && self.value <= 100
    }
}

/// Rating of one city against one comparison criterion.
///
/// A rating of 0 marks a criterion the model did not answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDataPoint {
    pub sub_topic: String,
    pub rating: u8,
    pub summary: String,
}

impl ComparisonDataPoint {
    pub fn is_missing(&self) -> bool {
        self.rating == crate::constants::MISSING_RATING
    }
}

impl CacheValue for ComparisonDataPoint {
    fn is_valid(&self) -> bool {
        !self.sub_topic.trim().is_empty() && self.rating <= crate::constants::RATING_MAX
    }
}

/// Refreshed short description of a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityIntro {
    pub id: String,
    pub description: String,
}

impl CacheValue for CityIntro {
    fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.description.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRecommendation {
    pub city_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityLife {
    Calm,
    Balanced,
    Vibrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOfStudy {
    Art,
    Tech,
    Social,
    Health,
}

impl Budget {
    pub const ALL: [Budget; 3] = [Budget::Low, Budget::Medium, Budget::High];

    pub fn describe(self) -> &'static str {
        match self {
            Budget::Low => "economical",
            Budget::Medium => "moderate",
            Budget::High => "generous",
        }
    }
}

impl CityLife {
    pub const ALL: [CityLife; 3] = [CityLife::Calm, CityLife::Balanced, CityLife::Vibrant];

    pub fn describe(self) -> &'static str {
        match self {
            CityLife::Calm => "calm and historic",
            CityLife::Balanced => "balanced cultural life",
            CityLife::Vibrant => "lively and modern",
        }
    }
}

impl FieldOfStudy {
    pub const ALL: [FieldOfStudy; 4] = [
        FieldOfStudy::Art,
        FieldOfStudy::Tech,
        FieldOfStudy::Social,
        FieldOfStudy::Health,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            FieldOfStudy::Art => "art and design",
            FieldOfStudy::Tech => "engineering and technology",
            FieldOfStudy::Social => "social sciences",
            FieldOfStudy::Health => "medicine and health",
        }
    }
}

macro_rules! display_as_serde_name {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = format!("{self:?}").to_lowercase();
                f.write_str(&name)
            }
        }
    )*};
}

display_as_serde_name!(Budget, CityLife, FieldOfStudy);

/// Survey answers used for recommendations; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswers {
    pub budget: Budget,
    pub city_life: CityLife,
    pub field_of_study: FieldOfStudy,
}

impl Default for SurveyAnswers {
    fn default() -> Self {
        Self {
            budget: Budget::Medium,
            city_life: CityLife::Balanced,
            field_of_study: FieldOfStudy::Tech,
        }
    }
}

/// Language a program filter asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFilter {
    #[default]
    Any,
    English,
    Italian,
}

impl LanguageFilter {
    pub const ALL: [LanguageFilter; 3] = [LanguageFilter::Any, LanguageFilter::English, LanguageFilter::Italian];

    pub fn describe(self) -> &'static str {
        match self {
            LanguageFilter::Any => "Any",
            LanguageFilter::English => "English",
            LanguageFilter::Italian => "Italian",
        }
    }

    /// Whether a program taught in `language` passes this filter. Mixed
    /// programs pass either language.
    pub fn accepts(self, language: TeachingLanguage) -> bool {
        match (self, language) {
            (LanguageFilter::Any, _) | (_, TeachingLanguage::Mixed) => true,
            (LanguageFilter::English, TeachingLanguage::English) => true,
            (LanguageFilter::Italian, TeachingLanguage::Italian) => true,
            _ => false,
        }
    }
}

/// Language a program is taught in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeachingLanguage {
    English,
    Italian,
    Mixed,
}

impl TeachingLanguage {
    /// Case-insensitive; anything else is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "english" => Some(TeachingLanguage::English),
            "italian" => Some(TeachingLanguage::Italian),
            "mixed" => Some(TeachingLanguage::Mixed),
            _ => None,
        }
    }
}

impl fmt::Display for TeachingLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Filters of a university program search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityFilters {
    /// `None` searches every field
    pub field_of_study: Option<FieldOfStudy>,
    pub language: LanguageFilter,
    /// Highest acceptable annual tuition, in euros
    pub tuition_max: u32,
}

impl Default for UniversityFilters {
    fn default() -> Self {
        Self {
            field_of_study: None,
            language: LanguageFilter::Any,
            tuition_max: DEFAULT_TUITION_MAX,
        }
    }
}

impl UniversityFilters {
    /// Snaps the tuition cap onto the slider range and step
    pub fn normalized(mut self) -> Self {
        let clamped = self.tuition_max.clamp(TUITION_MIN, TUITION_MAX);
        let steps = (clamped + TUITION_STEP / 2) / TUITION_STEP;
        self.tuition_max = (steps * TUITION_STEP).clamp(TUITION_MIN, TUITION_MAX);
        self
    }
}

/// One program found by the program finder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityProgram {
    pub university_name: String,
    pub program_name: String,
    pub city: String,
    pub language: TeachingLanguage,
    /// Estimated annual tuition in euros
    pub annual_fee: u32,
    pub description: String,
    /// Program or university page; dropped when the answer was not a web URL
    pub website_url: Option<String>,
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    /// Role name on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}
