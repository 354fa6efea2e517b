//! Typed queries over a [`ContentService`].
//!
//! Structured answers are parsed leniently: a stray code fence or an object
//! wrapping the expected array is accepted, and entries that do not fit the
//! expected shape are skipped rather than failing the whole answer.

use crate::constants::{MAX_PROGRAMS, MISSING_RATING, MISSING_SUMMARY, RATING_MAX, RATING_MIN};
use crate::content::markdown::{render_markdown, strip_code_fence};
use crate::core::catalog::{City, SubTopic, Topic};
use crate::service::model::{
    ChatMessage, CityIntro, CityRecommendation, CityStat, ComparisonDataPoint, SurveyAnswers,
    TeachingLanguage, TopicGuide, UniversityFilters, UniversityProgram,
};
use crate::service::{prompts, ContentService, GenerateRequest, Generation};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parses a JSON array answer into `T`, skipping malformed entries
pub(crate) fn parse_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.into_iter().find_map(|(_, v)| match v {
            Value::Array(items) => Some(items),
            _ => None,
        }) {
            Some(items) => items,
            None => return Err(Error::InvalidContent("expected a JSON array".into())),
        },
        _ => return Err(Error::InvalidContent("expected a JSON array".into())),
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if parsed.len() < total {
        log::debug!("skipped {} malformed entries", total - parsed.len());
    }
    Ok(parsed)
}

fn non_empty<T>(items: Vec<T>, what: &str) -> Result<Vec<T>> {
    if items.is_empty() {
        Err(Error::InvalidContent(format!("no usable {what} in response")))
    } else {
        Ok(items)
    }
}

/// Markdown guide for a city and topic, rendered to HTML.
///
/// Grounded topics carry their web sources.
pub async fn fetch_topic_guide(service: &dyn ContentService, city: &City, topic: &Topic) -> Result<TopicGuide> {
    let request = GenerateRequest::text(
        format!("guide {}/{}", city.id, topic.id),
        prompts::topic_guide(city, topic),
    )
    .with_grounding(topic.is_grounded());

    let generation = service.generate(request).await?;
    let markdown = generation.text.trim().to_string();
    if markdown.is_empty() {
        return Err(Error::InvalidContent(format!("empty guide for {}/{}", city.id, topic.id)));
    }

    Ok(TopicGuide {
        html: render_markdown(&markdown),
        markdown,
        sources: generation.sources,
    })
}

#[derive(serde::Deserialize)]
struct RawStat {
    metric: String,
    value: f64,
    #[serde(default)]
    summary: String,
}

/// Overview metrics (cost of living, university quality, safety), each 0-100
pub async fn fetch_city_stats(service: &dyn ContentService, city: &City) -> Result<Vec<CityStat>> {
    let request = GenerateRequest::json(
        format!("stats {}", city.id),
        prompts::city_stats(city),
        prompts::city_stats_schema(),
    );
    let generation = service.generate(request).await?;

    let stats = parse_array::<RawStat>(&generation.text)?
        .into_iter()
        .filter(|raw| !raw.metric.trim().is_empty() && raw.value.is_finite())
        .map(|raw| CityStat {
            metric: raw.metric.trim().to_string(),
            value: raw.value.round().clamp(0.0, 100.0) as u8,
            summary: raw.summary.trim().to_string(),
        })
        .collect();
    non_empty(stats, "statistics")
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataPoint {
    sub_topic: String,
    rating: Value,
    #[serde(default)]
    summary: String,
}

fn same_criterion(answer: &str, sub_topic: &SubTopic) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case(sub_topic.name.trim()) || answer.eq_ignore_ascii_case(&sub_topic.id)
}

/// Lines the model's answer up with the requested criteria.
///
/// The result has one point per requested criterion, in request order.
/// Criteria the model skipped (or rated with something that is not a number)
/// get the missing rating and summary; others are clamped into the rating
/// range.
fn align_ratings(answer: Vec<RawDataPoint>, sub_topics: &[SubTopic]) -> Vec<ComparisonDataPoint> {
    sub_topics
        .iter()
        .map(|st| {
            let found = answer
                .iter()
                .filter(|raw| same_criterion(&raw.sub_topic, st))
                .find_map(|raw| raw.rating.as_f64().filter(|r| r.is_finite()).map(|r| (r, raw)));

            match found {
                Some((rating, raw)) => ComparisonDataPoint {
                    sub_topic: st.name.clone(),
                    rating: rating.round().clamp(RATING_MIN as f64, RATING_MAX as f64) as u8,
                    summary: raw.summary.trim().to_string(),
                },
                None => ComparisonDataPoint {
                    sub_topic: st.name.clone(),
                    rating: MISSING_RATING,
                    summary: MISSING_SUMMARY.to_string(),
                },
            }
        })
        .collect()
}

/// Ratings of one city against the chosen criteria of a topic
pub async fn fetch_structured_comparison(
    service: &dyn ContentService,
    city: &City,
    topic: &Topic,
    sub_topics: &[SubTopic],
) -> Result<Vec<ComparisonDataPoint>> {
    if sub_topics.is_empty() {
        return Err(Error::InvalidRequest("at least one criterion is required".into()));
    }

    let request = GenerateRequest::json(
        format!("comparison {}/{}", city.id, topic.id),
        prompts::comparison(city, topic, sub_topics),
        prompts::comparison_schema(),
    );
    let generation = service.generate(request).await?;
    Ok(align_ratings(parse_array(&generation.text)?, sub_topics))
}

/// Fresh one-line descriptions; entries for unknown cities are dropped
pub async fn fetch_city_intros(service: &dyn ContentService, cities: &[City]) -> Result<Vec<CityIntro>> {
    let request = GenerateRequest::json("city intros", prompts::city_intros(cities), prompts::city_intros_schema());
    let generation = service.generate(request).await?;

    let intros = parse_array::<CityIntro>(&generation.text)?
        .into_iter()
        .filter(|intro| {
            !intro.description.trim().is_empty() && cities.iter().any(|city| city.id == intro.id)
        })
        .collect();
    non_empty(intros, "city intros")
}

/// Raw ranked recommendations as returned by the model
pub async fn fetch_recommendations(
    service: &dyn ContentService,
    answers: &SurveyAnswers,
    cities: &[City],
) -> Result<Vec<CityRecommendation>> {
    let request = GenerateRequest::json(
        "recommendations",
        prompts::recommendations(answers, cities),
        prompts::recommendations_schema(),
    );
    let generation = service.generate(request).await?;
    parse_array(&generation.text)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProgram {
    university_name: String,
    program_name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    language: String,
    annual_fee: Value,
    #[serde(default)]
    description: String,
    #[serde(default)]
    website_url: String,
}

fn web_url(raw: &str) -> Option<String> {
    let url = reqwest::Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

impl RawProgram {
    /// Typed program, or `None` when a required field is unusable or the
    /// program falls outside the filters
    fn into_program(self, filters: &UniversityFilters) -> Option<UniversityProgram> {
        let university_name = self.university_name.trim().to_string();
        let program_name = self.program_name.trim().to_string();
        if university_name.is_empty() || program_name.is_empty() {
            return None;
        }

        let annual_fee = self.annual_fee.as_f64().filter(|fee| fee.is_finite() && *fee >= 0.0)?;
        let annual_fee = annual_fee.round().min(u32::MAX as f64) as u32;
        if annual_fee > filters.tuition_max {
            return None;
        }

        let language = TeachingLanguage::parse(&self.language).unwrap_or(TeachingLanguage::Mixed);
        if !filters.language.accepts(language) {
            return None;
        }

        Some(UniversityProgram {
            university_name,
            program_name,
            city: self.city.trim().to_string(),
            language,
            annual_fee,
            description: self.description.trim().to_string(),
            website_url: web_url(&self.website_url),
        })
    }
}

/// Programs matching the filters, using web search for current details.
///
/// Entries without names or a usable fee, over the tuition cap or in the
/// wrong language are dropped; at most [`MAX_PROGRAMS`] are kept. An empty
/// list is a valid answer.
pub async fn fetch_universities(
    service: &dyn ContentService,
    filters: &UniversityFilters,
) -> Result<Vec<UniversityProgram>> {
    let filters = filters.normalized();
    let request = GenerateRequest::json(
        "universities",
        prompts::universities(&filters),
        prompts::universities_schema(),
    )
    .with_grounding(true);
    let generation = service.generate(request).await?;

    let raw = parse_array::<RawProgram>(&generation.text)?;
    let total = raw.len();
    let mut programs: Vec<UniversityProgram> = raw
        .into_iter()
        .filter_map(|program| program.into_program(&filters))
        .collect();
    if programs.len() < total {
        log::debug!("dropped {} programs outside the filters", total - programs.len());
    }
    programs.truncate(MAX_PROGRAMS);
    Ok(programs)
}

/// Sends the next user turn of the assistant conversation
pub async fn ask_assistant(
    service: &dyn ContentService,
    history: Vec<ChatMessage>,
    question: &str,
) -> Result<Generation> {
    let request = GenerateRequest::chat("assistant", prompts::ASSISTANT_INSTRUCTION, history, question);
    let generation = service.generate(request).await?;
    if generation.text.trim().is_empty() {
        return Err(Error::InvalidContent("empty assistant reply".into()));
    }
    Ok(generation)
}
