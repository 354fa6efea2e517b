//! Prompt text and response schemas for each query

use crate::core::catalog::{City, SubTopic, Topic};
use crate::constants::MAX_PROGRAMS;
use crate::service::model::{SurveyAnswers, UniversityFilters};
use serde_json::{json, Value};

const AUDIENCE: &str = "You are a friendly, knowledgeable mentor for international students \
planning to study in Italy. Be practical, clear and encouraging.";

pub fn topic_guide(city: &City, topic: &Topic) -> String {
    format!(
        "{AUDIENCE}\n\n\
         Write a detailed guide on \"{topic}\" for a student who will study in {city}, Italy.\n\n\
         Use Markdown with headings, bullet points and bold text. Start with a short encouraging \
         title and introduction, break the main points into sections, include practical tips and \
         pitfalls specific to {city}, and close with a brief summary.\n\n\
         Keep the information as current and accurate as possible.",
        topic = topic.name,
        city = city.name,
    )
}

pub fn city_stats(city: &City) -> String {
    format!(
        "{AUDIENCE}\n\n\
         Summarize {city}, Italy for a student using exactly three metrics: \"Cost of Living\", \
         \"University Quality\" and \"Safety\".\n\n\
         For each metric give \"metric\" (the exact name above), \"value\" (a score from 0 to 100 \
         from a student's perspective; for Cost of Living a higher score means MORE affordable) \
         and \"summary\" (one or two sentences).\n\n\
         Return only JSON in the requested format.",
        city = city.name,
    )
}

pub fn comparison(city: &City, topic: &Topic, sub_topics: &[SubTopic]) -> String {
    let criteria = sub_topics
        .iter()
        .map(|st| format!("\"{}\"", st.name))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{AUDIENCE}\n\n\
         Evaluate {city} on the topic \"{topic}\" for the following criteria: {criteria}.\n\n\
         For each criterion give \"subTopic\" (the exact criterion name), \"rating\" (an integer \
         from 1, very poor, to 10, excellent) and \"summary\" (at most 30 words explaining the \
         rating).\n\n\
         Return only JSON in the requested format.",
        city = city.name,
        topic = topic.name,
    )
}

pub fn city_intros(cities: &[City]) -> String {
    let names = cities
        .iter()
        .map(|c| format!("{} (id: {})", c.name, c.id))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "For each of these Italian cities write one catchy sentence (at most 15 words) for a \
         student planning to study there.\n\nCities: {names}\n\n\
         Return only JSON in the requested format, using the given ids."
    )
}

pub fn recommendations(answers: &SurveyAnswers, cities: &[City]) -> String {
    let city_list = cities
        .iter()
        .map(|c| format!("{} (ID: {})", c.name, c.id))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "A student answered a short survey about studying in Italy. Recommend the 3 best matching \
         cities from the list below.\n\n\
         Preferences:\n\
         - Monthly budget: {budget} ({budget_text})\n\
         - City life: {life} ({life_text})\n\
         - Field of study: {field} ({field_text})\n\n\
         Available cities: {city_list}\n\n\
         For each city give \"cityId\" (the exact ID from the list) and \"reason\" (a personal \
         reason of at most 20 words).\n\n\
         Return only JSON in the requested format.",
        budget = answers.budget,
        budget_text = answers.budget.describe(),
        life = answers.city_life,
        life_text = answers.city_life.describe(),
        field = answers.field_of_study,
        field_text = answers.field_of_study.describe(),
    )
}

pub fn universities(filters: &UniversityFilters) -> String {
    let field = filters
        .field_of_study
        .map(|field| field.describe())
        .unwrap_or("Any");
    let language = filters.language.describe();

    format!(
        "You are an academic advisor for international students. Find university programs in \
         Italy that match the criteria below and return up to {MAX_PROGRAMS} relevant programs.\n\n\
         Criteria:\n\
         - Field of study: {field}\n\
         - Language of instruction: {language}\n\
         - Maximum annual tuition: EUR {max}\n\n\
         For each program give \"universityName\", \"programName\", \"city\", \"language\" \
         (exactly 'English', 'Italian' or 'Mixed'), \"annualFee\" (an estimated integer in euros), \
         \"description\" (one or two enticing sentences for a student) and \"websiteUrl\" (a direct \
         link to the program or university page).\n\n\
         Return only JSON in the requested format.",
        max = filters.tuition_max,
    )
}

/// Standing instruction for the assistant conversation
pub const ASSISTANT_INSTRUCTION: &str = "You are \"Guido\", an expert assistant for international \
students planning to study in Italy. Your tone is friendly, encouraging and helpful. Give concise, \
accurate answers formatted in Markdown.";

fn array_of(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        }
    })
}

pub fn city_stats_schema() -> Value {
    array_of(
        json!({
            "metric": { "type": "STRING" },
            "value": { "type": "INTEGER" },
            "summary": { "type": "STRING" },
        }),
        &["metric", "value", "summary"],
    )
}

pub fn comparison_schema() -> Value {
    array_of(
        json!({
            "subTopic": { "type": "STRING", "description": "The criterion name." },
            "rating": { "type": "INTEGER", "description": "Rating from 1 to 10." },
            "summary": { "type": "STRING", "description": "Short explanation." },
        }),
        &["subTopic", "rating", "summary"],
    )
}

pub fn city_intros_schema() -> Value {
    array_of(
        json!({
            "id": { "type": "STRING" },
            "description": { "type": "STRING" },
        }),
        &["id", "description"],
    )
}

pub fn recommendations_schema() -> Value {
    array_of(
        json!({
            "cityId": { "type": "STRING" },
            "reason": { "type": "STRING" },
        }),
        &["cityId", "reason"],
    )
}

pub fn universities_schema() -> Value {
    array_of(
        json!({
            "universityName": { "type": "STRING" },
            "programName": { "type": "STRING" },
            "city": { "type": "STRING" },
            "language": { "type": "STRING" },
            "annualFee": { "type": "INTEGER" },
            "description": { "type": "STRING" },
            "websiteUrl": { "type": "STRING" },
        }),
        &[
            "universityName",
            "programName",
            "city",
            "language",
            "annualFee",
            "description",
            "websiteUrl",
        ],
    )
}
