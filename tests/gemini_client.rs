use serde_json::json;
use studymap::{
    core::{catalog::Catalog, config::ServiceConfig},
    programs::{LanguageFilter, UniversityFilters},
    service::{queries, ChatMessage, GenerateRequest},
    ContentService, GeminiClient, StudyMapError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

/// Tests for the REST client against a mock endpoint
#[cfg(test)]
mod gemini_client_tests {
    use super::*;

    fn client(server: &MockServer) -> GeminiClient {
        let config = ServiceConfig::default()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        GeminiClient::new(config).unwrap()
    }

    fn answer(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn test_text_request_sends_key_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("Ciao!")))
            .expect(1)
            .mount(&server)
            .await;

        let generation = client(&server)
            .generate(GenerateRequest::text("greeting", "hello"))
            .await
            .unwrap();
        assert_eq!(generation.text, "Ciao!");
        assert!(generation.sources.is_empty());
    }

    #[tokio::test]
    async fn test_grounded_guide_carries_sources() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({ "tools": [{ "google_search": {} }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "## Permesso di soggiorno\n\nApply within **8 days**." }] },
                    "groundingMetadata": { "groundingChunks": [
                        { "web": { "uri": "https://www.poliziadistato.it", "title": "Polizia di Stato" } }
                    ]}
                }]
            })))
            .mount(&server)
            .await;

        let catalog = Catalog::seeded();
        let city = catalog.city("milan").unwrap();
        let topic = catalog.topic("visa").unwrap();

        let guide = queries::fetch_topic_guide(&client(&server), city, topic).await.unwrap();
        assert!(guide.markdown.starts_with("## Permesso"));
        assert!(guide.html.contains("<strong>8 days</strong>"));
        assert_eq!(guide.sources.len(), 1);
        assert_eq!(guide.sources[0].uri, "https://www.poliziadistato.it");
    }

    #[tokio::test]
    async fn test_structured_stats_are_clamped() {
        let server = MockServer::start().await;
        let stats = r#"```json
[{"metric": "Cost of Living", "value": 120, "summary": "Pricey."},
 {"metric": "Safety", "value": 71.6, "summary": "Safe overall."}]
```"#;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer(stats)))
            .mount(&server)
            .await;

        let catalog = Catalog::seeded();
        let stats = queries::fetch_city_stats(&client(&server), catalog.city("bologna").unwrap())
            .await
            .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].value, 100);
        assert_eq!(stats[1].value, 72);
    }

    #[tokio::test]
    async fn test_service_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .generate(GenerateRequest::text("quota", "hello"))
            .await
            .unwrap_err();
        match err {
            StudyMapError::Service { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_answer_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let result = client(&server).generate(GenerateRequest::text("blocked", "hello")).await;
        assert!(matches!(result, Err(StudyMapError::InvalidContent(_))));
    }

    #[tokio::test]
    async fn test_program_search_is_grounded_and_structured() {
        let server = MockServer::start().await;
        let programs = r#"[{"universityName": "Università di Padova", "programName": "Psychology",
            "city": "Padua", "language": "English", "annualFee": 2700.4,
            "websiteUrl": "www.unipd.it"}]"#;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({
                "tools": [{ "google_search": {} }],
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer(programs)))
            .expect(1)
            .mount(&server)
            .await;

        let filters = UniversityFilters {
            language: LanguageFilter::English,
            ..UniversityFilters::default()
        };
        let found = queries::fetch_universities(&client(&server), &filters).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].annual_fee, 2700);
        assert_eq!(found[0].website_url, None);
    }

    #[tokio::test]
    async fn test_assistant_sends_instruction_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "Is Bologna expensive?" }] },
                    { "role": "model", "parts": [{ "text": "Moderately." }] },
                    { "role": "user", "parts": [{ "text": "And Turin?" }] }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("Cheaper than Milan.")))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![ChatMessage::user("Is Bologna expensive?"), ChatMessage::model("Moderately.")];
        let reply = queries::ask_assistant(&client(&server), history, "And Turin?").await.unwrap();
        assert_eq!(reply.text, "Cheaper than Milan.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .is_some_and(|text| text.contains("Guido")));
    }
}
