//! Client for the Generative Language `generateContent` REST endpoint

use crate::core::config::ServiceConfig;
use crate::service::{ContentService, GenerateRequest, Generation, ResponseFormat, Source};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// [`ContentService`] backed by the hosted Gemini models
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl GeminiClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout);

        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ServiceConfig::from_env())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn body<'a>(request: &'a GenerateRequest) -> RequestBody<'a> {
        let generation_config = match &request.format {
            ResponseFormat::Text => None,
            ResponseFormat::Json(schema) => Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
        };
        let tools = if request.grounded {
            vec![Tool {
                google_search: serde_json::Map::new(),
            }]
        } else {
            Vec::new()
        };

        let contents = request
            .history
            .iter()
            .map(|message| RequestContent {
                role: message.role.as_str(),
                parts: [RequestPart { text: &message.text }],
            })
            .chain(std::iter::once(RequestContent {
                role: "user",
                parts: [RequestPart {
                    text: &request.prompt,
                }],
            }))
            .collect();

        RequestBody {
            contents,
            system_instruction: request.system.as_deref().map(|text| SystemInstruction {
                parts: [RequestPart { text }],
            }),
            generation_config,
            tools,
        }
    }
}

fn into_generation(body: ResponseBody) -> Result<Generation> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidContent("response has no candidates".into()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::InvalidContent(format!(
            "empty response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    let mut sources: Vec<Source> = Vec::new();
    let chunks = candidate
        .grounding_metadata
        .map(|meta| meta.grounding_chunks)
        .unwrap_or_default();
    for web in chunks.into_iter().filter_map(|chunk| chunk.web) {
        let Some(uri) = web.uri.filter(|uri| !uri.trim().is_empty()) else {
            continue;
        };
        if sources.iter().any(|source| source.uri == uri) {
            continue;
        }
        sources.push(Source {
            uri,
            title: web.title.unwrap_or_default(),
        });
    }

    Ok(Generation { text, sources })
}

#[async_trait]
impl ContentService for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Generation> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("no API key configured (set GEMINI_API_KEY)".into()))?;

        log::debug!("generate {} (grounded: {})", request.label, request.grounded);

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&Self::body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or(raw);
            return Err(Error::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: ResponseBody = response.json().await?;
        let generation = into_generation(body)?;
        log::debug!(
            "{} returned {} bytes, {} sources",
            request.label,
            generation.text.len(),
            generation.sources.len()
        );
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest::json("stats", "prompt", json!({"type": "ARRAY"})).with_grounding(true);
        let body = serde_json::to_value(GeminiClient::body(&request)).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert_eq!(body["tools"], json!([{ "google_search": {} }]));

        let plain = serde_json::to_value(GeminiClient::body(&GenerateRequest::text("guide", "p"))).unwrap();
        assert!(plain.get("generationConfig").is_none());
        assert!(plain.get("tools").is_none());
        assert!(plain.get("systemInstruction").is_none());
    }

    #[test]
    fn test_chat_body_carries_history() {
        use crate::service::ChatMessage;

        let request = GenerateRequest::chat(
            "chat",
            "Be brief.",
            vec![ChatMessage::user("Hi"), ChatMessage::model("Ciao!")],
            "Visa?",
        );
        let body = serde_json::to_value(GeminiClient::body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, ["user", "model", "user"]);
        assert_eq!(body["contents"][2]["parts"][0]["text"], "Visa?");
    }

    #[test]
    fn test_response_parsing_collects_sources() {
        let body: ResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "# Visa" }, { "text": " guide" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.example", "title": "A" } },
                    { "web": { "uri": "https://a.example", "title": "A again" } },
                    { "web": { "title": "no uri" } },
                    { "retrievedContext": {} }
                ]}
            }]
        }))
        .unwrap();

        let generation = into_generation(body).unwrap();
        assert_eq!(generation.text, "# Visa guide");
        assert_eq!(
            generation.sources,
            vec![Source {
                uri: "https://a.example".into(),
                title: "A".into()
            }]
        );
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let body: ResponseBody = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        assert!(matches!(into_generation(body), Err(Error::InvalidContent(_))));
        assert!(into_generation(ResponseBody::default()).is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = GeminiClient::new(ServiceConfig::default()).unwrap();
        let result = client.generate(GenerateRequest::text("t", "p")).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
