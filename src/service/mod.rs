//! Generative content service.
//!
//! [`ContentService`] is the seam between the app and the hosted language
//! model. [`gemini::GeminiClient`] talks to the real API; tests script their
//! own implementations. The typed requests built on top of it live in
//! [`queries`].

pub mod gemini;
pub mod model;
pub mod prompts;
pub mod queries;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use model::{ChatMessage, ChatRole, Source};

/// Shape the model is asked to answer in
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Free text (Markdown)
    Text,
    /// JSON matching the given response schema
    Json(serde_json::Value),
}

/// One prompt sent to the content service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Short description used in logs
    pub label: String,
    pub prompt: String,
    pub format: ResponseFormat,
    /// Enables web search grounding; the answer then carries sources
    pub grounded: bool,
    /// Standing instruction for a conversation
    pub system: Option<String>,
    /// Earlier turns of a conversation, oldest first; `prompt` follows them
    pub history: Vec<ChatMessage>,
}

impl GenerateRequest {
    pub fn text(label: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            format: ResponseFormat::Text,
            grounded: false,
            system: None,
            history: Vec::new(),
        }
    }

    /// Next user turn of a conversation
    pub fn chat(
        label: impl Into<String>,
        system: impl Into<String>,
        history: Vec<ChatMessage>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            system: Some(system.into()),
            history,
            ..Self::text(label, prompt)
        }
    }

    pub fn json(label: impl Into<String>, prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            format: ResponseFormat::Json(schema),
            grounded: false,
            system: None,
            history: Vec::new(),
        }
    }

    pub fn with_grounding(mut self, grounded: bool) -> Self {
        self.grounded = grounded;
        self
    }
}

/// The model's answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait ContentService: Send + Sync {
    /// Sends one prompt. Timeouts and transport retries belong to the
    /// implementation.
    async fn generate(&self, request: GenerateRequest) -> Result<Generation>;
}
