//! # studymap
//!
//! Interactive study-abroad explorer for Italian cities.
//!
//! The library provides the schematic map viewport and its gesture
//! controller, a two-tier cache for generated city content with
//! stale-while-revalidate fetching, a parallel comparison aggregator and a
//! recommendation client, all tied together by [`explorer::Explorer`].

pub mod chat;
pub mod checklist;
pub mod compare;
pub mod content;
pub mod core;
pub mod explorer;
pub mod feedback;
pub mod input;
pub mod prefs;
pub mod prelude;
pub mod programs;
pub mod recommend;
pub mod runtime;
pub mod service;
pub mod traits;
#[cfg(feature = "egui")]
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    catalog::{Catalog, City, SubTopic, Topic},
    config::ExplorerConfig,
    geo::{Bounds, MapCoord, Point},
    viewport::{Transform, Viewport},
};

pub use input::{events::InputEvent, handler::GestureController};

pub use content::{
    cache::ContentCache,
    orchestrator::{CacheFetch, ViewState},
};

pub use compare::aggregator::ComparisonAggregator;

pub use explorer::{Explorer, Notice};

pub use service::{gemini::GeminiClient, ContentService};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, StudyMapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum StudyMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown {kind}: {id}")]
    UnknownEntity { kind: &'static str, id: String },
}

impl StudyMapError {
    pub fn unknown_city(id: impl Into<String>) -> Self {
        Self::UnknownEntity {
            kind: "city",
            id: id.into(),
        }
    }

    pub fn unknown_topic(id: impl Into<String>) -> Self {
        Self::UnknownEntity {
            kind: "topic",
            id: id.into(),
        }
    }
}

/// Error type alias for convenience
pub type Error = StudyMapError;
