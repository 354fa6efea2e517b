//! Prelude module for common studymap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use studymap::prelude::*;`

pub use crate::core::{
    catalog::{Catalog, City, SubTopic, Topic},
    config::{CacheConfig, ExplorerConfig, InteractionProfile, ServiceConfig, ViewportConfig},
    deeplink::DeepLink,
    geo::{Bounds, MapCoord, Point},
    selection::{SelectOutcome, SelectionMode, SelectionState},
    viewport::{Transform, Viewport, ViewboxFit},
};

pub use crate::input::{
    events::{HitTarget, InputEvent, KeyModifiers, ZoomDirection},
    handler::{Action, GestureController, TransformAnimation},
};

pub use crate::content::{
    cache::ContentCache,
    keys::{CacheKey, KeyClass},
    orchestrator::{CacheFetch, Commit, GenerationCounter, ViewState},
    storage::{FileStore, KeyValueStore, MemoryStore},
};

pub use crate::service::{
    gemini::GeminiClient,
    model::{
        ChatMessage, ChatRole, CityIntro, CityStat, ComparisonDataPoint, LanguageFilter, Source,
        TeachingLanguage, TopicGuide, UniversityFilters, UniversityProgram,
    },
    ContentService, GenerateRequest, Generation,
};

pub use crate::chat::Conversation;
pub use crate::compare::{CityComparisonResult, ComparisonAggregator};
pub use crate::explorer::{Explorer, Notice};
pub use crate::feedback::{FeedbackKind, FeedbackStore};
pub use crate::programs::ProgramFinder;
pub use crate::recommend::{CityRecommendation, RecommendationClient, SurveyAnswers};
pub use crate::traits::CacheValue;

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{Error as StudyMapError, Result};

pub use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
