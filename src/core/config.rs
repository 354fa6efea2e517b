//! Configuration system for map interaction, the content service and caching
//!
//! Interaction settings come as presets (`InteractionProfile`) that resolve
//! into concrete options, service and cache settings are read from the
//! environment.

use crate::core::constants::{
    BUTTON_ZOOM_FACTOR, CITY_ZOOM, DEFAULT_MEMORY_CACHE_ENTRIES, DOUBLE_CLICK_ZOOM_FACTOR,
    MAX_ZOOM, MIN_ZOOM, TRANSITION_MS, VIEWBOX_HEIGHT, VIEWBOX_WIDTH, ZOOM_SPEED,
};
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionProfile {
    Desktop,
    Touch,
    Custom(ViewportConfig),
}

impl InteractionProfile {
    pub fn resolve(&self) -> ViewportConfig {
        match self {
            Self::Desktop => ViewportConfig::default(),
            Self::Touch => ViewportConfig {
                zoom_speed: 0.0025,
                double_click_factor: 2.0,
                button_factor: 2.0,
                ..ViewportConfig::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for InteractionProfile {
    fn default() -> Self {
        Self::Desktop
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub viewbox_width: f64,
    pub viewbox_height: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_speed: f64,
    pub double_click_factor: f64,
    pub button_factor: f64,
    pub city_zoom: f64,
    pub transition_ms: u64,
}

impl ViewportConfig {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewbox_width <= 0.0 || self.viewbox_height <= 0.0 {
            return Err(Error::Config("viewbox dimensions must be positive".into()));
        }
        if self.min_zoom <= 0.0 || self.min_zoom >= self.max_zoom {
            return Err(Error::Config(format!(
                "zoom limits must satisfy 0 < min < max, got [{}, {}]",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.zoom_speed <= 0.0 {
            return Err(Error::Config("zoom speed must be positive".into()));
        }
        if self.double_click_factor <= 1.0 || self.button_factor <= 1.0 {
            return Err(Error::Config("zoom step factors must be greater than 1".into()));
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            viewbox_width: VIEWBOX_WIDTH,
            viewbox_height: VIEWBOX_HEIGHT,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_speed: ZOOM_SPEED,
            double_click_factor: DOUBLE_CLICK_ZOOM_FACTOR,
            button_factor: BUTTON_ZOOM_FACTOR,
            city_zoom: CITY_ZOOM,
            transition_ms: TRANSITION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url =
            std::env::var("STUDYMAP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("STUDYMAP_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            api_key,
            base_url,
            model,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("studymap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub memory_capacity: usize,
    pub storage_path: Option<PathBuf>,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            storage_path: std::env::var_os("STUDYMAP_CACHE_PATH").map(PathBuf::from),
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: DEFAULT_MEMORY_CACHE_ENTRIES,
            storage_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExplorerConfig {
    pub viewport: ViewportConfig,
    pub service: ServiceConfig,
    pub cache: CacheConfig,
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        Self {
            viewport: InteractionProfile::default().resolve(),
            service: ServiceConfig::from_env(),
            cache: CacheConfig::from_env(),
        }
    }

    pub fn with_profile(mut self, profile: InteractionProfile) -> Self {
        self.viewport = profile.resolve();
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.viewport.validate()?;
        if self.service.model.trim().is_empty() {
            return Err(Error::Config("model name must not be empty".into()));
        }
        if self.cache.memory_capacity == 0 {
            return Err(Error::Config("memory cache capacity must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_profile_presets() {
        let desktop = InteractionProfile::Desktop.resolve();
        let touch = InteractionProfile::Touch.resolve();

        assert_eq!(desktop.min_zoom, 0.9);
        assert_eq!(desktop.max_zoom, 8.0);
        assert_eq!(desktop.double_click_factor, 1.8);

        assert!(touch.zoom_speed < desktop.zoom_speed);
        assert!(touch.button_factor > desktop.button_factor);
        assert_eq!(touch.viewbox_width, desktop.viewbox_width);
    }

    #[test]
    fn test_viewport_config_validation() {
        assert!(ViewportConfig::default().validate().is_ok());

        let inverted = ViewportConfig {
            min_zoom: 4.0,
            max_zoom: 2.0,
            ..ViewportConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::Config(_))));

        let flat_step = ViewportConfig {
            button_factor: 1.0,
            ..ViewportConfig::default()
        };
        assert!(flat_step.validate().is_err());
    }

    #[test]
    fn test_service_endpoint() {
        let config = ServiceConfig::default().with_base_url("http://localhost:9000/");
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_explorer_config_validation() {
        let mut config = ExplorerConfig::default();
        assert!(config.validate().is_ok());
        config.cache.memory_capacity = 0;
        assert!(config.validate().is_err());
    }
}
