//! University program finder: filters plus the latest search result

use crate::content::orchestrator::{GenerationCounter, ViewState};
use crate::Result;

pub use crate::service::model::{LanguageFilter, TeachingLanguage, UniversityFilters, UniversityProgram};

pub const PROGRAM_SEARCH_FAILURE: &str =
    "Programs could not be loaded. Change your filters and try again.";

/// Search state; each search makes the previous one stale
#[derive(Debug, Default)]
pub struct ProgramFinder {
    filters: UniversityFilters,
    state: ViewState<Vec<UniversityProgram>>,
    generations: GenerationCounter,
}

impl ProgramFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &UniversityFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: UniversityFilters) {
        self.filters = filters.normalized();
    }

    pub fn state(&self) -> &ViewState<Vec<UniversityProgram>> {
        &self.state
    }

    /// Whether a search has been run since the finder was created
    pub fn has_searched(&self) -> bool {
        !matches!(self.state, ViewState::Idle)
    }

    pub(crate) fn begin(&mut self) -> u64 {
        self.state = ViewState::Loading;
        self.generations.advance()
    }

    /// Commits a search result; false when a newer search has started
    pub(crate) fn complete(&mut self, generation: u64, result: Result<Vec<UniversityProgram>>) -> bool {
        if !self.generations.is_current(generation) {
            log::debug!("dropping stale program search (generation {generation})");
            return false;
        }
        self.state = match result {
            Ok(programs) => {
                log::debug!("program search found {} programs", programs.len());
                ViewState::Ready {
                    content: programs,
                    fresh: true,
                }
            }
            Err(err) => {
                log::error!("program search failed: {err}");
                ViewState::Failed {
                    message: PROGRAM_SEARCH_FAILURE.to_string(),
                }
            }
        };
        true
    }
}
