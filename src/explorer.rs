//! The explorer: every piece of application state in one container.
//!
//! UI code owns one [`Explorer`], forwards input and user choices to it,
//! calls [`Explorer::tick`] and [`Explorer::poll`] once per frame and renders
//! from its accessors. Network work runs on the async runtime and comes back
//! through [`Explorer::poll`], so all state changes happen on the owning
//! thread.
//!
//! Operations that start a request need an async runtime on the calling
//! thread (see [`crate::runtime`]). Without one they return
//! [`Error::Config`] and the affected view shows its failure state.

use crate::chat::Conversation;
use crate::checklist::Checklist;
use crate::compare::aggregator::{CityComparisonResult, ComparisonAggregator};
use crate::compare::panel::{ComparisonPanel, NO_CRITERIA_MESSAGE};
use crate::constants::MAX_COMPARISON_CITIES;
use crate::content::cache::ContentCache;
use crate::content::dispatch::FetchDispatcher;
use crate::content::keys::{CacheKey, KeyClass};
use crate::content::orchestrator::{CacheFetch, Commit, Ticket, ViewState};
use crate::content::storage::{KeyValueStore, MemoryStore};
use crate::core::catalog::{Catalog, City, Topic};
use crate::core::config::ExplorerConfig;
use crate::core::deeplink::{self, DeepLink};
use crate::core::selection::{SelectOutcome, SelectionMode, SelectionState};
use crate::core::viewport::{Transform, Viewport};
use crate::feedback::{FeedbackKind, FeedbackStore, FeedbackTracker, LocalFeedbackStore};
use crate::input::events::InputEvent;
use crate::input::handler::{Action, GestureController, TransformAnimation, ViewportOperations};
use crate::prefs::MarkerPrefs;
use crate::prelude::{Arc, Duration, Future};
use crate::programs::ProgramFinder;
use crate::recommend::{
    CityRecommendation, FirstRunPrompt, Onboarding, RecommendationClient, SurveyAnswers,
    RECOMMENDATION_FAILURE_NOTICE,
};
use crate::service::gemini::GeminiClient;
use crate::service::model::{CityIntro, CityStat, TopicGuide, UniversityFilters, UniversityProgram};
use crate::service::{queries, ContentService, Generation};
use crate::{Error, Result};

pub const TOPIC_FAILURE_MESSAGE: &str =
    "Something went wrong while loading this guide. Please try again.";
pub const STATS_FAILURE_MESSAGE: &str = "City statistics are unavailable right now.";
pub const FEEDBACK_THANKS: &str = "Thanks for your feedback!";
pub const FEEDBACK_FAILURE: &str = "Your feedback could not be sent. Please try again.";

fn comparison_limit_message() -> String {
    format!("You can compare at most {MAX_COMPARISON_CITIES} cities.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dismissable message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// A finished background request, applied by [`Explorer::poll`]
enum Completion {
    Intros {
        ticket: Ticket,
        result: Result<Vec<CityIntro>>,
    },
    Stats {
        ticket: Ticket,
        result: Result<Vec<CityStat>>,
    },
    Guide {
        ticket: Ticket,
        result: Result<TopicGuide>,
    },
    Comparison {
        generation: u64,
        result: Result<Vec<CityComparisonResult>>,
    },
    Recommendations(Result<Vec<CityRecommendation>>),
    Programs {
        generation: u64,
        result: Result<Vec<UniversityProgram>>,
    },
    Chat(Result<Generation>),
    Feedback {
        city_id: String,
        topic_id: String,
        result: Result<bool>,
    },
}

pub struct Explorer {
    config: ExplorerConfig,
    catalog: Catalog,
    store: Arc<dyn KeyValueStore>,
    cache: ContentCache,
    service: Arc<dyn ContentService>,

    viewport: Viewport,
    gestures: GestureController,
    animation: Option<TransformAnimation>,

    selection: SelectionState,
    panel_open: bool,
    intros: CacheFetch<Vec<CityIntro>>,
    stats: CacheFetch<Vec<CityStat>>,
    guide: CacheFetch<TopicGuide>,
    checklist: Option<Checklist>,

    comparison: ComparisonPanel,
    aggregator: ComparisonAggregator,

    onboarding: Onboarding,
    recommender: RecommendationClient,
    recommendations: Vec<CityRecommendation>,
    recommending: bool,

    programs: ProgramFinder,
    chat: Conversation,

    feedback: FeedbackTracker,
    marker_prefs: MarkerPrefs,
    notices: Vec<Notice>,
    next_notice: u64,

    dispatcher: FetchDispatcher<Completion>,
}

impl Explorer {
    pub fn new(
        config: ExplorerConfig,
        service: Arc<dyn ContentService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = ContentCache::new(store.clone(), config.cache.memory_capacity);
        let feedback_store: Arc<dyn FeedbackStore> = Arc::new(LocalFeedbackStore::new(store.clone()));

        Ok(Self {
            catalog: Catalog::seeded(),
            viewport: Viewport::from_config(config.viewport.clone()),
            gestures: GestureController::from_config(&config.viewport),
            animation: None,
            selection: SelectionState::new(),
            panel_open: false,
            intros: CacheFetch::new(cache.clone(), KeyClass::CityIntros),
            stats: CacheFetch::new(cache.clone(), KeyClass::CityStats)
                .with_failure_message(STATS_FAILURE_MESSAGE),
            guide: CacheFetch::new(cache.clone(), KeyClass::TopicGuide)
                .with_failure_message(TOPIC_FAILURE_MESSAGE),
            checklist: None,
            comparison: ComparisonPanel::with_generations(cache.generations(KeyClass::Comparison)),
            aggregator: ComparisonAggregator::new(service.clone(), cache.clone()),
            onboarding: Onboarding::new(store.clone()),
            recommender: RecommendationClient::new(service.clone()),
            recommendations: Vec::new(),
            recommending: false,
            programs: ProgramFinder::new(),
            chat: Conversation::new(),
            feedback: FeedbackTracker::new(store.clone(), feedback_store),
            marker_prefs: MarkerPrefs::load(store.as_ref()),
            notices: Vec::new(),
            next_notice: 0,
            dispatcher: FetchDispatcher::new(),
            config,
            store,
            cache,
            service,
        })
    }

    /// Gemini-backed explorer, persisting to the configured cache file (or
    /// keeping everything in memory when none is set)
    pub fn from_config(config: ExplorerConfig) -> Result<Self> {
        let service: Arc<dyn ContentService> = Arc::new(GeminiClient::new(config.service.clone())?);
        let store: Arc<dyn KeyValueStore> = match &config.cache.storage_path {
            Some(path) => Arc::new(crate::content::storage::FileStore::open(path)?),
            None => default_store(),
        };
        Self::new(config, service, store)
    }

    /// Replaces where feedback is recorded
    pub fn with_feedback_store(mut self, store: Arc<dyn FeedbackStore>) -> Self {
        self.feedback = FeedbackTracker::new(self.store.clone(), store);
        self
    }

    /// Renders cached city intros and refreshes them in the background. In
    /// the browser this also opens the page's deep link.
    pub fn start(&mut self) -> Result<()> {
        let ticket = self.intros.begin(CacheKey::CityIntros);
        if let Some(intros) = self.intros.state().content() {
            let updated = self.catalog.apply_intros(intros);
            log::debug!("applied {updated} cached city intros");
        }

        let service = self.service.clone();
        let cities = self.catalog.cities().to_vec();
        let fallback = ticket.clone();
        self.launch(
            async move {
                let result = queries::fetch_city_intros(service.as_ref(), &cities).await;
                Completion::Intros { ticket, result }
            },
            |result| Completion::Intros {
                ticket: fallback,
                result: Err(result),
            },
        )?;

        #[cfg(feature = "wasm")]
        self.apply_deep_link(&DeepLink::from_location(), 0.0)?;
        Ok(())
    }

    /// Hands `future` to the dispatcher. When it cannot run, the completion
    /// built by `failed` is applied at once and the error is returned.
    fn launch<F>(&mut self, future: F, failed: impl FnOnce(Error) -> Completion) -> Result<()>
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        match self.dispatcher.dispatch(future) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::error!("request not started: {err}");
                self.apply(failed(Error::Config(err.to_string())));
                Err(err)
            }
        }
    }

    // ---- accessors ----

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.selection.city().and_then(|id| self.catalog.city(id))
    }

    pub fn selected_topic(&self) -> Option<&Topic> {
        self.selection.topic().and_then(|id| self.catalog.topic(id))
    }

    pub fn comparison_cities(&self) -> Vec<&City> {
        self.selection
            .comparison()
            .iter()
            .filter_map(|id| self.catalog.city(id))
            .collect()
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn guide(&self) -> &ViewState<TopicGuide> {
        self.guide.state()
    }

    pub fn stats(&self) -> &ViewState<Vec<CityStat>> {
        self.stats.state()
    }

    pub fn comparison(&self) -> &ComparisonPanel {
        &self.comparison
    }

    pub fn checklist(&self) -> Option<&Checklist> {
        self.checklist.as_ref()
    }

    pub fn recommendations(&self) -> &[CityRecommendation] {
        &self.recommendations
    }

    pub fn is_recommending(&self) -> bool {
        self.recommending
    }

    pub fn marker_prefs(&self) -> MarkerPrefs {
        self.marker_prefs
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn programs(&self) -> &ProgramFinder {
        &self.programs
    }

    pub fn conversation(&self) -> &Conversation {
        &self.chat
    }

    /// Where the view is heading; the current transform when not animating
    pub fn target_transform(&self) -> Transform {
        self.animation
            .map(|animation| animation.to)
            .unwrap_or_else(|| self.viewport.transform())
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Requests still running
    pub fn is_busy(&self) -> bool {
        !self.dispatcher.is_idle()
    }

    // ---- map ----

    /// Feeds one input event through the gesture controller. `now` is the
    /// frame clock in seconds, used to start zoom animations.
    ///
    /// Stepped zooms (double-click, zoom buttons) compound from the target of
    /// a running animation, not from the frame currently shown.
    pub fn handle_input(&mut self, event: InputEvent, now: f64) -> Result<Vec<Action>> {
        let actions = match self.animation {
            Some(animation) if event.is_stepped_zoom() => {
                let settled = self.viewport.with_transform(animation.to);
                self.gestures.handle_event(event, &settled)
            }
            _ => self.gestures.handle_event(event, &self.viewport),
        };
        for action in &actions {
            match action {
                Action::Zoom {
                    transform,
                    animate: true,
                    duration,
                    ..
                } => {
                    self.animation = Some(TransformAnimation::new(
                        self.viewport.transform(),
                        *transform,
                        now,
                        *duration,
                    ));
                }
                _ => {
                    if action.transform().is_some() || matches!(action, Action::StartDrag) {
                        self.animation = None;
                    }
                    ViewportOperations::execute_action(&mut self.viewport, action)?;
                }
            }
        }
        Ok(actions)
    }

    /// Advances the running view animation; true while it is still running
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        let (transform, finished) = animation.sample(now);
        self.viewport.set_transform(transform);
        if finished {
            self.animation = None;
        }
        !finished
    }

    fn fly_to(&mut self, target: Transform, now: f64) {
        let target = self.viewport.clamp(target);
        self.animation = Some(TransformAnimation::new(
            self.viewport.transform(),
            target,
            now,
            self.config.viewport.transition(),
        ));
    }

    // ---- selection ----

    /// Handles a click on a city marker (or a search result). The selection
    /// changes even when the stats request cannot be started.
    pub fn select_city(&mut self, id: &str, now: f64) -> Result<SelectOutcome> {
        let city = self
            .catalog
            .city(id)
            .cloned()
            .ok_or_else(|| Error::unknown_city(id))?;

        let outcome = self.selection.select_city(id);
        match &outcome {
            SelectOutcome::Selected(_) => {
                let target = self
                    .viewport
                    .compute_zoom_to_city(&city.coords, self.config.viewport.city_zoom);
                self.fly_to(target, now);
                self.guide.cancel();
                self.panel_open = true;
                self.checklist = Some(Checklist::load(self.store.clone(), &city.id));
                self.load_stats(city)?;
            }
            SelectOutcome::Deselected => self.reset(now),
            SelectOutcome::Added(_) | SelectOutcome::Removed(_) => self.comparison.invalidate(),
            SelectOutcome::LimitReached => {
                self.notify(NoticeLevel::Warning, comparison_limit_message());
            }
        }
        Ok(outcome)
    }

    /// Opens a topic guide for the selected city. Returns false when no city
    /// is selected or compare mode is on.
    pub fn select_topic(&mut self, id: &str) -> Result<bool> {
        let topic = self
            .catalog
            .topic(id)
            .cloned()
            .ok_or_else(|| Error::unknown_topic(id))?;

        if !self.selection.select_topic(id) {
            return Ok(false);
        }
        let Some(city) = self.selected_city().cloned() else {
            return Ok(false);
        };

        self.panel_open = true;
        let ticket = self.guide.begin(CacheKey::topic_guide(&city.id, &topic.id));
        self.spawn_guide(ticket, city, topic)?;
        Ok(true)
    }

    /// Re-runs the open guide's fetch; false when no guide is open
    pub fn retry_topic(&mut self) -> Result<bool> {
        let (Some(city), Some(topic)) = (self.selected_city().cloned(), self.selected_topic().cloned()) else {
            return Ok(false);
        };
        match self.guide.retry() {
            Some(ticket) => self.spawn_guide(ticket, city, topic).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn retry_stats(&mut self) -> Result<bool> {
        let Some(city) = self.selected_city().cloned() else {
            return Ok(false);
        };
        match self.stats.retry() {
            Some(ticket) => self.spawn_stats(ticket, city).map(|_| true),
            None => Ok(false),
        }
    }

    /// Closes the side panel and its topic; the city stays selected
    pub fn close_panel(&mut self) {
        self.panel_open = false;
        self.selection.clear_topic();
        self.guide.cancel();
    }

    /// Clears selection, comparison and recommendations and flies back to
    /// the whole map
    pub fn reset(&mut self, now: f64) {
        self.selection = SelectionState::new();
        self.panel_open = false;
        self.guide.cancel();
        self.stats.cancel();
        self.checklist = None;
        self.comparison.clear();
        self.recommendations.clear();
        self.gestures.cancel();
        self.fly_to(Transform::identity(), now);
    }

    /// Switches between explore and compare mode, starting from a clean view
    pub fn toggle_comparison_mode(&mut self, now: f64) -> SelectionMode {
        let entering = !self.selection.is_comparing();
        self.reset(now);
        if entering {
            self.selection.toggle_mode();
        }
        self.selection.mode()
    }

    fn load_stats(&mut self, city: City) -> Result<()> {
        let ticket = self.stats.begin(CacheKey::city_stats(&city.id));
        self.spawn_stats(ticket, city)
    }

    fn spawn_stats(&mut self, ticket: Ticket, city: City) -> Result<()> {
        let service = self.service.clone();
        let fallback = ticket.clone();
        self.launch(
            async move {
                let result = queries::fetch_city_stats(service.as_ref(), &city).await;
                Completion::Stats { ticket, result }
            },
            |result| Completion::Stats {
                ticket: fallback,
                result: Err(result),
            },
        )
    }

    fn spawn_guide(&mut self, ticket: Ticket, city: City, topic: Topic) -> Result<()> {
        let service = self.service.clone();
        let fallback = ticket.clone();
        self.launch(
            async move {
                let result = queries::fetch_topic_guide(service.as_ref(), &city, &topic).await;
                Completion::Guide { ticket, result }
            },
            |result| Completion::Guide {
                ticket: fallback,
                result: Err(result),
            },
        )
    }

    // ---- comparison ----

    pub fn set_comparison_topic(&mut self, id: &str) -> Result<()> {
        let topic = self
            .catalog
            .topic(id)
            .cloned()
            .ok_or_else(|| Error::unknown_topic(id))?;
        self.comparison.set_topic(topic);
        Ok(())
    }

    pub fn toggle_comparison_sub_topic(&mut self, id: &str) -> bool {
        self.comparison.toggle_sub_topic(id)
    }

    /// Starts a comparison of the current set. Invalid requests are shown in
    /// the panel and returned as errors without contacting the service.
    pub fn run_comparison(&mut self) -> Result<()> {
        let Some(topic) = self.comparison.topic().cloned() else {
            let message = "Select a topic to compare.";
            self.comparison.reject(message);
            return Err(Error::InvalidRequest(message.into()));
        };
        let sub_topics = self.comparison.selected_sub_topics();
        let cities: Vec<City> = self.comparison_cities().into_iter().cloned().collect();

        if let Err(err) = ComparisonAggregator::validate(&cities, &sub_topics) {
            let message = match &err {
                _ if sub_topics.is_empty() => NO_CRITERIA_MESSAGE.to_string(),
                Error::InvalidRequest(message) => message.clone(),
                other => other.to_string(),
            };
            self.comparison.reject(message);
            return Err(err);
        }

        let cached = self.aggregator.cached(&cities, &topic, &sub_topics);
        let generation = self.comparison.begin(cached);
        let aggregator = self.aggregator.clone();
        self.launch(
            async move {
                let result = aggregator.compare(&cities, &topic, &sub_topics).await;
                Completion::Comparison { generation, result }
            },
            |result| Completion::Comparison {
                generation,
                result: Err(result),
            },
        )
    }

    // ---- links ----

    /// Opens the city and topic named by a link. Links naming an unknown
    /// city or topic, or missing either, are ignored and give `Ok(false)`.
    pub fn apply_deep_link(&mut self, link: &DeepLink, now: f64) -> Result<bool> {
        let Some((city_id, topic_id)) = link.resolve(&self.catalog) else {
            if link != &DeepLink::default() {
                log::debug!("ignoring deep link {link:?}");
            }
            return Ok(false);
        };
        let (Some(city), Some(topic)) = (
            self.catalog.city(city_id).cloned(),
            self.catalog.topic(topic_id).cloned(),
        ) else {
            return Ok(false);
        };

        self.comparison.clear();
        self.selection.open(&city.id, &topic.id);
        let target = self
            .viewport
            .compute_zoom_to_city(&city.coords, self.config.viewport.city_zoom);
        self.fly_to(target, now);
        self.panel_open = true;
        self.checklist = Some(Checklist::load(self.store.clone(), &city.id));

        let ticket = self.guide.begin(CacheKey::topic_guide(&city.id, &topic.id));
        self.spawn_guide(ticket, city.clone(), topic)?;
        self.load_stats(city)?;
        Ok(true)
    }

    /// Link to the current view, or `None` without a selected city
    pub fn share_url(&self, base: &str) -> Result<Option<String>> {
        match self.selection.city() {
            Some(city) => deeplink::share_url(base, city, self.selection.topic()).map(Some),
            None => Ok(None),
        }
    }

    /// Closest other city to the selected one
    pub fn suggested_next_city(&self) -> Option<&City> {
        self.selection.city().and_then(|id| self.catalog.nearest_to(id))
    }

    pub fn travel_to_suggested(&mut self, now: f64) -> Result<Option<SelectOutcome>> {
        match self.suggested_next_city().map(|city| city.id.clone()) {
            Some(id) => self.select_city(&id, now).map(Some),
            None => Ok(None),
        }
    }

    // ---- first run, survey and recommendations ----

    pub fn pending_prompt(&self) -> Option<FirstRunPrompt> {
        self.onboarding.pending_prompt()
    }

    pub fn finish_tour(&mut self) -> Option<FirstRunPrompt> {
        self.onboarding.finish_tour()
    }

    /// Requests recommendations. The survey counts as completed whatever the
    /// outcome; a failure shows a notice.
    pub fn submit_survey(&mut self, answers: SurveyAnswers) -> Result<()> {
        self.onboarding.complete_survey();
        self.recommending = true;

        let client = self.recommender.clone();
        let cities = self.catalog.cities().to_vec();
        self.launch(
            async move { Completion::Recommendations(client.recommend(&answers, &cities).await) },
            |result| Completion::Recommendations(Err(result)),
        )
    }

    pub fn skip_survey(&mut self) {
        self.onboarding.complete_survey();
    }

    pub fn dismiss_recommendations(&mut self) {
        self.recommendations.clear();
    }

    // ---- feedback, checklist, preferences ----

    /// Whether feedback was already given for the open guide
    pub fn feedback_sent(&self) -> bool {
        match (self.selection.city(), self.selection.topic()) {
            (Some(city), Some(topic)) => self.feedback.already_sent(city, topic),
            _ => false,
        }
    }

    pub fn send_feedback(&mut self, kind: FeedbackKind) -> Result<()> {
        let (Some(city_id), Some(topic_id)) = (
            self.selection.city().map(str::to_string),
            self.selection.topic().map(str::to_string),
        ) else {
            return Err(Error::InvalidRequest("feedback needs an open guide".into()));
        };

        let tracker = self.feedback.clone();
        let failed_ids = (city_id.clone(), topic_id.clone());
        self.launch(
            async move {
                let result = tracker.send(&city_id, &topic_id, kind).await;
                Completion::Feedback {
                    city_id,
                    topic_id,
                    result,
                }
            },
            |result| Completion::Feedback {
                city_id: failed_ids.0,
                topic_id: failed_ids.1,
                result: Err(result),
            },
        )
    }

    pub fn toggle_checklist_item(&mut self, item_id: &str) -> bool {
        self.checklist
            .as_mut()
            .map(|checklist| checklist.toggle(item_id))
            .unwrap_or(false)
    }

    pub fn set_marker_prefs(&mut self, prefs: MarkerPrefs) {
        if prefs != self.marker_prefs {
            self.marker_prefs = prefs;
            prefs.save(self.store.as_ref());
        }
    }

    // ---- program finder ----

    pub fn set_program_filters(&mut self, filters: UniversityFilters) {
        self.programs.set_filters(filters);
    }

    /// Searches programs for the current filters; an earlier search still
    /// running is superseded. Results are not cached.
    pub fn search_programs(&mut self) -> Result<()> {
        let generation = self.programs.begin();
        let filters = *self.programs.filters();
        let service = self.service.clone();
        self.launch(
            async move {
                let result = queries::fetch_universities(service.as_ref(), &filters).await;
                Completion::Programs { generation, result }
            },
            |result| Completion::Programs {
                generation,
                result: Err(result),
            },
        )
    }

    // ---- assistant ----

    /// Sends a question to the assistant. Empty questions, or a question
    /// while the previous one is unanswered, are rejected.
    pub fn send_chat_message(&mut self, text: &str) -> Result<()> {
        let question = self.chat.ask(text)?;
        let history = self.chat.history().to_vec();
        let service = self.service.clone();
        self.launch(
            async move { Completion::Chat(queries::ask_assistant(service.as_ref(), history, &question).await) },
            |result| Completion::Chat(Err(result)),
        )
    }

    // ---- notices ----

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.next_notice += 1;
        self.notices.push(Notice {
            id: self.next_notice,
            level,
            message: message.into(),
        });
    }

    pub fn dismiss_notice(&mut self, id: u64) {
        self.notices.retain(|notice| notice.id != id);
    }

    // ---- completions ----

    /// Applies finished requests without blocking; returns how many
    pub fn poll(&mut self) -> usize {
        let completions = self.dispatcher.drain();
        let count = completions.len();
        for completion in completions {
            self.apply(completion);
        }
        count
    }

    /// Blocks until all running requests finish or `timeout` passes, then
    /// applies them. Not for the UI thread.
    pub fn settle(&mut self, timeout: Duration) -> usize {
        let completions = self.dispatcher.wait(timeout);
        let count = completions.len();
        for completion in completions {
            self.apply(completion);
        }
        count
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Intros { ticket, result } => {
                if self.intros.complete(&ticket, result) == Commit::Fresh {
                    if let Some(intros) = self.intros.state().content() {
                        let updated = self.catalog.apply_intros(intros);
                        log::info!("refreshed {updated} city descriptions");
                    }
                }
            }
            Completion::Stats { ticket, result } => {
                self.stats.complete(&ticket, result);
            }
            Completion::Guide { ticket, result } => {
                self.guide.complete(&ticket, result);
            }
            Completion::Comparison { generation, result } => {
                self.comparison.complete(generation, result);
            }
            Completion::Recommendations(result) => {
                self.recommending = false;
                match result {
                    Ok(recommendations) => self.recommendations = recommendations,
                    Err(err) => {
                        log::warn!("recommendations failed: {err}");
                        self.notify(NoticeLevel::Error, RECOMMENDATION_FAILURE_NOTICE);
                    }
                }
            }
            Completion::Programs { generation, result } => {
                self.programs.complete(generation, result);
            }
            Completion::Chat(result) => self.chat.receive(result),
            Completion::Feedback {
                city_id,
                topic_id,
                result,
            } => match result {
                Ok(true) => self.notify(NoticeLevel::Info, FEEDBACK_THANKS),
                Ok(false) => {}
                Err(err) => {
                    log::warn!("feedback for {city_id}/{topic_id} failed: {err}");
                    self.notify(NoticeLevel::Warning, FEEDBACK_FAILURE);
                }
            },
        }
    }
}

#[cfg(not(feature = "wasm"))]
fn default_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

#[cfg(feature = "wasm")]
fn default_store() -> Arc<dyn KeyValueStore> {
    if web_sys::window().is_some() {
        Arc::new(crate::content::storage::WebStore)
    } else {
        Arc::new(MemoryStore::new())
    }
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("selection", &self.selection)
            .field("transform", &self.viewport.transform())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "tokio-runtime"))]
mod tests {
    use super::*;
    use crate::content::storage::MemoryStore;
    use crate::input::events::{HitTarget, ZoomDirection};
    use crate::core::geo::Point;
    use crate::service::{GenerateRequest, Generation};
    use async_trait::async_trait;

    /// Always fails; the explorer must stay usable
    struct Offline;

    #[async_trait]
    impl ContentService for Offline {
        async fn generate(&self, _request: GenerateRequest) -> Result<Generation> {
            Err(Error::Service {
                status: 503,
                message: "offline".into(),
            })
        }
    }

    fn explorer() -> Explorer {
        Explorer::new(ExplorerConfig::default(), Arc::new(Offline), Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_select_city_flies_and_opens_panel() {
        let mut explorer = explorer();
        let outcome = explorer.select_city("florence", 0.0).unwrap();
        assert_eq!(outcome, SelectOutcome::Selected("florence".into()));
        assert!(explorer.is_panel_open());
        assert!(explorer.stats().is_loading());

        let target = explorer.target_transform();
        assert_eq!(target.k, explorer.config().viewport.city_zoom);
        assert!(explorer.tick(0.1));
        assert!(!explorer.tick(1.0));
        assert!(explorer.viewport().transform().approx_eq(&target, 1e-9));

        explorer.settle(Duration::from_secs(5));
        assert_eq!(explorer.stats().error_message(), Some(STATS_FAILURE_MESSAGE));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reselecting_city_resets() {
        let mut explorer = explorer();
        explorer.select_city("rome", 0.0).unwrap();
        explorer.select_topic("food").unwrap();

        assert_eq!(explorer.select_city("rome", 0.0).unwrap(), SelectOutcome::Deselected);
        assert!(explorer.selected_city().is_none());
        assert!(!explorer.is_panel_open());
        assert_eq!(explorer.guide(), &ViewState::Idle);
        assert!(explorer.target_transform().approx_eq(&explorer.viewport().clamp(Transform::identity()), 1e-9));
        explorer.settle(Duration::from_secs(5));
    }

    #[test]
    fn test_topic_needs_city() {
        let mut explorer = explorer();
        assert!(!explorer.select_topic("visa").unwrap());
        assert!(explorer.select_topic("astronomy").is_err());
        assert!(explorer.select_city("atlantis", 0.0).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_comparison_limit_and_validation() {
        let mut explorer = explorer();
        assert_eq!(explorer.toggle_comparison_mode(0.0), SelectionMode::Compare);

        for id in ["milan", "rome", "naples"] {
            assert!(matches!(explorer.select_city(id, 0.0).unwrap(), SelectOutcome::Added(_)));
        }
        assert_eq!(explorer.select_city("pisa", 0.0).unwrap(), SelectOutcome::LimitReached);
        assert_eq!(explorer.selection().comparison().len(), 3);
        assert_eq!(explorer.notices().len(), 1);
        assert_eq!(explorer.notices()[0].level, NoticeLevel::Warning);

        let id = explorer.notices()[0].id;
        explorer.dismiss_notice(id);
        assert!(explorer.notices().is_empty());

        assert!(explorer.run_comparison().is_err());
        explorer.set_comparison_topic("food").unwrap();
        for st in ["affordability", "variety", "student-spots"] {
            explorer.toggle_comparison_sub_topic(st);
        }
        assert!(explorer.run_comparison().is_err());
        assert_eq!(explorer.comparison().validation_error(), Some(NO_CRITERIA_MESSAGE));
        assert!(!explorer.is_busy());
    }

    #[test]
    fn test_toggle_mode_clears_everything() {
        let mut explorer = explorer();
        explorer.toggle_comparison_mode(0.0);
        explorer.select_city("milan", 0.0).unwrap();

        assert_eq!(explorer.toggle_comparison_mode(0.0), SelectionMode::Explore);
        assert!(explorer.selection().comparison().is_empty());
    }

    #[test]
    fn test_zoom_button_animates() {
        let mut explorer = explorer();
        let before = explorer.viewport().transform();

        explorer
            .handle_input(InputEvent::ZoomButton(ZoomDirection::In), 10.0)
            .unwrap();
        assert!(explorer.is_animating());
        assert_eq!(explorer.viewport().transform(), before);

        explorer.tick(11.0);
        assert!(explorer.viewport().transform().k > before.k);

        // A drag takes over from the animation
        explorer
            .handle_input(
                InputEvent::PointerDown {
                    position: Point::new(100.0, 100.0),
                    target: HitTarget::Background,
                },
                11.1,
            )
            .unwrap();
        assert!(!explorer.is_animating());
    }

    #[test]
    fn test_quick_zoom_clicks_compound_from_target() {
        let mut explorer = explorer();
        explorer
            .handle_input(InputEvent::ZoomButton(ZoomDirection::In), 0.0)
            .unwrap();
        explorer.tick(0.05);
        assert!(explorer.viewport().transform().k < 1.5);

        explorer
            .handle_input(InputEvent::ZoomButton(ZoomDirection::In), 0.05)
            .unwrap();
        assert!((explorer.target_transform().k - 2.25).abs() < 1e-9);
        explorer.tick(5.0);
        assert!(!explorer.is_animating());
        assert!((explorer.viewport().transform().k - 2.25).abs() < 1e-9);

        // Zooming back out mid-transition returns to the previous step
        explorer
            .handle_input(InputEvent::ZoomButton(ZoomDirection::Out), 5.0)
            .unwrap();
        explorer.tick(5.01);
        explorer
            .handle_input(InputEvent::ZoomButton(ZoomDirection::Out), 5.01)
            .unwrap();
        explorer.tick(10.0);
        assert!((explorer.viewport().transform().k - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_requests_without_runtime_fail_cleanly() {
        let mut explorer = explorer();
        assert!(matches!(explorer.start(), Err(Error::Config(_))));

        assert!(matches!(explorer.select_city("florence", 0.0), Err(Error::Config(_))));
        assert_eq!(explorer.selection().city(), Some("florence"));
        assert_eq!(explorer.stats().error_message(), Some(STATS_FAILURE_MESSAGE));

        assert!(explorer.search_programs().is_err());
        assert_eq!(
            explorer.programs().state().error_message(),
            Some(crate::programs::PROGRAM_SEARCH_FAILURE)
        );

        assert!(explorer.send_chat_message("Ciao?").is_err());
        assert!(!explorer.conversation().is_waiting());
        assert!(explorer.conversation().history().is_empty());

        assert!(explorer.submit_survey(SurveyAnswers::default()).is_err());
        assert!(!explorer.is_recommending());
        assert!(!explorer.is_busy());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_assistant_failure_keeps_conversation_usable() {
        let mut explorer = explorer();
        explorer.send_chat_message("Where do I register my address?").unwrap();
        assert!(explorer.send_chat_message("Hello?").is_err());

        explorer.settle(Duration::from_secs(5));
        let chat = explorer.conversation();
        assert!(!chat.is_waiting());
        assert!(chat.history().is_empty());
        assert_eq!(
            chat.transcript().last().map(|message| message.text.as_str()),
            Some(crate::chat::ASSISTANT_FAILURE_REPLY)
        );
    }

    #[test]
    fn test_share_url_and_suggestion() {
        let mut explorer = explorer();
        assert_eq!(explorer.share_url("https://studymap.example/").unwrap(), None);
        assert!(explorer.suggested_next_city().is_none());

        let link = DeepLink::from_query("city=venice&topic=visa");
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        assert!(explorer.apply_deep_link(&link, 0.0).unwrap());
        assert_eq!(
            explorer.share_url("https://studymap.example/").unwrap().as_deref(),
            Some("https://studymap.example/?city=venice&topic=visa")
        );
        assert_eq!(explorer.suggested_next_city().map(|c| c.id.as_str()), Some("padua"));
        explorer.settle(Duration::from_secs(5));
    }
}
