//! Panels and windows around the map.
//!
//! Panels render from an immutable view of the [`Explorer`] and report what
//! the user did as [`UiAction`]s; [`apply`] then performs them. This keeps
//! egui closures free of mutable borrows of the explorer.

use crate::checklist::CHECKLIST_STAGES;
use crate::constants::{TUITION_MAX, TUITION_MIN, TUITION_STEP};
use crate::compare::charts::{comparison_rows, BarChart, RadarChart};
use crate::content::orchestrator::ViewState;
use crate::explorer::{Explorer, NoticeLevel};
use crate::feedback::FeedbackKind;
use crate::prefs::{MarkerPrefs, MarkerStyle as MarkerShape, MARKER_PALETTE};
use crate::programs::{LanguageFilter, UniversityFilters};
use crate::recommend::{Budget, CityLife, FieldOfStudy, FirstRunPrompt, SurveyAnswers};
use crate::service::ChatRole;
use crate::ui::charts;
use crate::ui::markdown::{markdown_job, MarkdownStyle};
use crate::ui::style::{marker_fill, series_fill, ExplorerStyle};
use egui::{Align, Align2, Context, Layout, RichText, ScrollArea, Ui, Window};

pub const TOUR_STEPS: [(&str, &str); 5] = [
    (
        "Welcome to the Italy study guide!",
        "This interactive guide gives you AI-assisted information for student life in Italy. Ready to explore?",
    ),
    (
        "Pick a city on the map",
        "Click a city on the map of Italy to learn about it. You can drag and zoom the map.",
    ),
    (
        "Explore the topics",
        "Once a city is selected, a menu opens with topics such as housing, universities and social life.",
    ),
    (
        "Get the details",
        "Click a topic to open a guide written for you, with the sources it was based on.",
    ),
    (
        "Compare cities",
        "Undecided? Switch to compare mode, pick up to three cities and compare them on one topic.",
    ),
];

const RADAR_SIZE: f64 = 320.0;

/// Something the user asked for this frame
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SelectCity(String),
    SelectTopic(String),
    ClosePanel,
    RetryStats,
    RetryTopic,
    Feedback(FeedbackKind),
    Share,
    ToggleChecklistItem(String),
    TravelNext,
    ToggleCompareMode,
    SetComparisonTopic(String),
    ToggleSubTopic(String),
    RunComparison,
    Reset,
    OpenSurvey,
    SubmitSurvey(SurveyAnswers),
    SkipSurvey,
    NextTourStep,
    FinishTour,
    DismissRecommendations,
    DismissNotice(u64),
    SetMarkerPrefs(MarkerPrefs),
    OpenPrograms,
    ClosePrograms,
    SearchPrograms(UniversityFilters),
    OpenChat,
    CloseChat,
    SendChat(String),
}

/// Transient UI state that the explorer does not own
#[derive(Debug, Clone)]
pub struct PanelState {
    pub search: String,
    /// Draft answers while the survey window is open
    pub survey: Option<SurveyAnswers>,
    pub tour_step: Option<usize>,
    /// Base address for share links
    pub share_base: String,
    pub share_link: Option<String>,
    pub markdown: MarkdownStyle,
    pub programs_open: bool,
    /// Filters being edited in the program finder
    pub program_filters: UniversityFilters,
    pub chat_open: bool,
    pub chat_input: String,
}

impl PanelState {
    pub fn new(share_base: impl Into<String>) -> Self {
        Self {
            search: String::new(),
            survey: None,
            tour_step: None,
            share_base: share_base.into(),
            share_link: None,
            markdown: MarkdownStyle::default(),
            programs_open: false,
            program_filters: UniversityFilters::default(),
            chat_open: false,
            chat_input: String::new(),
        }
    }

    /// Opens the tour or survey a first-time visitor still has to see
    pub fn show_first_run(&mut self, prompt: Option<FirstRunPrompt>) {
        match prompt {
            Some(FirstRunPrompt::Tour) => self.tour_step = Some(0),
            Some(FirstRunPrompt::Survey) => self.survey = Some(SurveyAnswers::default()),
            None => {}
        }
    }
}

/// Performs the actions collected while drawing a frame
pub fn apply(explorer: &mut Explorer, state: &mut PanelState, actions: Vec<UiAction>, ctx: &Context, now: f64) {
    for action in actions {
        log::trace!("ui action {action:?}");
        let result = match action {
            UiAction::SelectCity(id) => explorer.select_city(&id, now).map(|_| ()),
            UiAction::SelectTopic(id) => explorer.select_topic(&id).map(|_| ()),
            UiAction::ClosePanel => {
                explorer.close_panel();
                Ok(())
            }
            UiAction::RetryStats => explorer.retry_stats().map(|_| ()),
            UiAction::RetryTopic => explorer.retry_topic().map(|_| ()),
            UiAction::Feedback(kind) => explorer.send_feedback(kind),
            UiAction::Share => explorer.share_url(&state.share_base).map(|link| {
                if let Some(link) = &link {
                    ctx.output_mut(|o| o.copied_text = link.clone());
                }
                state.share_link = link;
            }),
            UiAction::ToggleChecklistItem(id) => {
                explorer.toggle_checklist_item(&id);
                Ok(())
            }
            UiAction::TravelNext => explorer.travel_to_suggested(now).map(|_| ()),
            UiAction::ToggleCompareMode => {
                explorer.toggle_comparison_mode(now);
                Ok(())
            }
            UiAction::SetComparisonTopic(id) => explorer.set_comparison_topic(&id),
            UiAction::ToggleSubTopic(id) => {
                explorer.toggle_comparison_sub_topic(&id);
                Ok(())
            }
            // Validation problems are shown in the comparison window
            UiAction::RunComparison => explorer.run_comparison().or(Ok(())),
            UiAction::Reset => {
                explorer.reset(now);
                state.share_link = None;
                Ok(())
            }
            UiAction::OpenSurvey => {
                explorer.reset(now);
                state.survey = Some(SurveyAnswers::default());
                Ok(())
            }
            UiAction::SubmitSurvey(answers) => {
                state.survey = None;
                explorer.submit_survey(answers)
            }
            UiAction::SkipSurvey => {
                explorer.skip_survey();
                state.survey = None;
                Ok(())
            }
            UiAction::NextTourStep => {
                state.tour_step = state.tour_step.map(|step| step + 1);
                Ok(())
            }
            UiAction::FinishTour => {
                state.tour_step = None;
                state.show_first_run(explorer.finish_tour());
                Ok(())
            }
            UiAction::DismissRecommendations => {
                explorer.dismiss_recommendations();
                Ok(())
            }
            UiAction::DismissNotice(id) => {
                explorer.dismiss_notice(id);
                Ok(())
            }
            UiAction::SetMarkerPrefs(prefs) => {
                explorer.set_marker_prefs(prefs);
                Ok(())
            }
            UiAction::OpenPrograms => {
                state.programs_open = true;
                state.program_filters = *explorer.programs().filters();
                Ok(())
            }
            UiAction::ClosePrograms => {
                state.programs_open = false;
                Ok(())
            }
            UiAction::SearchPrograms(filters) => {
                explorer.set_program_filters(filters);
                state.program_filters = *explorer.programs().filters();
                explorer.search_programs()
            }
            UiAction::OpenChat => {
                state.chat_open = true;
                Ok(())
            }
            UiAction::CloseChat => {
                state.chat_open = false;
                Ok(())
            }
            UiAction::SendChat(text) => explorer.send_chat_message(&text).map(|()| state.chat_input.clear()),
        };
        if let Err(err) = result {
            log::warn!("ui action failed: {err}");
        }
    }
}

/// Title, search, mode switch and settings
pub fn top_bar(ui: &mut Ui, explorer: &Explorer, state: &mut PanelState, actions: &mut Vec<UiAction>) {
    ui.horizontal(|ui| {
        ui.heading("StudyMap Italia");
        ui.weak("Your AI-assisted student advisor");
        ui.separator();

        ui.add(
            egui::TextEdit::singleline(&mut state.search)
                .hint_text("Search a city (e.g. Roma)")
                .desired_width(200.0),
        );

        let comparing = explorer.selection().is_comparing();
        if ui.selectable_label(comparing, "Compare cities").clicked() {
            actions.push(UiAction::ToggleCompareMode);
        }
        if ui.button("Find my city").on_hover_text("Retake the survey for personal suggestions").clicked() {
            actions.push(UiAction::OpenSurvey);
        }
        if ui.button("Find programs").on_hover_text("Search university programs").clicked() {
            actions.push(UiAction::OpenPrograms);
        }
        if ui.button("Ask Guido").on_hover_text("Chat with the study-abroad assistant").clicked() {
            actions.push(UiAction::OpenChat);
        }
        if ui.button("Reset view").clicked() {
            actions.push(UiAction::Reset);
        }

        ui.menu_button("Markers", |ui| {
            let current = explorer.marker_prefs();
            for shape in MarkerShape::ALL {
                if ui.radio(current.style == shape, shape.as_str()).clicked() {
                    actions.push(UiAction::SetMarkerPrefs(MarkerPrefs { style: shape, ..current }));
                }
            }
            ui.separator();
            for (name, color) in MARKER_PALETTE {
                let label = RichText::new(format!("● {name}")).color(marker_fill(color));
                if ui.selectable_label(current.color == color, label).clicked() {
                    actions.push(UiAction::SetMarkerPrefs(MarkerPrefs { color, ..current }));
                }
            }
        });

        if explorer.is_busy() {
            ui.spinner();
        }
    });

    let query = state.search.trim();
    if !query.is_empty() {
        let matches = explorer.catalog().search(query);
        ui.horizontal_wrapped(|ui| {
            if matches.is_empty() {
                ui.weak("No city found");
            }
            for city in matches.into_iter().take(6) {
                if ui.button(&city.name).clicked() {
                    actions.push(UiAction::SelectCity(city.id.clone()));
                }
            }
        });
        if actions.iter().any(|a| matches!(a, UiAction::SelectCity(_))) {
            state.search.clear();
        }
    }
}

/// Side panel for the selected city
pub fn info_panel(ui: &mut Ui, explorer: &Explorer, style: &ExplorerStyle, state: &PanelState, actions: &mut Vec<UiAction>) {
    let Some(city) = explorer.selected_city() else {
        ui.weak("Select a city on the map.");
        return;
    };

    ui.horizontal(|ui| {
        ui.heading(&city.name);
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("✕").on_hover_text("Close").clicked() {
                actions.push(UiAction::ClosePanel);
            }
            if ui.button("Share").on_hover_text("Copy a link to this view").clicked() {
                actions.push(UiAction::Share);
            }
        });
    });
    if let Some(region) = &city.region {
        let population = city
            .population
            .map(|p| format!(" · {} inhabitants", group_thousands(p)))
            .unwrap_or_default();
        ui.weak(format!("{region}{population}"));
    }
    if let Some(link) = &state.share_link {
        ui.horizontal(|ui| {
            ui.weak("Link copied:");
            ui.hyperlink(link);
        });
    }

    ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        ui.label(&city.description);
        ui.add_space(8.0);

        ui.strong("At a glance");
        stats_section(ui, explorer, style, actions);
        ui.separator();

        ui.weak("Choose a topic for details:");
        ui.horizontal_wrapped(|ui| {
            for topic in explorer.catalog().topics() {
                let selected = explorer.selection().topic() == Some(topic.id.as_str());
                if ui.selectable_label(selected, &topic.name).clicked() && !selected {
                    actions.push(UiAction::SelectTopic(topic.id.clone()));
                }
            }
        });
        ui.add_space(6.0);
        guide_section(ui, explorer, style, state, actions);
        ui.separator();

        checklist_section(ui, explorer, actions);

        if let Some(next) = explorer.suggested_next_city() {
            ui.separator();
            if ui
                .button(format!("Next stop: {} →", next.name))
                .on_hover_text(format!("Go to the nearest city, {}", next.name))
                .clicked()
            {
                actions.push(UiAction::TravelNext);
            }
        }
    });
}

fn stats_section(ui: &mut Ui, explorer: &Explorer, style: &ExplorerStyle, actions: &mut Vec<UiAction>) {
    match explorer.stats() {
        ViewState::Idle => {}
        ViewState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Loading statistics…");
            });
        }
        ViewState::Failed { message } => {
            ui.colored_label(style.warning_color, message);
            if ui.small_button("Retry").clicked() {
                actions.push(UiAction::RetryStats);
            }
        }
        ViewState::Ready { content, fresh } => {
            charts::bars(ui, &BarChart::from_stats(content), marker_fill(explorer.marker_prefs().color));
            if !fresh {
                ui.weak("Updating…");
            }
        }
    }
}

fn guide_section(ui: &mut Ui, explorer: &Explorer, style: &ExplorerStyle, state: &PanelState, actions: &mut Vec<UiAction>) {
    let Some(topic) = explorer.selected_topic() else {
        ui.weak("Pick one of the topics above to read a detailed guide.");
        return;
    };

    match explorer.guide() {
        ViewState::Idle => {}
        ViewState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak(format!("Preparing the {} guide…", topic.name.to_lowercase()));
            });
        }
        ViewState::Failed { message } => {
            ui.colored_label(style.error_color, message);
            if ui.button("Try again").clicked() {
                actions.push(UiAction::RetryTopic);
            }
        }
        ViewState::Ready { content, fresh } => {
            if !fresh {
                ui.weak("Showing a saved copy while checking for updates…");
            }
            ui.label(markdown_job(&content.markdown, ui.style(), &state.markdown));

            if !content.sources.is_empty() {
                ui.add_space(6.0);
                ui.strong("Sources");
                for source in &content.sources {
                    ui.hyperlink_to(source.label(), &source.uri);
                }
            }

            ui.add_space(6.0);
            if explorer.feedback_sent() {
                ui.colored_label(style.highlight_color, "Thanks for your feedback!");
            } else {
                ui.horizontal(|ui| {
                    ui.label("Was this helpful?");
                    if ui.button("👍").clicked() {
                        actions.push(UiAction::Feedback(FeedbackKind::Like));
                    }
                    if ui.button("👎").clicked() {
                        actions.push(UiAction::Feedback(FeedbackKind::Dislike));
                    }
                });
            }
        }
    }
}

fn checklist_section(ui: &mut Ui, explorer: &Explorer, actions: &mut Vec<UiAction>) {
    let Some(checklist) = explorer.checklist() else {
        return;
    };
    egui::CollapsingHeader::new(format!("My checklist ({}%)", checklist.progress_percent()))
        .id_source("checklist")
        .show(ui, |ui| {
            ui.add(egui::ProgressBar::new(checklist.progress() as f32).show_percentage());
            for stage in CHECKLIST_STAGES {
                ui.strong(stage.title);
                for item in stage.items {
                    let mut checked = checklist.is_checked(item.id);
                    if ui.checkbox(&mut checked, item.text).changed() {
                        actions.push(UiAction::ToggleChecklistItem(item.id.to_string()));
                    }
                }
            }
        });
}

/// Comparison window, shown in compare mode
pub fn comparison_window(ctx: &Context, explorer: &Explorer, style: &ExplorerStyle, actions: &mut Vec<UiAction>) {
    if !explorer.selection().is_comparing() {
        return;
    }
    let panel = explorer.comparison();
    let cities = explorer.comparison_cities();
    let name_of = |id: &str| {
        explorer
            .catalog()
            .city(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    Window::new("Compare cities")
        .anchor(Align2::RIGHT_TOP, [-12.0, 48.0])
        .resizable(false)
        .default_width(360.0)
        .show(ctx, |ui| {
            if cities.is_empty() {
                ui.weak("Click up to three cities on the map.");
            }
            ui.horizontal_wrapped(|ui| {
                for (index, city) in cities.iter().enumerate() {
                    let label = RichText::new(format!("{} ✕", city.name)).color(series_fill(index));
                    if ui.button(label).on_hover_text("Remove").clicked() {
                        actions.push(UiAction::SelectCity(city.id.clone()));
                    }
                }
            });
            ui.separator();

            let current = panel.topic().map(|t| t.name.clone()).unwrap_or_else(|| "Choose a topic".into());
            egui::ComboBox::from_label("Topic")
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for topic in explorer.catalog().topics() {
                        let selected = panel.topic().is_some_and(|t| t.id == topic.id);
                        if ui.selectable_label(selected, &topic.name).clicked() && !selected {
                            actions.push(UiAction::SetComparisonTopic(topic.id.clone()));
                        }
                    }
                });

            if let Some(topic) = panel.topic() {
                ui.horizontal_wrapped(|ui| {
                    for sub_topic in &topic.sub_topics {
                        let mut checked = panel.is_selected(&sub_topic.id);
                        if ui.checkbox(&mut checked, &sub_topic.name).changed() {
                            actions.push(UiAction::ToggleSubTopic(sub_topic.id.clone()));
                        }
                    }
                });
            }

            let running = panel.state().is_loading();
            if ui.add_enabled(!running, egui::Button::new("Compare")).clicked() {
                actions.push(UiAction::RunComparison);
            }
            if let Some(error) = panel.validation_error() {
                ui.colored_label(style.warning_color, error);
            }

            match panel.state() {
                ViewState::Idle => {}
                ViewState::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.weak("Comparing…");
                    });
                }
                ViewState::Failed { message } => {
                    ui.colored_label(style.error_color, message);
                }
                ViewState::Ready { content, fresh } => {
                    if !fresh {
                        ui.weak("Showing saved results while refreshing…");
                    }
                    let sub_topics = panel.selected_sub_topics();
                    if let Some(chart) = RadarChart::new(RADAR_SIZE, &sub_topics) {
                        charts::radar(ui, &chart, content, name_of);
                    }

                    egui::Grid::new("comparison_table").striped(true).show(ui, |ui| {
                        ui.label("");
                        for result in content {
                            ui.strong(name_of(&result.city_id));
                        }
                        ui.end_row();

                        for row in comparison_rows(&sub_topics, content) {
                            ui.label(&row.sub_topic);
                            for (index, rating) in row.ratings.iter().enumerate() {
                                match rating {
                                    Some(rating) if row.best == Some(index) => {
                                        ui.label(RichText::new(format!("{rating}/10")).strong().color(style.highlight_color));
                                    }
                                    Some(rating) => {
                                        ui.label(format!("{rating}/10"));
                                    }
                                    None => {
                                        ui.weak("–");
                                    }
                                }
                            }
                            ui.end_row();
                        }
                    });

                    for result in content {
                        if let Some(error) = &result.error {
                            ui.colored_label(style.warning_color, format!("{}: {error}", name_of(&result.city_id)));
                            continue;
                        }
                        egui::CollapsingHeader::new(name_of(&result.city_id))
                            .id_source(("comparison_detail", &result.city_id))
                            .show(ui, |ui| {
                                for point in &result.data {
                                    ui.label(RichText::new(&point.sub_topic).strong());
                                    ui.label(&point.summary);
                                }
                            });
                    }
                }
            }
        });
}

/// Welcome tour for first-time visitors
pub fn tour_window(ctx: &Context, state: &PanelState, actions: &mut Vec<UiAction>) {
    let Some(step) = state.tour_step else {
        return;
    };
    let Some((title, body)) = TOUR_STEPS.get(step) else {
        actions.push(UiAction::FinishTour);
        return;
    };

    Window::new("Welcome")
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading(*title);
            ui.label(*body);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.weak(format!("{}/{}", step + 1, TOUR_STEPS.len()));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    let last = step + 1 == TOUR_STEPS.len();
                    if ui.button(if last { "Get started" } else { "Next" }).clicked() {
                        actions.push(if last { UiAction::FinishTour } else { UiAction::NextTourStep });
                    }
                    if !last && ui.button("Skip").clicked() {
                        actions.push(UiAction::FinishTour);
                    }
                });
            });
        });
}

/// Preference survey; edits the draft answers in place
pub fn survey_window(ctx: &Context, state: &mut PanelState, actions: &mut Vec<UiAction>) {
    let Some(answers) = state.survey.as_mut() else {
        return;
    };

    Window::new("Find your city")
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("A few questions to help you find your ideal city in Italy.");
            ui.add_space(6.0);

            ui.strong("Monthly budget");
            ui.horizontal(|ui| {
                for budget in Budget::ALL {
                    ui.radio_value(&mut answers.budget, budget, budget.describe());
                }
            });
            ui.strong("City life");
            ui.horizontal(|ui| {
                for life in CityLife::ALL {
                    ui.radio_value(&mut answers.city_life, life, life.describe());
                }
            });
            ui.strong("Field of study");
            ui.horizontal_wrapped(|ui| {
                for field in FieldOfStudy::ALL {
                    ui.radio_value(&mut answers.field_of_study, field, field.describe());
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Show my cities").clicked() {
                    actions.push(UiAction::SubmitSurvey(*answers));
                }
                if ui.button("Skip").clicked() {
                    actions.push(UiAction::SkipSurvey);
                }
            });
        });
}

/// Recommended cities after the survey
pub fn recommendations_window(ctx: &Context, explorer: &Explorer, actions: &mut Vec<UiAction>) {
    if !explorer.is_recommending() && explorer.recommendations().is_empty() {
        return;
    }

    Window::new("Recommended for you")
        .anchor(Align2::LEFT_TOP, [12.0, 48.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            if explorer.is_recommending() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Finding your cities…");
                });
                return;
            }
            ui.weak("The cities that best fit your answers.");
            for recommendation in explorer.recommendations() {
                let Some(city) = explorer.catalog().city(&recommendation.city_id) else {
                    continue;
                };
                ui.separator();
                if ui.link(RichText::new(&city.name).strong()).clicked() {
                    actions.push(UiAction::SelectCity(city.id.clone()));
                }
                ui.label(RichText::new(format!("“{}”", recommendation.reason)).italics());
            }
            ui.separator();
            if ui.button("Close").clicked() {
                actions.push(UiAction::DismissRecommendations);
            }
        });
}

/// University program finder
pub fn programs_window(ctx: &Context, explorer: &Explorer, style: &ExplorerStyle, state: &mut PanelState, actions: &mut Vec<UiAction>) {
    if !state.programs_open {
        return;
    }
    let filters = &mut state.program_filters;

    Window::new("Find a program")
        .anchor(Align2::LEFT_TOP, [12.0, 48.0])
        .resizable(true)
        .default_width(380.0)
        .show(ctx, |ui| {
            let field = filters.field_of_study.map_or("Any field", FieldOfStudy::describe);
            egui::ComboBox::from_label("Field of study")
                .selected_text(field)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filters.field_of_study, None, "Any field");
                    for field in FieldOfStudy::ALL {
                        ui.selectable_value(&mut filters.field_of_study, Some(field), field.describe());
                    }
                });
            ui.horizontal(|ui| {
                ui.label("Language");
                for language in LanguageFilter::ALL {
                    ui.radio_value(&mut filters.language, language, language.describe());
                }
            });
            ui.add(
                egui::Slider::new(&mut filters.tuition_max, TUITION_MIN..=TUITION_MAX)
                    .step_by(f64::from(TUITION_STEP))
                    .prefix("up to € ")
                    .text("per year"),
            );

            let finder = explorer.programs();
            ui.horizontal(|ui| {
                let searching = finder.state().is_loading();
                if ui.add_enabled(!searching, egui::Button::new("Search")).clicked() {
                    actions.push(UiAction::SearchPrograms(*filters));
                }
                if ui.button("Close").clicked() {
                    actions.push(UiAction::ClosePrograms);
                }
            });
            ui.separator();

            match finder.state() {
                ViewState::Idle => {
                    ui.weak("Set your filters and search.");
                }
                ViewState::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.weak("Searching programs…");
                    });
                }
                ViewState::Failed { message } => {
                    ui.colored_label(style.error_color, message);
                }
                ViewState::Ready { content, .. } if content.is_empty() => {
                    ui.weak("No programs match these filters. Try a higher tuition cap or another language.");
                }
                ViewState::Ready { content, .. } => {
                    ScrollArea::vertical().max_height(420.0).show(ui, |ui| {
                        for program in content {
                            ui.strong(&program.program_name);
                            ui.weak(format!("{} · {}", program.university_name, program.city));
                            ui.label(format!(
                                "Taught in {} · about € {} per year",
                                program.language,
                                group_thousands(u64::from(program.annual_fee))
                            ));
                            if !program.description.is_empty() {
                                ui.label(&program.description);
                            }
                            if let Some(url) = &program.website_url {
                                ui.hyperlink_to("Website", url);
                            }
                            ui.separator();
                        }
                    });
                }
            }
        });
}

/// Conversation with the assistant
pub fn chat_window(ctx: &Context, explorer: &Explorer, state: &mut PanelState, actions: &mut Vec<UiAction>) {
    if !state.chat_open {
        return;
    }
    let chat = explorer.conversation();

    Window::new("Ask Guido")
        .anchor(Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .resizable(true)
        .default_width(360.0)
        .show(ctx, |ui| {
            ScrollArea::vertical()
                .max_height(360.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for message in chat.transcript() {
                        match message.role {
                            ChatRole::User => {
                                ui.with_layout(Layout::top_down(Align::Max), |ui| {
                                    ui.label(RichText::new(&message.text).strong());
                                });
                            }
                            ChatRole::Model => {
                                ui.label(markdown_job(&message.text, ui.style(), &state.markdown));
                            }
                        }
                        ui.add_space(4.0);
                    }
                    if chat.is_waiting() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.weak("Guido is typing…");
                        });
                    }
                });
            ui.separator();

            ui.horizontal(|ui| {
                let input = ui.add_enabled(
                    !chat.is_waiting(),
                    egui::TextEdit::singleline(&mut state.chat_input)
                        .hint_text("Ask about visas, housing, city life…")
                        .desired_width(240.0),
                );
                let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let ready = !chat.is_waiting() && !state.chat_input.trim().is_empty();
                if (ui.add_enabled(ready, egui::Button::new("Send")).clicked() || submitted) && ready {
                    actions.push(UiAction::SendChat(state.chat_input.clone()));
                }
                if ui.button("Close").clicked() {
                    actions.push(UiAction::CloseChat);
                }
            });
        });
}

/// Stacked notices in the bottom-left corner
pub fn notices(ctx: &Context, explorer: &Explorer, style: &ExplorerStyle, actions: &mut Vec<UiAction>) {
    for (index, notice) in explorer.notices().iter().enumerate() {
        let color = match notice.level {
            NoticeLevel::Info => style.highlight_color,
            NoticeLevel::Warning => style.warning_color,
            NoticeLevel::Error => style.error_color,
        };
        egui::Area::new(egui::Id::new(("notice", notice.id)))
            .anchor(Align2::LEFT_BOTTOM, [12.0, -12.0 - 44.0 * index as f32])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(color, &notice.message);
                        if ui.small_button("✕").clicked() {
                            actions.push(UiAction::DismissNotice(notice.id));
                        }
                    });
                });
            });
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands_italian_style() {
        assert_eq!(group_thousands(2_800_000), "2.800.000");
        assert_eq!(group_thousands(54_000), "54.000");
        assert_eq!(group_thousands(999), "999");
    }

    #[test]
    fn test_first_run_prompt_opens_window() {
        let mut state = PanelState::new("https://studymap.example/");
        state.show_first_run(Some(FirstRunPrompt::Tour));
        assert_eq!(state.tour_step, Some(0));
        state.show_first_run(Some(FirstRunPrompt::Survey));
        assert_eq!(state.survey, Some(SurveyAnswers::default()));
    }

    #[test]
    fn test_finder_and_chat_start_closed() {
        let state = PanelState::new("https://studymap.example/");
        assert!(!state.programs_open);
        assert!(!state.chat_open);
        assert_eq!(state.program_filters, UniversityFilters::default());
        assert!(state.chat_input.is_empty());
    }
}
