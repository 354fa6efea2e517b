use anyhow::Context as _;
use clap::Parser;
use studymap::{
    core::deeplink::DeepLink,
    ui::{panels, ExplorerStyle, ExplorerThemes, PanelState, UiExplorerExt},
    Explorer, ExplorerConfig,
};
use std::path::PathBuf;

const SHARE_BASE: &str = "https://studymap.example/";

/// Desktop viewer for the study-abroad map
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Shared link to open, e.g. "https://studymap.example/?city=rome&topic=accommodation"
    #[arg(long)]
    link: Option<String>,

    /// File holding cached content and saved preferences (overrides STUDYMAP_CACHE_PATH)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Start with the dark theme
    #[arg(long)]
    dark: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Content fetches are spawned onto this runtime from the UI thread
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let _guard = runtime.enter();

    let mut config = ExplorerConfig::from_env();
    if let Some(path) = args.cache {
        config.cache.storage_path = Some(path);
    }
    if config.service.api_key.is_none() {
        log::warn!("no API key configured; generated content will be unavailable");
    }

    let mut explorer = Explorer::from_config(config).context("failed to set up the explorer")?;
    explorer.start().context("failed to start loading city content")?;

    if let Some(link) = &args.link {
        match DeepLink::from_url(link).and_then(|link| explorer.apply_deep_link(&link, 0.0)) {
            Ok(true) => {}
            Ok(false) => log::warn!("link does not name a known city and topic"),
            Err(err) => log::warn!("ignoring link {link:?}: {err}"),
        }
    }

    let mut panel_state = PanelState::new(SHARE_BASE);
    panel_state.show_first_run(explorer.pending_prompt());

    let style = if args.dark { ExplorerThemes::dark() } else { ExplorerThemes::light() };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 820.0])
            .with_title("StudyMap Italia"),
        ..Default::default()
    };

    eframe::run_native(
        "studymap-app",
        options,
        Box::new(move |cc| {
            cc.egui_ctx
                .set_visuals(if args.dark { egui::Visuals::dark() } else { egui::Visuals::light() });
            Box::new(StudyMapApp {
                explorer,
                panels: panel_state,
                style,
                show_debug_panel: false,
            })
        }),
    )
    .map_err(|err| anyhow::anyhow!("viewer failed: {err}"))?;

    Ok(())
}

struct StudyMapApp {
    explorer: Explorer,
    panels: PanelState,
    style: ExplorerStyle,
    show_debug_panel: bool,
}

impl eframe::App for StudyMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        let mut actions = Vec::new();

        if self.explorer.poll() > 0 {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_debug_panel, "Debug Panel");
                });
                ui.separator();
                panels::top_bar(ui, &self.explorer, &mut self.panels, &mut actions);
            });
        });

        if self.show_debug_panel {
            egui::SidePanel::left("debug_panel").resizable(true).show(ctx, |ui| {
                ui.heading("Debug Info");
                ui.separator();
                let transform = self.explorer.viewport().transform();
                ui.label(format!("Zoom: {:.2}", transform.k));
                ui.label(format!("Pan: {:.1}, {:.1}", transform.x, transform.y));
                ui.label(format!("Animating: {}", self.explorer.is_animating()));
                ui.label(format!("Busy: {}", self.explorer.is_busy()));
                ui.label(format!("Mode: {:?}", self.explorer.selection().mode()));
            });
        }

        if self.explorer.is_panel_open() {
            egui::SidePanel::right("info_panel")
                .resizable(true)
                .default_width(self.style.panel_width)
                .show(ctx, |ui| {
                    panels::info_panel(ui, &self.explorer, &self.style, &self.panels, &mut actions);
                });
        }

        panels::comparison_window(ctx, &self.explorer, &self.style, &mut actions);
        panels::tour_window(ctx, &self.panels, &mut actions);
        panels::survey_window(ctx, &mut self.panels, &mut actions);
        panels::recommendations_window(ctx, &self.explorer, &mut actions);
        panels::programs_window(ctx, &self.explorer, &self.style, &mut self.panels, &mut actions);
        panels::chat_window(ctx, &self.explorer, &mut self.panels, &mut actions);
        panels::notices(ctx, &self.explorer, &self.style, &mut actions);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.style.sea_color))
            .show(ctx, |ui| {
                let size = ui.available_size();
                ui.explorer_map_sized(&mut self.explorer, &self.style, size);
            });

        panels::apply(&mut self.explorer, &mut self.panels, actions, ctx, now);

        if self.explorer.is_busy() || self.explorer.is_animating() {
            ctx.request_repaint();
        }
    }
}
