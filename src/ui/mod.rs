pub mod charts;
pub mod map_view;
pub mod markdown;
pub mod outline;
pub mod panels;
pub mod style;

pub use map_view::MapView;

pub use markdown::{markdown_job, MarkdownStyle};

pub use panels::{PanelState, UiAction};

pub use style::{ExplorerStyle, ExplorerThemes, LabelStyle, MarkerStyle, ZoomControlStyle};

use crate::explorer::Explorer;

pub trait UiExplorerExt {
    fn explorer_map(&mut self, explorer: &mut Explorer, style: &ExplorerStyle) -> egui::Response;

    fn explorer_map_sized(&mut self, explorer: &mut Explorer, style: &ExplorerStyle, size: egui::Vec2) -> egui::Response;
}

impl UiExplorerExt for egui::Ui {
    fn explorer_map(&mut self, explorer: &mut Explorer, style: &ExplorerStyle) -> egui::Response {
        self.add(MapView::new(explorer, style))
    }

    fn explorer_map_sized(&mut self, explorer: &mut Explorer, style: &ExplorerStyle, size: egui::Vec2) -> egui::Response {
        self.add(MapView::new(explorer, style).size(size))
    }
}
