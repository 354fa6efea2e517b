use crate::compare::charts::series_color;
use crate::prefs::MarkerColor;
use egui::{Color32, FontId, Stroke};

/// Style configuration for the explorer map and its panels
#[derive(Debug, Clone)]
pub struct ExplorerStyle {
    /// Sea behind the land outline
    pub sea_color: Color32,
    pub land_fill: Color32,
    pub land_stroke: Stroke,
    pub zoom_controls: ZoomControlStyle,
    pub markers: MarkerStyle,
    pub labels: LabelStyle,
    /// Width of the city detail panel
    pub panel_width: f32,
    /// Colour of the "best" cell in the comparison table
    pub highlight_color: Color32,
    pub warning_color: Color32,
    pub error_color: Color32,
}

/// Style for zoom control buttons
#[derive(Debug, Clone)]
pub struct ZoomControlStyle {
    pub background_color: Color32,
    pub hover_color: Color32,
    pub text_color: Color32,
    pub border_stroke: Stroke,
    pub button_size: f32,
    /// Margin from edge
    pub margin: f32,
    pub rounding: f32,
}

/// Style for city markers; the fill comes from the user's marker colour
#[derive(Debug, Clone)]
pub struct MarkerStyle {
    /// Radius in screen pixels, independent of zoom
    pub size: f32,
    pub border_color: Color32,
    pub border_width: f32,
    pub selected_color: Color32,
    /// Ring around cities in the comparison set
    pub comparison_color: Color32,
    pub hover_scale: f32,
}

/// City name labels next to markers
#[derive(Debug, Clone)]
pub struct LabelStyle {
    pub text_color: Color32,
    pub halo_color: Color32,
    pub font_id: FontId,
    /// Labels are hidden below this zoom unless the city is selected
    pub min_zoom: f64,
}

impl Default for ExplorerStyle {
    fn default() -> Self {
        Self {
            sea_color: Color32::from_rgb(0xE0, 0xF2, 0xFE),
            land_fill: Color32::from_rgb(0xF8, 0xF5, 0xEE),
            land_stroke: Stroke::new(1.0, Color32::from_rgb(0x9C, 0xA3, 0xAF)),
            zoom_controls: ZoomControlStyle::default(),
            markers: MarkerStyle::default(),
            labels: LabelStyle::default(),
            panel_width: 380.0,
            highlight_color: Color32::from_rgb(0x16, 0xA3, 0x4A),
            warning_color: Color32::from_rgb(0xD9, 0x77, 0x06),
            error_color: Color32::from_rgb(0xDC, 0x26, 0x26),
        }
    }
}

impl Default for ZoomControlStyle {
    fn default() -> Self {
        Self {
            background_color: Color32::from_rgba_unmultiplied(255, 255, 255, 220),
            hover_color: Color32::LIGHT_GRAY,
            text_color: Color32::BLACK,
            border_stroke: Stroke::new(1.0, Color32::from_gray(100)),
            button_size: 30.0,
            margin: 10.0,
            rounding: 3.0,
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size: 6.0,
            border_color: Color32::WHITE,
            border_width: 1.5,
            selected_color: Color32::from_rgb(0xDC, 0x26, 0x26),
            comparison_color: Color32::from_rgb(0x7C, 0x3A, 0xED),
            hover_scale: 1.4,
        }
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text_color: Color32::from_rgb(0x1F, 0x29, 0x37),
            halo_color: Color32::from_rgba_unmultiplied(255, 255, 255, 200),
            font_id: FontId::proportional(12.0),
            min_zoom: 1.5,
        }
    }
}

/// Predefined themes
pub struct ExplorerThemes;

impl ExplorerThemes {
    /// Light theme (default)
    pub fn light() -> ExplorerStyle {
        ExplorerStyle::default()
    }

    /// Dark theme for night mode
    pub fn dark() -> ExplorerStyle {
        ExplorerStyle {
            sea_color: Color32::from_rgb(0x0F, 0x17, 0x2A),
            land_fill: Color32::from_rgb(0x33, 0x41, 0x55),
            land_stroke: Stroke::new(1.0, Color32::from_rgb(0x64, 0x74, 0x8B)),
            zoom_controls: ZoomControlStyle {
                background_color: Color32::from_rgb(60, 60, 60),
                hover_color: Color32::from_rgb(80, 80, 80),
                text_color: Color32::WHITE,
                border_stroke: Stroke::new(1.0, Color32::from_rgb(120, 120, 120)),
                ..ZoomControlStyle::default()
            },
            markers: MarkerStyle {
                border_color: Color32::from_rgb(200, 200, 200),
                ..MarkerStyle::default()
            },
            labels: LabelStyle {
                text_color: Color32::from_rgb(0xE5, 0xE7, 0xEB),
                halo_color: Color32::from_rgba_unmultiplied(0, 0, 0, 160),
                ..LabelStyle::default()
            },
            ..ExplorerStyle::default()
        }
    }
}

pub fn marker_fill(color: MarkerColor) -> Color32 {
    let [r, g, b] = color.0;
    Color32::from_rgb(r, g, b)
}

/// Colour of the `index`-th city in comparison charts
pub fn series_fill(index: usize) -> Color32 {
    let [r, g, b] = series_color(index);
    Color32::from_rgb(r, g, b)
}

/// Same hue, partially transparent
pub fn translucent(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
