use crate::core::geo::{Bounds, Point};
use crate::core::viewport::ViewboxFit;
use crate::explorer::Explorer;
use crate::input::events::{HitTarget, InputEvent, KeyModifiers, ZoomDirection};
use crate::prefs::MarkerStyle as MarkerShape;
use crate::ui::outline::{ITALY_FILL, ITALY_OUTLINE};
use crate::ui::style::{marker_fill, ExplorerStyle};
use egui::{
    epaint::{Mesh, PathShape},
    pos2, vec2, Align2, Color32, CursorIcon, Painter, Pos2, Rect, Response, Sense, Shape, Stroke, Ui,
    Vec2, Widget,
};

/// Immediate-mode map of the explorer's cities.
///
/// Translates egui pointer input into [`InputEvent`]s for the explorer's
/// gesture controller, advances view animations and paints the land outline
/// and markers.
///
/// ```rust,ignore
/// ui.add(MapView::new(&mut explorer, &style));
/// ```
pub struct MapView<'a> {
    explorer: &'a mut Explorer,
    style: &'a ExplorerStyle,
    size: Option<Vec2>,
    show_controls: bool,
}

impl<'a> MapView<'a> {
    pub fn new(explorer: &'a mut Explorer, style: &'a ExplorerStyle) -> Self {
        Self {
            explorer,
            style,
            size: None,
            show_controls: true,
        }
    }

    /// Set the map size (otherwise uses available space)
    pub fn size(mut self, size: Vec2) -> Self {
        self.size = Some(size);
        self
    }

    /// Set whether to show zoom controls (default: true)
    pub fn controls(mut self, show: bool) -> Self {
        self.show_controls = show;
        self
    }

    fn fit(&self, rect: Rect) -> ViewboxFit {
        let viewport = self.explorer.viewport();
        ViewboxFit::new(
            &Bounds::new(
                Point::new(rect.min.x as f64, rect.min.y as f64),
                Point::new(rect.max.x as f64, rect.max.y as f64),
            ),
            viewport.width(),
            viewport.height(),
        )
    }

    fn control_rects(&self, rect: Rect) -> [Rect; 2] {
        let controls = &self.style.zoom_controls;
        let size = Vec2::splat(controls.button_size);
        let origin = rect.right_top() + vec2(-(controls.margin + controls.button_size), controls.margin);
        [
            Rect::from_min_size(origin, size),
            Rect::from_min_size(origin + vec2(0.0, controls.button_size + 5.0), size),
        ]
    }

    /// Screen position of each city marker
    fn marker_positions(&self, fit: &ViewboxFit) -> Vec<(String, Pos2)> {
        let viewport = self.explorer.viewport();
        self.explorer
            .catalog()
            .cities()
            .iter()
            .map(|city| {
                let screen = fit.viewbox_to_screen(&viewport.to_screen(&city.coords));
                (city.id.clone(), pos2(screen.x as f32, screen.y as f32))
            })
            .collect()
    }

    fn hit_target(&self, pos: Pos2, markers: &[(String, Pos2)], controls: &[Rect]) -> HitTarget {
        if controls.iter().any(|rect| rect.contains(pos)) {
            return HitTarget::Control;
        }
        let reach = self.style.markers.size * self.style.markers.hover_scale + 2.0;
        markers
            .iter()
            .map(|(id, marker)| (id, marker.distance(pos)))
            .filter(|(_, distance)| *distance <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| HitTarget::Marker(id.clone()))
            .unwrap_or_default()
    }

    fn feed(&mut self, event: InputEvent, now: f64) {
        if let Err(err) = self.explorer.handle_input(event, now) {
            log::warn!("map input failed: {err}");
        }
    }

    fn paint_land(&self, painter: &Painter, fit: &ViewboxFit) {
        let transform = self.explorer.viewport().transform();
        let project = |p: &Point| {
            let screen = fit.viewbox_to_screen(&transform.apply(p));
            pos2(screen.x as f32, screen.y as f32)
        };

        let mut mesh = Mesh::default();
        for span in ITALY_FILL.iter() {
            let min = project(&Point::new(span.x0, span.y0));
            let max = project(&Point::new(span.x1, span.y1));
            mesh.add_colored_rect(Rect::from_min_max(min, max), self.style.land_fill);
        }
        painter.add(Shape::mesh(mesh));

        for ring in ITALY_OUTLINE.iter() {
            let points: Vec<Pos2> = ring.iter().map(project).collect();
            painter.add(PathShape::closed_line(points, self.style.land_stroke));
        }
    }

    fn paint_markers(&self, painter: &Painter, markers: &[(String, Pos2)], hovered: Option<&str>) {
        let style = &self.style.markers;
        let prefs = self.explorer.marker_prefs();
        let selection = self.explorer.selection();
        let k = self.explorer.viewport().transform().k;

        for (id, pos) in markers {
            let selected = selection.city() == Some(id.as_str());
            let compared = selection.comparison().iter().any(|c| c == id);
            let is_hovered = hovered == Some(id.as_str());

            let radius = if is_hovered { style.size * style.hover_scale } else { style.size };
            let fill = if selected { style.selected_color } else { marker_fill(prefs.color) };
            let border = Stroke::new(style.border_width, style.border_color);

            if compared {
                painter.circle_stroke(*pos, radius + 4.0, Stroke::new(2.5, style.comparison_color));
            }
            paint_marker(painter, prefs.style, *pos, radius, fill, border);

            let labels = &self.style.labels;
            if k >= labels.min_zoom || selected || compared || is_hovered {
                if let Some(city) = self.explorer.catalog().city(id) {
                    let anchor = *pos + vec2(radius + 4.0, 0.0);
                    for offset in [vec2(-1.0, 0.0), vec2(1.0, 0.0), vec2(0.0, -1.0), vec2(0.0, 1.0)] {
                        painter.text(
                            anchor + offset,
                            Align2::LEFT_CENTER,
                            &city.name,
                            labels.font_id.clone(),
                            labels.halo_color,
                        );
                    }
                    painter.text(anchor, Align2::LEFT_CENTER, &city.name, labels.font_id.clone(), labels.text_color);
                }
            }
        }
    }

    fn paint_controls(&self, painter: &Painter, controls: &[Rect; 2], hovered: Option<Pos2>) {
        let style = &self.style.zoom_controls;
        for (rect, label) in controls.iter().zip(["+", "−"]) {
            let background = if hovered.is_some_and(|pos| rect.contains(pos)) {
                style.hover_color
            } else {
                style.background_color
            };
            painter.rect_filled(*rect, style.rounding, background);
            painter.rect_stroke(*rect, style.rounding, style.border_stroke);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(16.0),
                style.text_color,
            );
        }
    }
}

/// Draws one marker centred on `pos` (pins stand on it)
pub fn paint_marker(painter: &Painter, shape: MarkerShape, pos: Pos2, radius: f32, fill: Color32, border: Stroke) {
    match shape {
        MarkerShape::Circle => {
            painter.circle(pos, radius, fill, border);
        }
        MarkerShape::Pin => {
            let head = pos - vec2(0.0, radius * 1.6);
            painter.add(Shape::convex_polygon(
                vec![head - vec2(radius * 0.8, 0.0), head + vec2(radius * 0.8, 0.0), pos],
                fill,
                border,
            ));
            painter.circle(head, radius, fill, border);
            painter.circle_filled(head, radius * 0.35, border.color);
        }
        MarkerShape::Star => {
            let points = star_points(pos, radius * 1.3, radius * 0.55);
            let mut mesh = Mesh::default();
            mesh.colored_vertex(pos, fill);
            for point in &points {
                mesh.colored_vertex(*point, fill);
            }
            let n = points.len() as u32;
            for i in 0..n {
                mesh.add_triangle(0, 1 + i, 1 + (i + 1) % n);
            }
            painter.add(Shape::mesh(mesh));
            painter.add(PathShape::closed_line(points, border));
        }
    }
}

/// Five-pointed star, first point straight up
pub fn star_points(center: Pos2, outer: f32, inner: f32) -> Vec<Pos2> {
    (0..10)
        .map(|i| {
            let angle = std::f32::consts::PI / 5.0 * i as f32 - std::f32::consts::FRAC_PI_2;
            let r = if i % 2 == 0 { outer } else { inner };
            center + vec2(angle.cos(), angle.sin()) * r
        })
        .collect()
}

impl Widget for MapView<'_> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        let desired_size = self.size.unwrap_or_else(|| ui.available_size());
        let (rect, response) = ui.allocate_exact_size(desired_size, Sense::click_and_drag());

        let fit = self.fit(rect);
        let controls = self.control_rects(rect);
        let control_rects: &[Rect] = if self.show_controls { &controls } else { &[] };
        let to_viewbox = |pos: Pos2| fit.screen_to_viewbox(&Point::new(pos.x as f64, pos.y as f64));

        let (now, pressed, released, scroll, modifiers, latest) = ui.input(|i| {
            (
                i.time,
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.raw_scroll_delta.y,
                i.modifiers,
                i.pointer.latest_pos(),
            )
        });
        let hover = response.hover_pos();
        let markers = self.marker_positions(&fit);
        let target = hover
            .map(|pos| self.hit_target(pos, &markers, control_rects))
            .unwrap_or_default();

        if let Some(pos) = hover {
            if pressed {
                self.feed(
                    InputEvent::PointerDown {
                        position: to_viewbox(pos),
                        target: target.clone(),
                    },
                    now,
                );
            }
            if scroll.abs() > 0.0 {
                // egui scrolls up with positive y; wheel events scroll down with positive delta
                self.feed(
                    InputEvent::Wheel {
                        delta_y: -scroll as f64,
                        position: to_viewbox(pos),
                    },
                    now,
                );
            }
        }

        if self.explorer.gestures().is_dragging() {
            match latest {
                Some(pos) if rect.contains(pos) => {
                    self.feed(InputEvent::PointerMove { position: to_viewbox(pos) }, now);
                }
                _ => self.feed(InputEvent::PointerLeave, now),
            }
        }
        if released {
            if let Some(pos) = latest {
                self.feed(InputEvent::PointerUp { position: to_viewbox(pos) }, now);
            }
        }

        if response.double_clicked() {
            if let Some(pos) = hover {
                let modifiers = KeyModifiers {
                    shift: modifiers.shift,
                    ctrl: modifiers.ctrl,
                    alt: modifiers.alt,
                    meta: modifiers.mac_cmd,
                };
                self.feed(
                    InputEvent::DoubleClick {
                        position: to_viewbox(pos),
                        target: target.clone(),
                        modifiers,
                    },
                    now,
                );
            }
        } else if response.clicked() {
            match &target {
                HitTarget::Marker(id) => {
                    if let Err(err) = self.explorer.select_city(id, now) {
                        log::warn!("could not select {id}: {err}");
                    }
                }
                HitTarget::Control => {
                    let direction = if hover.is_some_and(|pos| controls[0].contains(pos)) {
                        ZoomDirection::In
                    } else {
                        ZoomDirection::Out
                    };
                    self.feed(InputEvent::ZoomButton(direction), now);
                }
                HitTarget::Background => {}
            }
        }

        if self.explorer.tick(now) || self.explorer.gestures().is_dragging() {
            ui.ctx().request_repaint();
        }

        let cursor = match &target {
            _ if self.explorer.gestures().is_dragging() => CursorIcon::Grabbing,
            HitTarget::Marker(_) | HitTarget::Control => CursorIcon::PointingHand,
            HitTarget::Background => CursorIcon::Grab,
        };
        if hover.is_some() {
            ui.ctx().set_cursor_icon(cursor);
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.style.sea_color);
        self.paint_land(&painter, &fit);

        // Markers move with the transform applied this frame
        let markers = self.marker_positions(&fit);
        let hovered = match &target {
            HitTarget::Marker(id) => Some(id.as_str()),
            _ => None,
        };
        self.paint_markers(&painter, &markers, hovered);

        if self.show_controls {
            self.paint_controls(&painter, &controls, hover);
        }

        response
    }
}
