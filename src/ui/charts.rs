use crate::compare::aggregator::CityComparisonResult;
use crate::compare::charts::{BarChart, LabelAnchor, RadarChart};
use crate::core::geo::Point;
use crate::ui::style::{series_fill, translucent};
use egui::{epaint::{Mesh, PathShape}, pos2, vec2, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui};

/// Paints a radar chart of `results` into a square of the chart's size.
/// `name_of` maps city ids to display names for the legend.
pub fn radar(ui: &mut Ui, chart: &RadarChart, results: &[CityComparisonResult], name_of: impl Fn(&str) -> String) {
    let size = (chart.center().x * 2.0) as f32;
    let (response, painter) = ui.allocate_painter(vec2(size, size), Sense::hover());
    let origin = response.rect.min;
    let at = |p: &Point| pos2(origin.x + p.x as f32, origin.y + p.y as f32);

    let grid_stroke = Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color);
    for ring in chart.grid() {
        painter.add(PathShape::closed_line(ring.iter().map(at).collect(), grid_stroke));
    }
    for (from, to) in chart.axis_lines() {
        painter.line_segment([at(&from), at(&to)], grid_stroke);
    }

    let text_color = ui.visuals().text_color();
    for label in chart.labels() {
        let align = match label.anchor {
            LabelAnchor::Start => Align2::LEFT_CENTER,
            LabelAnchor::Middle => Align2::CENTER_CENTER,
            LabelAnchor::End => Align2::RIGHT_CENTER,
        };
        painter.text(at(&label.position), align, &label.text, FontId::proportional(11.0), text_color);
    }

    let center = at(&chart.center());
    for (index, series) in chart.series(results).iter().enumerate() {
        if results[index].is_error() {
            continue;
        }
        let color = series_fill(index);
        let points: Vec<Pos2> = series.points.iter().map(at).collect();

        // Each vertex lies on its own axis, so a fan from the centre covers the polygon
        let mut mesh = Mesh::default();
        mesh.colored_vertex(center, translucent(color, 60));
        for point in &points {
            mesh.colored_vertex(*point, translucent(color, 60));
        }
        let n = points.len() as u32;
        for i in 0..n {
            mesh.add_triangle(0, 1 + i, 1 + (i + 1) % n);
        }
        painter.add(Shape::mesh(mesh));
        painter.add(PathShape::closed_line(points, Stroke::new(2.0, color)));
    }

    ui.horizontal_wrapped(|ui| {
        for (index, result) in results.iter().enumerate() {
            let (rect, _) = ui.allocate_exact_size(vec2(10.0, 10.0), Sense::hover());
            ui.painter().rect_filled(rect, 2.0, series_fill(index));
            let name = name_of(&result.city_id);
            if result.is_error() {
                ui.weak(format!("{name} (unavailable)"));
            } else {
                ui.label(name);
            }
        }
    });
}

/// Horizontal bars on a 0-100 track with the value at the end; hovering
/// shows the summary
pub fn bars(ui: &mut Ui, chart: &BarChart, accent: Color32) {
    let width = ui.available_width().max(120.0);
    let track = ui.visuals().extreme_bg_color;

    for bar in &chart.bars {
        ui.label(&bar.label);
        let (rect, response) = ui.allocate_exact_size(vec2(width, 12.0), Sense::hover());
        let painter = ui.painter();
        painter.rect_filled(rect, 4.0, track);
        let mut filled = rect;
        filled.set_width(rect.width() * bar.fraction.clamp(0.0, 1.0));
        painter.rect_filled(filled, 4.0, accent);
        painter.text(
            rect.right_center() - vec2(4.0, 0.0),
            Align2::RIGHT_CENTER,
            bar.value.to_string(),
            FontId::proportional(10.0),
            ui.visuals().strong_text_color(),
        );
        if !bar.summary.is_empty() {
            response.on_hover_text(&bar.summary);
        }
        ui.add_space(4.0);
    }
}
