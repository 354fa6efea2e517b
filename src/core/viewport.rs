use crate::core::config::ViewportConfig;
use crate::core::geo::{Bounds, MapCoord, Point};
use serde::{Deserialize, Serialize};

/// Scale and translation applied to the viewbox (SVG-style `translate(x, y) scale(k)`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Scale factor (1.0 = native size)
    pub k: f64,
    /// Horizontal translation in viewbox units
    pub x: f64,
    /// Vertical translation in viewbox units
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    /// Create identity transform (no change)
    pub fn identity() -> Self {
        Self {
            k: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn translation(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Maps a point from map space to viewbox space
    pub fn apply(&self, point: &Point) -> Point {
        Point::new(point.x * self.k + self.x, point.y * self.k + self.y)
    }

    /// Maps a point from viewbox space back to map space
    pub fn invert(&self, point: &Point) -> Point {
        Point::new((point.x - self.x) / self.k, (point.y - self.y) / self.k)
    }

    /// Linear interpolation, used for animated transitions
    pub fn lerp(&self, other: &Transform, t: f64) -> Transform {
        let t = t.clamp(0.0, 1.0);
        Transform {
            k: self.k + (other.k - self.k) * t,
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        (self.k - other.k).abs() <= epsilon
            && (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
    }
}

/// Owns the current view transform of the schematic map.
///
/// Every mutation goes through [`Viewport::clamp`], so the stored transform
/// always satisfies the zoom limits and pan bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    transform: Transform,
    config: ViewportConfig,
}

impl Viewport {
    pub fn new() -> Self {
        Self::from_config(ViewportConfig::default())
    }

    pub fn from_config(config: ViewportConfig) -> Self {
        Self {
            transform: Transform::identity(),
            config,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Copy of this viewport moved to `transform` (clamped)
    pub fn with_transform(&self, transform: Transform) -> Self {
        Self {
            transform: self.clamp(transform),
            config: self.config.clone(),
        }
    }

    pub fn width(&self) -> f64 {
        self.config.viewbox_width
    }

    pub fn height(&self) -> f64 {
        self.config.viewbox_height
    }

    /// Center of the viewbox, the anchor used by the zoom buttons
    pub fn center(&self) -> Point {
        Point::new(self.width() / 2.0, self.height() / 2.0)
    }

    /// The map's native bounding box in map space
    pub fn map_bounds(&self) -> Bounds {
        Bounds::from_origin_and_size(Point::new(0.0, 0.0), self.width(), self.height())
    }

    /// Projects a normalized city coordinate into (untransformed) map space
    pub fn project(&self, coord: &MapCoord) -> Point {
        Point::new(
            coord.x / 100.0 * self.width(),
            coord.y / 100.0 * self.height(),
        )
    }

    /// Inverse of [`Viewport::project`]
    pub fn unproject(&self, point: &Point) -> MapCoord {
        MapCoord::new(
            point.x / self.width() * 100.0,
            point.y / self.height() * 100.0,
        )
    }

    /// Position of a city in viewbox space under the current transform
    pub fn to_screen(&self, coord: &MapCoord) -> Point {
        self.transform.apply(&self.project(coord))
    }

    /// Map-space point currently under a viewbox position
    pub fn to_map(&self, point: &Point) -> Point {
        self.transform.invert(point)
    }

    /// Area of map space currently visible
    pub fn visible_rect(&self) -> Bounds {
        let t = self.transform;
        Bounds::from_origin_and_size(
            Point::new(-t.x / t.k, -t.y / t.k),
            self.width() / t.k,
            self.height() / t.k,
        )
    }

    /// Constrains a transform to the zoom limits, then the translation to the
    /// pan bounds for the clamped scale.
    ///
    /// Below scale 1 the pan range `[extent * (1 - k), 0]` is empty; the
    /// translation is pinned to its lower end `extent * (1 - k)`.
    pub fn clamp(&self, transform: Transform) -> Transform {
        let k = if transform.k.is_finite() {
            transform.k.clamp(self.config.min_zoom, self.config.max_zoom)
        } else {
            self.config.min_zoom
        };

        Transform {
            k,
            x: clamp_axis(transform.x, self.width(), k),
            y: clamp_axis(transform.y, self.height(), k),
        }
    }

    /// Replaces the transform, clamping it first
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = self.clamp(transform);
    }

    /// Computes the transform that scales by `factor` while keeping the
    /// viewbox point `anchor` fixed.
    ///
    /// Returns `None` when the gesture would not change the scale (a zero
    /// delta or already at the zoom limit). The scale is clamped before the
    /// translation is solved, so the anchor stays fixed whenever the
    /// resulting translation is inside the pan bounds.
    pub fn zoom_target_at(&self, anchor: Point, factor: f64) -> Option<Transform> {
        if !factor.is_finite() || factor == 1.0 {
            return None;
        }

        let current = self.transform;
        let requested = if factor <= 0.0 {
            self.config.min_zoom
        } else {
            current.k * factor
        };
        let k = requested.clamp(self.config.min_zoom, self.config.max_zoom);
        if (k - current.k).abs() < f64::EPSILON {
            return None;
        }

        let ratio = k / current.k;
        let translation = anchor.subtract(&anchor.subtract(&current.translation()).multiply(ratio));
        Some(self.clamp(Transform::new(k, translation.x, translation.y)))
    }

    /// Applies [`Viewport::zoom_target_at`] immediately
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> bool {
        match self.zoom_target_at(anchor, factor) {
            Some(target) => {
                self.transform = target;
                true
            }
            None => false,
        }
    }

    /// Transform that centers `coord` in the viewbox at scale `zoom`
    pub fn compute_zoom_to_city(&self, coord: &MapCoord, zoom: f64) -> Transform {
        let k = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        let projected = self.project(coord);
        self.clamp(Transform::new(
            k,
            self.width() / 2.0 - projected.x * k,
            self.height() / 2.0 - projected.y * k,
        ))
    }

    pub fn zoom_to_city(&mut self, coord: &MapCoord) -> Transform {
        self.transform = self.compute_zoom_to_city(coord, self.config.city_zoom);
        self.transform
    }

    /// Translates relative to a transform captured when a drag started
    pub fn pan_from(&mut self, start: &Transform, delta: Point) -> Transform {
        self.set_transform(Transform::new(start.k, start.x + delta.x, start.y + delta.y));
        self.transform
    }

    /// Back to the initial view
    pub fn reset(&mut self) {
        self.transform = self.clamp(Transform::identity());
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_axis(value: f64, extent: f64, k: f64) -> f64 {
    let lower = extent * (1.0 - k);
    if lower > 0.0 {
        return lower;
    }
    if value.is_finite() {
        value.clamp(lower, 0.0)
    } else {
        0.0
    }
}

/// Letterboxed fit of the viewbox into a screen rectangle (`xMidYMid meet`).
///
/// Pointer positions reach the gesture controller in viewbox units; this
/// converts from raw screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewboxFit {
    pub origin: Point,
    pub scale: f64,
}

impl ViewboxFit {
    pub fn new(screen: &Bounds, viewbox_width: f64, viewbox_height: f64) -> Self {
        let scale = (screen.width() / viewbox_width).min(screen.height() / viewbox_height);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let origin = Point::new(
            screen.min.x + (screen.width() - viewbox_width * scale) / 2.0,
            screen.min.y + (screen.height() - viewbox_height * scale) / 2.0,
        );
        Self { origin, scale }
    }

    pub fn screen_to_viewbox(&self, point: &Point) -> Point {
        point.subtract(&self.origin).multiply(1.0 / self.scale)
    }

    pub fn viewbox_to_screen(&self, point: &Point) -> Point {
        point.multiply(self.scale).add(&self.origin)
    }

    /// Converts a screen-space delta (drag distance) to viewbox units
    pub fn delta_to_viewbox(&self, delta: &Point) -> Point {
        delta.multiply(1.0 / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_project_is_percentage_of_viewbox() {
        let viewport = Viewport::new();
        let projected = viewport.project(&MapCoord::new(50.0, 10.0));
        assert_eq!(projected, Point::new(250.0, 70.0));
        assert_eq!(viewport.unproject(&projected), MapCoord::new(50.0, 10.0));
    }

    #[test]
    fn test_clamp_limits_zoom_then_translation() {
        let viewport = Viewport::new();

        let clamped = viewport.clamp(Transform::new(20.0, 100.0, -1e6));
        assert_eq!(clamped.k, 8.0);
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.y, 700.0 * (1.0 - 8.0));

        let clamped = viewport.clamp(Transform::new(2.0, -100.0, -200.0));
        assert_eq!(clamped, Transform::new(2.0, -100.0, -200.0));
    }

    #[test]
    fn test_clamp_pins_translation_when_zoomed_out() {
        let viewport = Viewport::new();
        let clamped = viewport.clamp(Transform::new(0.5, -40.0, 13.0));

        assert_eq!(clamped.k, 0.9);
        assert!((clamped.x - 50.0).abs() < EPS);
        assert!((clamped.y - 70.0).abs() < EPS);

        let clamped = viewport.clamp(Transform::new(0.9, 0.0, 0.0));
        assert!((clamped.x - 50.0).abs() < EPS);
        assert!((clamped.y - 70.0).abs() < EPS);
        assert_eq!(viewport.clamp(clamped), clamped);
    }

    #[test]
    fn test_with_transform_leaves_original() {
        let viewport = Viewport::new();
        let moved = viewport.with_transform(Transform::new(2.0, -900.0, 10.0));
        assert_eq!(moved.transform(), Transform::new(2.0, -500.0, 0.0));
        assert_eq!(viewport.transform(), Transform::identity());
    }

    #[test]
    fn test_clamp_rejects_non_finite_values() {
        let viewport = Viewport::new();
        let clamped = viewport.clamp(Transform::new(f64::NAN, f64::INFINITY, 0.0));
        assert_eq!(clamped.k, 0.9);
        assert!(clamped.x.is_finite());
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new();
        let anchor = Point::new(120.0, 480.0);
        let before = viewport.to_map(&anchor);

        assert!(viewport.zoom_at(anchor, 2.0));
        let after = viewport.transform().apply(&before);

        assert!((after.x - anchor.x).abs() < 1e-6);
        assert!((after.y - anchor.y).abs() < 1e-6);
        assert_eq!(viewport.transform().k, 2.0);
    }

    #[test]
    fn test_zoom_at_limit_is_noop() {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(8.0, -1000.0, -1000.0));
        assert!(viewport.zoom_target_at(Point::new(10.0, 10.0), 1.5).is_none());
        assert!(viewport.zoom_target_at(Point::new(10.0, 10.0), 1.0).is_none());
    }

    #[test]
    fn test_non_positive_factor_goes_to_min_zoom() {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(3.0, -300.0, -300.0));
        let target = viewport.zoom_target_at(viewport.center(), -2.0);
        assert_eq!(target.map(|t| t.k), Some(0.9));
    }

    #[test]
    fn test_zoom_to_city_centers_projected_point() {
        let viewport = Viewport::new();
        let target = viewport.compute_zoom_to_city(&MapCoord::new(50.0, 50.0), 4.0);

        assert_eq!(target.k, 4.0);
        assert!((target.x - (250.0 - 250.0 * 4.0)).abs() < EPS);
        assert!((target.y - (350.0 - 350.0 * 4.0)).abs() < EPS);

        // Near the corner the translation is clamped instead of centered
        let corner = viewport.compute_zoom_to_city(&MapCoord::new(1.0, 1.0), 4.0);
        assert_eq!(corner.x, 0.0);
        assert_eq!(corner.y, 0.0);
        assert_eq!(
            viewport.compute_zoom_to_city(&MapCoord::new(1.0, 1.0), 4.0),
            corner
        );
    }

    #[test]
    fn test_visible_rect_stays_inside_map() {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(3.0, 50.0, -5000.0));
        let visible = viewport.visible_rect();
        assert!(viewport.map_bounds().contains_bounds(&visible, 1e-9));
    }

    #[test]
    fn test_pan_from_snapshot() {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(2.0, -200.0, -200.0));
        let start = viewport.transform();

        viewport.pan_from(&start, Point::new(30.0, -20.0));
        assert_eq!(viewport.transform(), Transform::new(2.0, -170.0, -220.0));

        viewport.pan_from(&start, Point::new(1000.0, 0.0));
        assert_eq!(viewport.transform().x, 0.0);
    }

    #[test]
    fn test_viewbox_fit_letterboxes() {
        let screen = Bounds::from_origin_and_size(Point::new(0.0, 0.0), 1000.0, 700.0);
        let fit = ViewboxFit::new(&screen, 500.0, 700.0);

        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.origin, Point::new(250.0, 0.0));

        let screen_point = Point::new(500.0, 350.0);
        let viewbox_point = fit.screen_to_viewbox(&screen_point);
        assert_eq!(viewbox_point, Point::new(250.0, 350.0));
        assert_eq!(fit.viewbox_to_screen(&viewbox_point), screen_point);
    }

    #[test]
    fn test_transform_lerp() {
        let a = Transform::identity();
        let b = Transform::new(3.0, -100.0, -50.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Transform::new(2.0, -50.0, -25.0));
    }
}
