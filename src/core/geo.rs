use serde::{Deserialize, Serialize};

/// Position of a city on the schematic map, as percentages of the map's
/// width (`x`) and height (`y`). Both axes are expected in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCoord {
    pub x: f64,
    pub y: f64,
}

impl MapCoord {
    /// Creates a new normalized coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Validates that both axes are inside the percentage range
    pub fn is_valid(&self) -> bool {
        (0.0..=100.0).contains(&self.x) && (0.0..=100.0).contains(&self.y)
    }

    /// Straight-line distance in percentage units.
    ///
    /// The map is schematic rather than geographic, so this is plain
    /// Euclidean distance and not a great-circle distance.
    pub fn distance_to(&self, other: &MapCoord) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Represents a point in viewbox or screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Axis-aligned rectangle in viewbox coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from an origin and a size
    pub fn from_origin_and_size(origin: Point, width: f64, height: f64) -> Self {
        Self::new(origin, Point::new(origin.x + width, origin.y + height))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if `other` lies entirely inside these bounds, allowing `epsilon` of slack
    pub fn contains_bounds(&self, other: &Bounds, epsilon: f64) -> bool {
        other.min.x >= self.min.x - epsilon
            && other.min.y >= self.min.y - epsilon
            && other.max.x <= self.max.x + epsilon
            && other.max.y <= self.max.y + epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_coord_distance_is_euclidean() {
        let a = MapCoord::new(0.0, 0.0);
        let b = MapCoord::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert!(a.is_valid());
        assert!(!MapCoord::new(101.0, 5.0).is_valid());
    }

    #[test]
    fn test_bounds_containment() {
        let outer = Bounds::from_origin_and_size(Point::new(0.0, 0.0), 500.0, 700.0);
        let inner = Bounds::from_origin_and_size(Point::new(10.0, 10.0), 100.0, 100.0);
        assert!(outer.contains_bounds(&inner, 0.0));
        assert!(!inner.contains_bounds(&outer, 0.0));
        assert!(outer.contains(&Point::new(250.0, 350.0)));
        assert_eq!(outer.center(), Point::new(250.0, 350.0));
    }
}
