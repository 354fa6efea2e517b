//! Chart geometry for comparison and overview data.
//!
//! Everything here is pure layout in a local coordinate space; the ui layer
//! only maps it onto the screen and paints it.

use crate::compare::aggregator::CityComparisonResult;
use crate::constants::RATING_MAX;
use crate::core::catalog::SubTopic;
use crate::core::geo::Point;
use crate::service::model::CityStat;
use std::f64::consts::PI;

/// Series colours, cycled by city position (blue, orange, green)
pub const SERIES_COLORS: [[u8; 3]; 3] = [[0x3B, 0x82, 0xF6], [0xF9, 0x73, 0x16], [0x10, 0xB9, 0x81]];

pub fn series_color(index: usize) -> [u8; 3] {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Radar charts need at least this many axes to form a polygon
pub const MIN_RADAR_AXES: usize = 3;

const RADIUS_FRACTION: f64 = 0.8;
const GRID_LEVELS: usize = 5;
/// Axis labels sit just outside the outer ring, in rating units
const LABEL_RATING: f64 = 11.5;

/// One polygon on a radar chart
#[derive(Debug, Clone, PartialEq)]
pub struct RadarSeries {
    pub city_id: String,
    pub color: [u8; 3],
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: String,
    pub position: Point,
    pub anchor: LabelAnchor,
}

/// Radar chart of ratings, one axis per criterion, laid out in a square of
/// side `size`
#[derive(Debug, Clone, PartialEq)]
pub struct RadarChart {
    size: f64,
    axes: Vec<String>,
}

impl RadarChart {
    /// `None` with fewer than [`MIN_RADAR_AXES`] criteria
    pub fn new(size: f64, sub_topics: &[SubTopic]) -> Option<Self> {
        if sub_topics.len() < MIN_RADAR_AXES {
            return None;
        }
        Some(Self {
            size,
            axes: sub_topics.iter().map(|st| st.name.clone()).collect(),
        })
    }

    pub fn center(&self) -> Point {
        Point::new(self.size / 2.0, self.size / 2.0)
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0 * RADIUS_FRACTION
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn angle(&self, index: usize) -> f64 {
        2.0 * PI / self.axes.len() as f64 * index as f64 - PI / 2.0
    }

    /// Position of `rating` on axis `index`; axis 0 points straight up
    pub fn point(&self, rating: f64, index: usize) -> Point {
        let r = rating / RATING_MAX as f64 * self.radius();
        let angle = self.angle(index);
        let center = self.center();
        Point::new(center.x + r * angle.cos(), center.y + r * angle.sin())
    }

    /// End points of each axis line
    pub fn axis_lines(&self) -> Vec<(Point, Point)> {
        (0..self.axes.len())
            .map(|i| (self.center(), self.point(RATING_MAX as f64, i)))
            .collect()
    }

    /// Concentric grid polygons, innermost first
    pub fn grid(&self) -> Vec<Vec<Point>> {
        (1..=GRID_LEVELS)
            .map(|level| {
                let rating = RATING_MAX as f64 * level as f64 / GRID_LEVELS as f64;
                (0..self.axes.len()).map(|i| self.point(rating, i)).collect()
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<AxisLabel> {
        let center = self.center();
        self.axes
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let position = self.point(LABEL_RATING, i);
                let anchor = if position.x < center.x - 1.0 {
                    LabelAnchor::End
                } else if position.x > center.x + 1.0 {
                    LabelAnchor::Start
                } else {
                    LabelAnchor::Middle
                };
                AxisLabel {
                    text: text.clone(),
                    position,
                    anchor,
                }
            })
            .collect()
    }

    /// One polygon per result; missing criteria sit at the centre.
    /// Colours follow the result's position in the batch.
    pub fn series(&self, results: &[CityComparisonResult]) -> Vec<RadarSeries> {
        results
            .iter()
            .enumerate()
            .map(|(index, result)| RadarSeries {
                city_id: result.city_id.clone(),
                color: series_color(index),
                points: self
                    .axes
                    .iter()
                    .enumerate()
                    .map(|(i, axis)| self.point(result.rating(axis) as f64, i))
                    .collect(),
            })
            .collect()
    }
}

/// One horizontal bar of the overview chart
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: u8,
    /// Filled share of the track, 0..=1
    pub fraction: f32,
    pub summary: String,
}

/// Overview statistics as horizontal bars on a 0-100 scale
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarChart {
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn from_stats(stats: &[CityStat]) -> Self {
        let bars = stats
            .iter()
            .map(|stat| {
                let value = stat.value.min(100);
                Bar {
                    label: stat.metric.clone(),
                    value,
                    fraction: value as f32 / 100.0,
                    summary: stat.summary.clone(),
                }
            })
            .collect();
        Self { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// A criterion row of the comparison table: each city's rating, in batch
/// order, with `None` for cities whose fetch failed
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub sub_topic: String,
    pub ratings: Vec<Option<u8>>,
    /// Index of the highest available rating, if any city has one
    pub best: Option<usize>,
}

pub fn comparison_rows(sub_topics: &[SubTopic], results: &[CityComparisonResult]) -> Vec<ComparisonRow> {
    sub_topics
        .iter()
        .map(|st| {
            let ratings: Vec<Option<u8>> = results
                .iter()
                .map(|result| {
                    if result.is_error() {
                        None
                    } else {
                        Some(result.rating(&st.name)).filter(|&r| r > 0)
                    }
                })
                .collect();

            let mut best: Option<(usize, u8)> = None;
            for (index, rating) in ratings.iter().enumerate() {
                if let Some(rating) = *rating {
                    if best.map_or(true, |(_, top)| rating > top) {
                        best = Some((index, rating));
                    }
                }
            }

            ComparisonRow {
                sub_topic: st.name.clone(),
                ratings,
                best: best.map(|(index, _)| index),
            }
        })
        .collect()
}
