pub mod aggregator;
pub mod charts;
pub mod panel;

pub use aggregator::{CityComparisonResult, ComparisonAggregator};
pub use charts::{BarChart, RadarChart};
pub use panel::ComparisonPanel;
