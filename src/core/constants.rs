//! Core constants for the schematic map and the content cache.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Width of the fixed logical map space (the viewbox).
pub const VIEWBOX_WIDTH: f64 = 500.0;

/// Height of the fixed logical map space (the viewbox).
pub const VIEWBOX_HEIGHT: f64 = 700.0;

/// Smallest allowed scale factor. Slightly below 1 so the whole map fits with a margin.
pub const MIN_ZOOM: f64 = 0.9;

/// Largest allowed scale factor.
pub const MAX_ZOOM: f64 = 8.0;

/// Wheel zoom sensitivity: scale is multiplied by `1 - delta_y * ZOOM_SPEED`.
pub const ZOOM_SPEED: f64 = 0.005;

/// Multiplicative step for double-click zoom (inverted with shift held).
pub const DOUBLE_CLICK_ZOOM_FACTOR: f64 = 1.8;

/// Multiplicative step for the +/- zoom buttons.
pub const BUTTON_ZOOM_FACTOR: f64 = 1.5;

/// Scale used when flying to a selected city.
pub const CITY_ZOOM: f64 = 4.0;

/// Duration of non-drag view transitions.
pub const TRANSITION_MS: u64 = 300;

/// Maximum number of cities in a comparison set.
pub const MAX_COMPARISON_CITIES: usize = 3;

/// Ratings in structured comparisons use this closed range.
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 10;

/// Rating written for a sub-criterion the model did not return.
pub const MISSING_RATING: u8 = 0;

/// Summary written for a sub-criterion the model did not return.
pub const MISSING_SUMMARY: &str = "Data unavailable.";

/// Default capacity of the in-memory cache tier.
pub const DEFAULT_MEMORY_CACHE_ENTRIES: usize = 256;

/// Annual tuition filter range for the program finder, in euros.
pub const TUITION_MIN: u32 = 500;
pub const TUITION_MAX: u32 = 40_000;
pub const TUITION_STEP: u32 = 500;
pub const DEFAULT_TUITION_MAX: u32 = 20_000;

/// Most programs kept from one search.
pub const MAX_PROGRAMS: usize = 10;
