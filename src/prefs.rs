//! Map marker appearance, persisted between sessions

use crate::content::keys::{MARKER_COLOR_KEY, MARKER_STYLE_KEY};
use crate::content::storage::KeyValueStore;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkerStyle {
    #[default]
    Circle,
    Pin,
    Star,
}

impl MarkerStyle {
    pub const ALL: [MarkerStyle; 3] = [MarkerStyle::Circle, MarkerStyle::Pin, MarkerStyle::Star];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerStyle::Circle => "circle",
            MarkerStyle::Pin => "pin",
            MarkerStyle::Star => "star",
        }
    }
}

impl fmt::Display for MarkerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "circle" => Ok(MarkerStyle::Circle),
            "pin" => Ok(MarkerStyle::Pin),
            "star" => Ok(MarkerStyle::Star),
            _ => Err(()),
        }
    }
}

/// An sRGB marker colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerColor(pub [u8; 3]);

impl MarkerColor {
    /// Parses `#RRGGBB`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// Named palette offered in the settings popup; the first entry is the default
pub const MARKER_PALETTE: [(&str, MarkerColor); 4] = [
    ("Adriatic Blue", MarkerColor([0x00, 0x7B, 0xFF])),
    ("Tuscan Red", MarkerColor([0xD6, 0x33, 0x6C])),
    ("Olive Green", MarkerColor([0x66, 0xA8, 0x0F])),
    ("Amalfi Lemon", MarkerColor([0xF5, 0x9E, 0x0B])),
];

impl Default for MarkerColor {
    fn default() -> Self {
        MARKER_PALETTE[0].1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerPrefs {
    pub style: MarkerStyle,
    pub color: MarkerColor,
}

impl MarkerPrefs {
    /// Reads saved prefs; missing or unrecognised values fall back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let style = store
            .get(MARKER_STYLE_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let color = store
            .get(MARKER_COLOR_KEY)
            .ok()
            .flatten()
            .and_then(|raw| MarkerColor::from_hex(raw.trim()))
            .unwrap_or_default();
        Self { style, color }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        for (key, value) in [
            (MARKER_STYLE_KEY, self.style.as_str().to_string()),
            (MARKER_COLOR_KEY, self.color.to_hex()),
        ] {
            if let Err(err) = store.set(key, &value) {
                log::warn!("failed to save {key}: {err}");
            }
        }
    }
}
