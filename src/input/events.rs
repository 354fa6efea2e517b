use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Pointer and button input for the map surface.
///
/// Positions are in viewbox units; see [`crate::core::viewport::ViewboxFit`]
/// for the conversion from screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Primary button pressed
    PointerDown { position: Point, target: HitTarget },
    /// Pointer moved over the surface
    PointerMove { position: Point },
    /// Primary button released
    PointerUp { position: Point },
    /// Pointer left the surface
    PointerLeave,
    /// Scroll wheel; positive `delta_y` scrolls down (zooms out)
    Wheel { delta_y: f64, position: Point },
    /// Double click/tap
    DoubleClick {
        position: Point,
        target: HitTarget,
        modifiers: KeyModifiers,
    },
    /// One of the +/- zoom buttons
    ZoomButton(ZoomDirection),
}

/// Element under the pointer when a press starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HitTarget {
    #[default]
    Background,
    /// A city marker, by city id
    Marker(String),
    /// Zoom buttons, settings and other overlay controls
    Control,
}

impl HitTarget {
    pub fn is_interactive(&self) -> bool {
        !matches!(self, HitTarget::Background)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyModifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { position, .. }
            | InputEvent::PointerMove { position }
            | InputEvent::PointerUp { position }
            | InputEvent::Wheel { position, .. }
            | InputEvent::DoubleClick { position, .. } => Some(*position),
            InputEvent::PointerLeave | InputEvent::ZoomButton(_) => None,
        }
    }

    /// Checks if this is a mouse/pointer event
    pub fn is_pointer_event(&self) -> bool {
        !matches!(self, InputEvent::ZoomButton(_))
    }

    /// Double-clicks and zoom buttons, the gestures that zoom with a transition
    pub fn is_stepped_zoom(&self) -> bool {
        matches!(self, InputEvent::DoubleClick { .. } | InputEvent::ZoomButton(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event_position() {
        let down = InputEvent::PointerDown {
            position: Point::new(100.0, 200.0),
            target: HitTarget::Background,
        };
        assert_eq!(down.position(), Some(Point::new(100.0, 200.0)));
        assert_eq!(InputEvent::PointerLeave.position(), None);
        assert_eq!(InputEvent::ZoomButton(ZoomDirection::In).position(), None);
    }

    #[test]
    fn test_event_type_checks() {
        assert!(InputEvent::PointerLeave.is_pointer_event());
        assert!(!InputEvent::ZoomButton(ZoomDirection::Out).is_pointer_event());
        assert!(HitTarget::Marker("milan".into()).is_interactive());
        assert!(HitTarget::Control.is_interactive());
        assert!(!HitTarget::Background.is_interactive());
    }
}
