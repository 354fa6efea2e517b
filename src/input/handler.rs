use crate::{
    core::{
        config::ViewportConfig,
        geo::Point,
        viewport::{Transform, Viewport},
    },
    input::events::{InputEvent, KeyModifiers, ZoomDirection},
    prelude::Duration,
    Result,
};

/// View change produced by a gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Drag update; applied without animation
    Pan { transform: Transform },
    /// Zoom around `anchor`
    Zoom {
        transform: Transform,
        anchor: Point,
        animate: bool,
        duration: Duration,
    },
    /// Start dragging mode
    StartDrag,
    /// End dragging mode
    EndDrag,
}

impl Action {
    /// Target transform, for the actions that carry one
    pub fn transform(&self) -> Option<Transform> {
        match self {
            Action::Pan { transform } | Action::Zoom { transform, .. } => Some(*transform),
            Action::StartDrag | Action::EndDrag => None,
        }
    }
}

/// Gesture state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        start_pointer: Point,
        start_transform: Transform,
        last_pointer: Point,
    },
}

/// Eased interpolation between two transforms, sampled with a clock in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformAnimation {
    pub from: Transform,
    pub to: Transform,
    start: f64,
    duration: f64,
}

impl TransformAnimation {
    pub fn new(from: Transform, to: Transform, now: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            start: now,
            duration: duration.as_secs_f64(),
        }
    }

    /// Current transform and whether the animation has finished
    pub fn sample(&self, now: f64) -> (Transform, bool) {
        if self.duration <= 0.0 {
            return (self.to, true);
        }
        let progress = ((now - self.start) / self.duration).clamp(0.0, 1.0);
        if progress >= 1.0 {
            return (self.to, true);
        }
        (self.from.lerp(&self.to, ease_out_cubic(progress)), false)
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * t + 1.0
}

/// Viewport operation implementations
pub struct ViewportOperations;

impl ViewportOperations {
    /// Execute any action. Every transform goes through the viewport clamp.
    pub fn execute_action(viewport: &mut Viewport, action: &Action) -> Result<()> {
        match action {
            Action::Pan { transform } | Action::Zoom { transform, .. } => {
                viewport.set_transform(*transform);
            }
            Action::StartDrag => log::trace!("drag started at {:?}", viewport.transform()),
            Action::EndDrag => log::trace!("drag ended at {:?}", viewport.transform()),
        }
        Ok(())
    }

    pub fn execute_all(viewport: &mut Viewport, actions: &[Action]) -> Result<()> {
        for action in actions {
            Self::execute_action(viewport, action)?;
        }
        Ok(())
    }
}

/// Turns pointer, wheel and button input into viewport actions.
///
/// Holds only the drag state; the transform itself lives in [`Viewport`].
#[derive(Debug, Clone)]
pub struct GestureController {
    pub enabled: bool,
    state: GestureState,

    pub zoom_on_wheel: bool,
    pub zoom_on_double_click: bool,
    pub pan_on_drag: bool,
    pub zoom_speed: f64,
    pub double_click_factor: f64,
    pub button_factor: f64,
    pub zoom_duration: Duration,
}

impl GestureController {
    pub fn new() -> Self {
        Self::from_config(&ViewportConfig::default())
    }

    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            enabled: true,
            state: GestureState::Idle,
            zoom_on_wheel: true,
            zoom_on_double_click: true,
            pan_on_drag: true,
            zoom_speed: config.zoom_speed,
            double_click_factor: config.double_click_factor,
            button_factor: config.button_factor,
            zoom_duration: config.transition(),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Drops any drag in progress without emitting actions
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Handle one input event against the current viewport
    pub fn handle_event(&mut self, event: InputEvent, viewport: &Viewport) -> Vec<Action> {
        if !self.enabled {
            return vec![];
        }

        let mut actions = vec![];

        match event {
            InputEvent::PointerDown { position, target } => {
                // Markers and controls handle their own clicks
                if self.pan_on_drag && !target.is_interactive() {
                    self.state = GestureState::Dragging {
                        start_pointer: position,
                        start_transform: viewport.transform(),
                        last_pointer: position,
                    };
                    actions.push(Action::StartDrag);
                }
            }
            InputEvent::PointerMove { position } => {
                if let GestureState::Dragging {
                    start_pointer,
                    start_transform,
                    ref mut last_pointer,
                } = self.state
                {
                    *last_pointer = position;
                    let delta = position.subtract(&start_pointer);
                    let target = viewport.clamp(Transform::new(
                        start_transform.k,
                        start_transform.x + delta.x,
                        start_transform.y + delta.y,
                    ));
                    if target != viewport.transform() {
                        actions.push(Action::Pan { transform: target });
                    }
                }
            }
            InputEvent::PointerUp { .. } | InputEvent::PointerLeave => {
                if self.is_dragging() {
                    self.state = GestureState::Idle;
                    actions.push(Action::EndDrag);
                }
            }
            InputEvent::Wheel { delta_y, position } => {
                if self.zoom_on_wheel && delta_y != 0.0 {
                    let factor = 1.0 - delta_y * self.zoom_speed;
                    if let Some(target) = viewport.zoom_target_at(position, factor) {
                        self.rebase_drag(target);
                        actions.push(Action::Zoom {
                            transform: target,
                            anchor: position,
                            animate: false,
                            duration: Duration::ZERO,
                        });
                    }
                }
            }
            InputEvent::DoubleClick {
                position,
                target,
                modifiers,
            } => {
                if self.zoom_on_double_click && !target.is_interactive() {
                    let factor = self.double_click_step(modifiers);
                    if let Some(target) = viewport.zoom_target_at(position, factor) {
                        actions.push(self.animated_zoom(target, position));
                    }
                }
            }
            InputEvent::ZoomButton(direction) => {
                let factor = match direction {
                    ZoomDirection::In => self.button_factor,
                    ZoomDirection::Out => 1.0 / self.button_factor,
                };
                let anchor = viewport.center();
                if let Some(target) = viewport.zoom_target_at(anchor, factor) {
                    actions.push(self.animated_zoom(target, anchor));
                }
            }
        }

        actions
    }

    /// Handle an event and apply the resulting actions to the viewport
    pub fn apply(&mut self, event: InputEvent, viewport: &mut Viewport) -> Result<Vec<Action>> {
        let actions = self.handle_event(event, viewport);
        ViewportOperations::execute_all(viewport, &actions)?;
        Ok(actions)
    }

    fn double_click_step(&self, modifiers: KeyModifiers) -> f64 {
        if modifiers.shift {
            1.0 / self.double_click_factor
        } else {
            self.double_click_factor
        }
    }

    fn animated_zoom(&self, transform: Transform, anchor: Point) -> Action {
        Action::Zoom {
            transform,
            anchor,
            animate: true,
            duration: self.zoom_duration,
        }
    }

    // A wheel zoom mid-drag restarts the drag from the zoomed transform so
    // the next move does not undo it.
    fn rebase_drag(&mut self, zoomed: Transform) {
        if let GestureState::Dragging {
            ref mut start_pointer,
            ref mut start_transform,
            last_pointer,
        } = self.state
        {
            *start_pointer = last_pointer;
            *start_transform = zoomed;
        }
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::HitTarget;

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown {
            position: Point::new(x, y),
            target: HitTarget::Background,
        }
    }

    fn moved(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove {
            position: Point::new(x, y),
        }
    }

    fn zoomed_viewport() -> Viewport {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(2.0, -250.0, -350.0));
        viewport
    }

    #[test]
    fn test_drag_pans_from_snapshot() {
        let mut viewport = zoomed_viewport();
        let mut gestures = GestureController::new();

        let actions = gestures.apply(down(100.0, 100.0), &mut viewport).unwrap();
        assert_eq!(actions, vec![Action::StartDrag]);
        assert!(gestures.is_dragging());

        gestures.apply(moved(110.0, 90.0), &mut viewport).unwrap();
        assert_eq!(viewport.transform(), Transform::new(2.0, -240.0, -360.0));

        // Second move is measured from the drag start, not the last position
        gestures.apply(moved(130.0, 100.0), &mut viewport).unwrap();
        assert_eq!(viewport.transform(), Transform::new(2.0, -220.0, -350.0));

        let actions = gestures.apply(InputEvent::PointerLeave, &mut viewport).unwrap();
        assert_eq!(actions, vec![Action::EndDrag]);
        assert!(!gestures.is_dragging());
    }

    #[test]
    fn test_pan_actions_are_immediate_and_clamped() {
        let viewport = zoomed_viewport();
        let mut gestures = GestureController::new();
        gestures.handle_event(down(0.0, 0.0), &viewport);

        let actions = gestures.handle_event(moved(5000.0, 0.0), &viewport);
        assert_eq!(
            actions,
            vec![Action::Pan {
                transform: Transform::new(2.0, 0.0, -350.0)
            }]
        );
    }

    #[test]
    fn test_marker_press_does_not_start_drag() {
        let viewport = zoomed_viewport();
        let mut gestures = GestureController::new();

        let actions = gestures.handle_event(
            InputEvent::PointerDown {
                position: Point::new(10.0, 10.0),
                target: HitTarget::Marker("milan".into()),
            },
            &viewport,
        );
        assert!(actions.is_empty());
        assert!(gestures.handle_event(moved(50.0, 50.0), &viewport).is_empty());
    }

    #[test]
    fn test_zero_delta_events_are_noops() {
        let viewport = zoomed_viewport();
        let mut gestures = GestureController::new();

        let wheel = InputEvent::Wheel {
            delta_y: 0.0,
            position: Point::new(100.0, 100.0),
        };
        assert!(gestures.handle_event(wheel, &viewport).is_empty());

        gestures.handle_event(down(40.0, 40.0), &viewport);
        assert!(gestures.handle_event(moved(40.0, 40.0), &viewport).is_empty());
    }

    #[test]
    fn test_wheel_zoom_factor() {
        let mut viewport = Viewport::new();
        let mut gestures = GestureController::new();

        gestures
            .apply(
                InputEvent::Wheel {
                    delta_y: -100.0,
                    position: Point::new(250.0, 350.0),
                },
                &mut viewport,
            )
            .unwrap();
        assert!((viewport.transform().k - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_double_click_zoom_in_and_out() {
        let mut viewport = Viewport::new();
        let mut gestures = GestureController::new();
        let anchor = Point::new(200.0, 300.0);

        let actions = gestures
            .apply(
                InputEvent::DoubleClick {
                    position: anchor,
                    target: HitTarget::Background,
                    modifiers: KeyModifiers::default(),
                },
                &mut viewport,
            )
            .unwrap();
        assert!(matches!(actions.as_slice(), [Action::Zoom { animate: true, .. }]));
        assert!((viewport.transform().k - 1.8).abs() < 1e-9);

        gestures
            .apply(
                InputEvent::DoubleClick {
                    position: anchor,
                    target: HitTarget::Background,
                    modifiers: KeyModifiers::shift(),
                },
                &mut viewport,
            )
            .unwrap();
        assert!((viewport.transform().k - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_double_click_on_marker_is_ignored() {
        let viewport = Viewport::new();
        let mut gestures = GestureController::new();
        let actions = gestures.handle_event(
            InputEvent::DoubleClick {
                position: Point::new(1.0, 1.0),
                target: HitTarget::Marker("rome".into()),
                modifiers: KeyModifiers::default(),
            },
            &viewport,
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_zoom_buttons_anchor_at_center() {
        let mut viewport = Viewport::new();
        let mut gestures = GestureController::new();
        let center = viewport.center();
        let before = viewport.to_map(&center);

        gestures
            .apply(InputEvent::ZoomButton(ZoomDirection::In), &mut viewport)
            .unwrap();
        assert!((viewport.transform().k - 1.5).abs() < 1e-9);
        let after = viewport.transform().apply(&before);
        assert!(after.distance_to(&center) < 1e-6);

        // Zooming out past the minimum lands on the minimum
        gestures
            .apply(InputEvent::ZoomButton(ZoomDirection::Out), &mut viewport)
            .unwrap();
        gestures
            .apply(InputEvent::ZoomButton(ZoomDirection::Out), &mut viewport)
            .unwrap();
        assert_eq!(viewport.transform().k, 0.9);
        assert!(gestures
            .handle_event(InputEvent::ZoomButton(ZoomDirection::Out), &viewport)
            .is_empty());
    }

    #[test]
    fn test_wheel_during_drag_rebases() {
        let mut viewport = Viewport::new();
        let mut gestures = GestureController::new();

        gestures.apply(down(250.0, 350.0), &mut viewport).unwrap();
        gestures.apply(moved(250.0, 350.0), &mut viewport).unwrap();
        gestures
            .apply(
                InputEvent::Wheel {
                    delta_y: -200.0,
                    position: Point::new(250.0, 350.0),
                },
                &mut viewport,
            )
            .unwrap();
        let zoomed = viewport.transform();
        assert_eq!(zoomed.k, 2.0);

        gestures.apply(moved(260.0, 350.0), &mut viewport).unwrap();
        assert_eq!(viewport.transform().k, 2.0);
        assert!((viewport.transform().x - (zoomed.x + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_transform_animation_samples() {
        let from = Transform::identity();
        let to = Transform::new(4.0, -400.0, -400.0);
        let animation = TransformAnimation::new(from, to, 10.0, Duration::from_millis(300));

        assert_eq!(animation.sample(10.0), (from, false));
        let (mid, done) = animation.sample(10.15);
        assert!(!done);
        assert!(mid.k > 1.0 && mid.k < 4.0);
        assert_eq!(animation.sample(11.0), (to, true));
    }
}
