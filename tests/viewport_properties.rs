use studymap::{
    core::{config::ViewportConfig, geo::MapCoord},
    input::{
        events::{HitTarget, KeyModifiers, ZoomDirection},
        handler::Action,
    },
    GestureController, InputEvent, Point, Transform, Viewport,
};

/// Checks that hold for any sequence of gestures
#[cfg(test)]
mod viewport_properties {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_event(rng: &mut StdRng) -> InputEvent {
        let position = Point::new(rng.gen_range(0.0..500.0), rng.gen_range(0.0..700.0));
        match rng.gen_range(0..7) {
            0 => InputEvent::PointerDown {
                position,
                target: HitTarget::Background,
            },
            1 | 2 => InputEvent::PointerMove { position },
            3 => InputEvent::PointerUp { position },
            4 => InputEvent::Wheel {
                delta_y: rng.gen_range(-400.0..400.0),
                position,
            },
            5 => InputEvent::DoubleClick {
                position,
                target: HitTarget::Background,
                modifiers: KeyModifiers {
                    shift: rng.gen_bool(0.3),
                    ..KeyModifiers::default()
                },
            },
            _ => InputEvent::ZoomButton(if rng.gen_bool(0.5) {
                ZoomDirection::In
            } else {
                ZoomDirection::Out
            }),
        }
    }

    fn assert_in_bounds(viewport: &Viewport, t: Transform) {
        let config = viewport.config();
        assert!(t.k >= config.min_zoom - 1e-9 && t.k <= config.max_zoom + 1e-9, "{t:?}");

        for (value, extent) in [(t.x, viewport.width()), (t.y, viewport.height())] {
            let lower = extent * (1.0 - t.k);
            if lower > 0.0 {
                assert!((value - lower).abs() < 1e-6, "{t:?} not pinned");
            } else {
                assert!(value >= lower - 1e-6 && value <= 1e-6, "{t:?} out of pan range");
            }
        }
    }

    #[test]
    fn test_random_gestures_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut viewport = Viewport::new();
        let mut gestures = GestureController::new();

        for _ in 0..2_000 {
            let actions = gestures.apply(random_event(&mut rng), &mut viewport).unwrap();
            for action in &actions {
                // Animated targets must be valid too, not only what is applied now
                if let Some(target) = action.transform() {
                    assert_in_bounds(&viewport, target);
                }
            }
            assert_in_bounds(&viewport, viewport.transform());
        }
    }

    #[test]
    fn test_clamp_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(42);
        let viewport = Viewport::new();

        for _ in 0..1_000 {
            let t = Transform::new(
                rng.gen_range(-2.0..12.0),
                rng.gen_range(-5_000.0..5_000.0),
                rng.gen_range(-5_000.0..5_000.0),
            );
            let once = viewport.clamp(t);
            assert_in_bounds(&viewport, once);
            assert_eq!(viewport.clamp(once), once);
        }
    }

    #[test]
    fn test_wheel_keeps_point_under_cursor() {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(3.0, -500.0, -700.0));
        let mut gestures = GestureController::new();

        let anchor = Point::new(250.0, 350.0);
        let before = viewport.to_map(&anchor);
        let actions = gestures
            .apply(InputEvent::Wheel { delta_y: -100.0, position: anchor }, &mut viewport)
            .unwrap();

        assert!(matches!(actions[..], [Action::Zoom { animate: false, .. }]));
        assert!(viewport.transform().k > 3.0);
        let after = viewport.to_map(&anchor);
        assert!((before.x - after.x).abs() < 1e-6 && (before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn test_drag_follows_pointer_until_the_edge() {
        let mut viewport = Viewport::new();
        viewport.set_transform(Transform::new(2.0, -250.0, -350.0));
        let mut gestures = GestureController::new();

        let start = Point::new(200.0, 200.0);
        gestures
            .apply(InputEvent::PointerDown { position: start, target: HitTarget::Background }, &mut viewport)
            .unwrap();
        gestures
            .apply(InputEvent::PointerMove { position: Point::new(150.0, 170.0) }, &mut viewport)
            .unwrap();
        assert_eq!(viewport.transform(), Transform::new(2.0, -300.0, -380.0));

        // Far past the edge the translation stops at the pan bounds
        gestures
            .apply(InputEvent::PointerMove { position: Point::new(-2_000.0, 5_000.0) }, &mut viewport)
            .unwrap();
        assert_eq!(viewport.transform(), Transform::new(2.0, -500.0, 0.0));

        gestures
            .apply(InputEvent::PointerUp { position: start }, &mut viewport)
            .unwrap();
        assert!(!gestures.is_dragging());
    }

    #[test]
    fn test_marker_press_does_not_start_drag() {
        let mut viewport = Viewport::new();
        let mut gestures = GestureController::new();
        let actions = gestures
            .apply(
                InputEvent::PointerDown {
                    position: Point::new(10.0, 10.0),
                    target: HitTarget::Marker("rome".into()),
                },
                &mut viewport,
            )
            .unwrap();
        assert!(actions.is_empty());
        assert!(!gestures.is_dragging());
    }

    #[test]
    fn test_every_city_zoom_is_centered_or_clamped() {
        let viewport = Viewport::from_config(ViewportConfig::default());
        for (x, y) in [(45.5, 15.0), (59.5, 46.5), (63.0, 82.0), (44.0, 70.0)] {
            let coord = MapCoord::new(x, y);
            let target = viewport.compute_zoom_to_city(&coord, 4.0);
            assert_in_bounds(&viewport, target);

            let projected = viewport.project(&coord);
            let on_screen = target.apply(&projected);
            let centered = Point::new(viewport.width() / 2.0, viewport.height() / 2.0);
            // Off-center only when the city is near an edge of the map
            if (on_screen.x - centered.x).abs() > 1e-6 {
                assert!(target.x == 0.0 || (target.x - viewport.width() * (1.0 - 4.0)).abs() < 1e-6);
            }
        }
    }
}
