pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{HitTarget, InputEvent, KeyModifiers, ZoomDirection};
pub use handler::{Action, GestureController, GestureState, TransformAnimation, ViewportOperations};
