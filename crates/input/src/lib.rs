//! Pointer input: button/cursor tracking and the arc-ball controller.

pub mod arcball;

pub use arcball::ArcBall;

use glam::Vec2;
use std::collections::HashSet;

/// A pointer gesture the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button released inside the window.
    Click(Vec2),
    /// Secondary button pressed: start rotating.
    DragStart(Vec2),
    /// Cursor moved while the secondary button is held.
    DragMove(Vec2),
    /// Secondary button released.
    DragEnd(Vec2),
    /// The window lost the pointer (cursor left or focus lost) mid-drag.
    CaptureLost,
    /// Request for a context menu on the drawing surface.
    ContextMenu(Vec2),
}

/// Tracks mouse state and translates raw updates into [`PointerEvent`]s.
#[derive(Debug, Default)]
pub struct InputState {
    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse position in window coordinates.
    mouse_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) -> Option<PointerEvent> {
        let position = self.mouse_position;
        match state {
            ElementState::Pressed => {
                let fresh = self.mouse_held.insert(button);
                match button {
                    MouseButton::Right if fresh => Some(PointerEvent::DragStart(position)),
                    _ => None,
                }
            }
            ElementState::Released => {
                let was_held = self.mouse_held.remove(&button);
                match button {
                    MouseButton::Left if was_held => Some(PointerEvent::Click(position)),
                    MouseButton::Right if was_held => Some(PointerEvent::DragEnd(position)),
                    _ => None,
                }
            }
        }
    }

    /// Process cursor position update.
    pub fn process_cursor_position(&mut self, position: (f64, f64)) -> Option<PointerEvent> {
        self.mouse_position = Vec2::new(position.0 as f32, position.1 as f32);
        self.is_mouse_held(MouseButton::Right)
            .then_some(PointerEvent::DragMove(self.mouse_position))
    }

    /// Cursor left the window or the window lost focus: held buttons are forgotten.
    pub fn process_capture_lost(&mut self) -> Option<PointerEvent> {
        let dragging = self.mouse_held.contains(&MouseButton::Right);
        self.mouse_held.clear();
        dragging.then_some(PointerEvent::CaptureLost)
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
