use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Everything the scene needs from the input devices for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
    /// Pressed since the previous snapshot.
    pub toggle_wireframe: bool,
    /// Pressed since the previous snapshot.
    pub quit: bool,
    /// Accumulated mouse motion in pixels, `(dx, dy)`.
    pub look_delta: (f32, f32),
}

/// Collects winit events between frames and turns them into an
/// [`InputSnapshot`] once per frame.
#[derive(Debug, Default)]
pub struct InputCollector {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    look_delta: (f64, f64),
    capture_requested: bool,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the event was consumed.
    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => self.key_event(*code, *state, *repeat),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.capture_requested = true;
                true
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
                false
            }
            _ => false,
        }
    }

    pub fn key_event(&mut self, code: KeyCode, state: ElementState, repeat: bool) -> bool {
        if !is_bound(code) {
            return false;
        }
        match state {
            ElementState::Pressed => {
                if !repeat && self.held.insert(code) {
                    self.pressed.insert(code);
                }
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
        true
    }

    pub fn mouse_motion(&mut self, dx: f64, dy: f64) {
        self.look_delta.0 += dx;
        self.look_delta.1 += dy;
    }

    /// Whether a click asked for the cursor to be captured. Cleared on read.
    pub fn take_capture_request(&mut self) -> bool {
        std::mem::take(&mut self.capture_requested)
    }

    /// Builds this frame's snapshot and resets the per-frame edges and deltas.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let held = |code: KeyCode| self.held.contains(&code);
        let snapshot = InputSnapshot {
            forward: held(KeyCode::KeyW) || held(KeyCode::ArrowUp),
            back: held(KeyCode::KeyS) || held(KeyCode::ArrowDown),
            left: held(KeyCode::KeyA) || held(KeyCode::ArrowLeft),
            right: held(KeyCode::KeyD) || held(KeyCode::ArrowRight),
            up: held(KeyCode::Space),
            down: held(KeyCode::ControlLeft) || held(KeyCode::KeyC),
            sprint: held(KeyCode::ShiftLeft) || held(KeyCode::ShiftRight),
            toggle_wireframe: self.pressed.contains(&KeyCode::KeyF),
            quit: self.pressed.contains(&KeyCode::Escape),
            look_delta: (self.look_delta.0 as f32, self.look_delta.1 as f32),
        };
        self.pressed.clear();
        self.look_delta = (0.0, 0.0);
        snapshot
    }
}

fn is_bound(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::KeyW
            | KeyCode::KeyA
            | KeyCode::KeyS
            | KeyCode::KeyD
            | KeyCode::ArrowUp
            | KeyCode::ArrowDown
            | KeyCode::ArrowLeft
            | KeyCode::ArrowRight
            | KeyCode::Space
            | KeyCode::ControlLeft
            | KeyCode::KeyC
            | KeyCode::ShiftLeft
            | KeyCode::ShiftRight
            | KeyCode::KeyF
            | KeyCode::Escape
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_persist_across_snapshots() {
        let mut input = InputCollector::new();
        input.key_event(KeyCode::KeyW, ElementState::Pressed, false);

        assert!(input.snapshot().forward);
        assert!(input.snapshot().forward);

        input.key_event(KeyCode::KeyW, ElementState::Released, false);
        assert!(!input.snapshot().forward);
    }

    #[test]
    fn test_toggle_is_edge_triggered() {
        let mut input = InputCollector::new();
        input.key_event(KeyCode::KeyF, ElementState::Pressed, false);
        input.key_event(KeyCode::KeyF, ElementState::Pressed, true);

        assert!(input.snapshot().toggle_wireframe);
        // Still held, but no new press.
        assert!(!input.snapshot().toggle_wireframe);

        input.key_event(KeyCode::KeyF, ElementState::Released, false);
        input.key_event(KeyCode::KeyF, ElementState::Pressed, false);
        assert!(input.snapshot().toggle_wireframe);
    }

    #[test]
    fn test_look_delta_accumulates_and_resets() {
        let mut input = InputCollector::new();
        input.mouse_motion(3.0, -1.0);
        input.mouse_motion(2.0, 4.0);

        assert_eq!(input.snapshot().look_delta, (5.0, 3.0));
        assert_eq!(input.snapshot().look_delta, (0.0, 0.0));
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        let mut input = InputCollector::new();
        assert!(!input.key_event(KeyCode::KeyQ, ElementState::Pressed, false));
        assert_eq!(input.snapshot(), InputSnapshot::default());
    }
}
