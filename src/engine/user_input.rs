//! Input handling (winit -> demo input).
//!
//! `Windowing` forwards raw window events here; demos read the resulting `InputState` once
//! per frame (orbit drag, wheel zoom, simulated viewer aim).

use std::collections::HashSet;

use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::Key;

/// Snapshot of user input for one frame.
///
/// - current key/button state (`down`)
/// - per-frame transitions (`pressed`/`released`)
/// - cursor position, cursor movement and wheel delta
#[derive(Default, Debug, Clone)]
pub struct InputState {
    pub keys_down: HashSet<Key>,
    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,

    pub mouse_down: HashSet<MouseButton>,
    pub mouse_pressed: HashSet<MouseButton>,
    pub mouse_released: HashSet<MouseButton>,

    /// Cursor position in physical pixels; `None` while outside the window.
    pub cursor_pos: Option<(f32, f32)>,
    prev_cursor_pos: Option<(f32, f32)>,
    mouse_movement: (f32, f32),

    /// Accumulated wheel delta (lines) since the last `begin_frame`.
    pub wheel_delta: (f32, f32),

    /// Window size in physical pixels.
    pub viewport: (u32, u32),
}

impl InputState {
    /// Clear per-frame transitions and latch the cursor delta.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.wheel_delta = (0.0, 0.0);

        self.mouse_movement = match (self.cursor_pos, self.prev_cursor_pos) {
            (Some((cx, cy)), Some((px, py))) => (cx - px, cy - py),
            _ => (0.0, 0.0),
        };
        self.prev_cursor_pos = self.cursor_pos;
    }

    #[inline]
    pub fn key_pressed(&self, key: &Key) -> bool {
        self.keys_pressed.contains(key)
    }

    #[inline]
    pub fn button_down(&self, button: MouseButton) -> bool {
        self.mouse_down.contains(&button)
    }

    #[inline]
    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Cursor movement (dx, dy) over the last frame, in pixels.
    #[inline]
    pub fn mouse_movement(&self) -> (f32, f32) {
        self.mouse_movement
    }

    /// Cursor in `[-1, 1]` on both axes, +y up. `None` without a cursor or a viewport.
    pub fn cursor_ndc(&self) -> Option<(f32, f32)> {
        let (x, y) = self.cursor_pos?;
        let (w, h) = self.viewport;
        if w == 0 || h == 0 {
            return None;
        }
        Some((
            x / w as f32 * 2.0 - 1.0,
            1.0 - y / h as f32 * 2.0,
        ))
    }
}

/// Stateful window-event processor.
#[derive(Default, Debug, Clone)]
pub struct UserInput {
    state: InputState,
}

impl UserInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn begin_frame(&mut self) {
        self.state.begin_frame();
    }

    /// Feed a winit event. Returns `true` if it was consumed as input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.press_key(event.logical_key.clone(), event.state == ElementState::Pressed);
                true
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.press_button(*button, *state == ElementState::Pressed);
                true
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor_pos = Some((position.x as f32, position.y as f32));
                true
            }

            WindowEvent::CursorLeft { .. } => {
                self.state.cursor_pos = None;
                self.state.prev_cursor_pos = None;
                true
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    // Roughly one line per 40px, like browsers.
                    MouseScrollDelta::PixelDelta(pos) => (pos.x as f32 / 40.0, pos.y as f32 / 40.0),
                };
                self.state.wheel_delta.0 += dx;
                self.state.wheel_delta.1 += dy;
                true
            }

            WindowEvent::Resized(size) => {
                self.state.viewport = (size.width, size.height);
                false
            }

            _ => false,
        }
    }

    fn press_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            if self.state.keys_down.insert(key.clone()) {
                self.state.keys_pressed.insert(key);
            }
        } else {
            self.state.keys_down.remove(&key);
            self.state.keys_released.insert(key);
        }
    }

    fn press_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.state.mouse_down.insert(button) {
                self.state.mouse_pressed.insert(button);
            }
        } else {
            self.state.mouse_down.remove(&button);
            self.state.mouse_released.insert(button);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_for_one_frame_only() {
        let mut input = UserInput::new();

        input.press_button(MouseButton::Left, true);
        assert!(input.state().button_pressed(MouseButton::Left));
        assert!(input.state().button_down(MouseButton::Left));

        // Held: no second press.
        input.begin_frame();
        input.press_button(MouseButton::Left, true);
        assert!(!input.state().button_pressed(MouseButton::Left));
        assert!(input.state().button_down(MouseButton::Left));

        input.press_button(MouseButton::Left, false);
        assert!(!input.state().button_down(MouseButton::Left));
    }

    #[test]
    fn held_key_is_not_pressed_again() {
        let mut input = UserInput::new();
        let s = Key::Character("s".into());

        input.press_key(s.clone(), true);
        assert!(input.state().key_pressed(&s));

        // Auto-repeat while held.
        input.begin_frame();
        input.press_key(s.clone(), true);
        assert!(!input.state().key_pressed(&s));

        input.press_key(s.clone(), false);
        input.begin_frame();
        input.press_key(s.clone(), true);
        assert!(input.state().key_pressed(&s));
    }

    #[test]
    fn movement_is_latched_at_frame_start() {
        let mut input = UserInput::new();
        input.state.cursor_pos = Some((10.0, 10.0));
        input.begin_frame();
        assert_eq!(input.state().mouse_movement(), (0.0, 0.0));

        input.state.cursor_pos = Some((14.0, 7.0));
        input.begin_frame();
        assert_eq!(input.state().mouse_movement(), (4.0, -3.0));
    }

    #[test]
    fn cursor_ndc_maps_corners() {
        let state = InputState {
            cursor_pos: Some((0.0, 0.0)),
            viewport: (800, 600),
            ..Default::default()
        };
        assert_eq!(state.cursor_ndc(), Some((-1.0, 1.0)));

        let center = InputState {
            cursor_pos: Some((400.0, 300.0)),
            ..state
        };
        assert_eq!(center.cursor_ndc(), Some((0.0, 0.0)));
        assert_eq!(InputState::default().cursor_ndc(), None);
    }
}
