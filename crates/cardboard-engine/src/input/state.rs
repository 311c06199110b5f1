use std::collections::HashSet;

use super::types::{
    ElementState,
    InputEvent,
    Key,
    MouseButton,
    PointerButtonEvent,
    PointerMoveEvent,
    TouchPhase,
};

/// Current input state for the window.
///
/// Holds "is down" information and the current pointer position.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in physical pixels. Touches update it too.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // On focus loss, clear "down" sets so nothing sticks.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Touch { phase, x, y, .. } => match phase {
                TouchPhase::Started | TouchPhase::Moved => self.pointer_pos = Some((*x, *y)),
                TouchPhase::Ended | TouchPhase::Cancelled => {}
            },

            InputEvent::Key { key, state, .. } => match state {
                ElementState::Pressed => {
                    self.keys_down.insert(*key);
                }
                ElementState::Released => {
                    self.keys_down.remove(key);
                }
            },

            InputEvent::PointerButton(PointerButtonEvent { button, state, x, y }) => {
                self.pointer_pos = Some((*x, *y));
                match state {
                    ElementState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    ElementState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}
