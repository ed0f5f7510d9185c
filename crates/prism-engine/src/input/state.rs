use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Which keys are held right now, as seen by the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,
    pub keys_down: HashSet<Key>,
}

impl InputState {
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                // Releases that happen while unfocused are never delivered.
                if !f {
                    self.keys_down.clear();
                }
            }
            InputEvent::Key {
                key,
                state: KeyState::Pressed,
            } => {
                self.keys_down.insert(key);
            }
            InputEvent::Key {
                key,
                state: KeyState::Released,
            } => {
                self.keys_down.remove(&key);
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}
