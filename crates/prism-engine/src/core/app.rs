use crate::input::{InputState, Key};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Render loop lifecycle.
///
/// `Closing` is terminal: once requested, the loop exits at the next check.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum LoopState {
    #[default]
    Running,
    Closing,
}

impl LoopState {
    pub fn request_close(&mut self) {
        *self = LoopState::Closing;
    }

    pub fn is_closing(self) -> bool {
        self == LoopState::Closing
    }

    /// Exit-key check run once per iteration, before anything is drawn.
    pub fn check_input(&mut self, input: &InputState) {
        if input.key_down(Key::Escape) {
            self.request_close();
        }
    }
}

/// Drawing side of the render loop; the runtime owns everything else.
pub trait App {
    /// Called once per iteration that is still running.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, KeyState};

    fn press(state: &mut InputState, key: Key) {
        state.apply_event(InputEvent::Key {
            key,
            state: KeyState::Pressed,
        });
    }

    #[test]
    fn escape_closes_in_the_same_iteration() {
        let mut input = InputState::default();
        let mut state = LoopState::default();

        state.check_input(&input);
        assert_eq!(state, LoopState::Running);

        press(&mut input, Key::Escape);
        state.check_input(&input);
        assert!(state.is_closing());
    }

    #[test]
    fn other_keys_keep_running() {
        let mut input = InputState::default();
        let mut state = LoopState::Running;

        press(&mut input, Key::Unknown(42));
        state.check_input(&input);
        assert_eq!(state, LoopState::Running);
    }

    #[test]
    fn closing_is_terminal() {
        let mut state = LoopState::Running;
        state.request_close();
        state.check_input(&InputState::default());
        assert!(state.is_closing());
    }
}
