/// Keyboard key identifier.
///
/// Only the keys the runtime reacts to are named; everything else maps to
/// `Key::Unknown` carrying the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,

    /// Platform-dependent key not represented here.
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, state: KeyState },
    Focused(bool),
}
