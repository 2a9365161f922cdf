//! This module provides the input system for the Chip8 emulator. It keeps
//! track of the state of all 16 keys as last reported by the host.

/// Number of keys on the keypad.
pub const KEY_COUNT: usize = 16;

/// Input system for the [`super::Chip8`]. Holds the most recent snapshot of
/// the keypad. Only the host writes it; the processor only reads it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    /// The current state of all 16 keys.
    state: [bool; KEY_COUNT],
}

impl Input {
    /// Creates a new [`Input`] instance with every key released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the input state of the given key code. Key codes past `0xF`
    /// are ignored.
    ///
    /// # Arguments
    ///
    /// * `key_code`: The key code of the key that was pressed or released.
    /// * `pressed`: A boolean indicating whether the key was pressed (true)
    ///              or released (false).
    pub fn update(&mut self, key_code: u8, pressed: bool) {
        match self.state.get_mut(usize::from(key_code)) {
            Some(key) => *key = pressed,
            None => log::warn!("Ignoring update for unknown key {key_code:#X}"),
        }
    }

    /// Replaces the whole keypad snapshot.
    pub fn set_snapshot(&mut self, state: [bool; KEY_COUNT]) {
        self.state = state;
    }

    /// Returns whether the given key is currently pressed, or `None` if the
    /// key code is not on the keypad.
    #[must_use]
    pub fn is_key_pressed(&self, key_code: u8) -> Option<bool> {
        self.state.get(usize::from(key_code)).copied()
    }

    /// The lowest key code that is currently pressed.
    #[must_use]
    pub fn first_pressed(&self) -> Option<u8> {
        self.state
            .iter()
            .position(|&pressed| pressed)
            .and_then(|key| u8::try_from(key).ok())
    }

    /// The current keypad snapshot.
    #[must_use]
    pub fn snapshot(&self) -> [bool; KEY_COUNT] {
        self.state
    }
}
