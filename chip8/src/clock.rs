//! This module provides the sound and delay timers of a Chip8 machine. The
//! [`Clock`] struct keeps track of both countdown values, which are ticked
//! once per emulated cycle.

/// Handles the updating of the [`super::Chip8`] sound and delay timers. Each
/// timer is decremented by `1` per cycle until it reaches `0`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    /// The current value of the delay timer.
    pub delay_timer: u8,
    /// The current value of the sound timer.
    pub sound_timer: u8,
}

impl Clock {
    /// Create a new `Clock` with both timers stopped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts both timers down by one. Returns whether the sound timer was
    /// still running, which means the host should be producing audio for
    /// this cycle.
    pub fn tick(&mut self) -> bool {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            true
        } else {
            false
        }
    }
}
