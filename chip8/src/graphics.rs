//! This module provides a simple monochrome graphics buffer with a fixed resolution of 64x32 pixels.

use std::fmt;

use crate::config::SpriteEdge;

/// The height of the graphics buffer in pixels. This is a constant value
/// set to 32.
pub const HEIGHT: usize = 32;
/// The width of the graphics buffer in pixels. This is a constant value set
/// to 64.
pub const WIDTH: usize = 64;
/// The total number of pixels in the graphics buffer. This is calculated
/// as the product of [`WIDTH`] and [`HEIGHT`].
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// A set sprite pixel that would land outside the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffScreen {
    /// Column of the pixel.
    pub x: usize,
    /// Row of the pixel.
    pub y: usize,
}

/// A struct representing the graphics buffer. Each pixel is either on or
/// off. Sprites are drawn by XOR, and drawing keeps track of collisions
/// between active pixels.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Buffer {
    vram: [bool; PIXEL_COUNT],
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            vram: [false; PIXEL_COUNT],
        }
    }
}

impl Buffer {
    /// Creates a new [`Buffer`] with every pixel off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a sprite with its top-left corner at (`x`, `y`). Each byte of
    /// `sprite` is one row of 8 pixels, most significant bit leftmost.
    /// Returns whether any active pixel was switched off.
    ///
    /// # Errors
    ///
    /// Under [`SpriteEdge::Reject`], returns the first set pixel that falls
    /// outside the display. Nothing is drawn in that case.
    pub fn draw_sprite(
        &mut self,
        x: usize,
        y: usize,
        sprite: &[u8],
        edge: SpriteEdge,
    ) -> Result<bool, OffScreen> {
        let mut collision = false;
        match edge {
            SpriteEdge::Clip => {
                let (x, y) = (x % WIDTH, y % HEIGHT);
                for (row, &data) in sprite.iter().enumerate() {
                    collision |= self.draw_byte(x, y + row, data);
                }
            }
            SpriteEdge::Wrap => {
                for (row, &data) in sprite.iter().enumerate() {
                    for column in set_bits(data) {
                        collision |= self.flip((x + column) % WIDTH, (y + row) % HEIGHT);
                    }
                }
            }
            SpriteEdge::Reject => {
                if let Some(off) = Self::first_off_screen(x, y, sprite) {
                    return Err(off);
                }
                for (row, &data) in sprite.iter().enumerate() {
                    collision |= self.draw_byte(x, y + row, data);
                }
            }
        }
        Ok(collision)
    }

    /// Draws a byte (8 pixels) with the given position and data, dropping
    /// any pixels past the right or bottom edge. Returns a [`bool`]
    /// indicating whether any active pixels in the byte collided with active
    /// pixels already present in the buffer.
    pub fn draw_byte(&mut self, x: usize, y: usize, data: u8) -> bool {
        if y >= HEIGHT {
            return false;
        }

        let mut collision = false;
        for column in set_bits(data) {
            let x = x + column;
            if x < WIDTH {
                collision |= self.flip(x, y);
            }
        }
        collision
    }

    /// XORs a single pixel on, returning whether it was already on.
    fn flip(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.vram[WIDTH * y + x];
        let was_on = *pixel;
        *pixel = !was_on;
        was_on
    }

    fn first_off_screen(x: usize, y: usize, sprite: &[u8]) -> Option<OffScreen> {
        sprite.iter().enumerate().find_map(|(row, &data)| {
            set_bits(data)
                .map(|column| OffScreen {
                    x: x + column,
                    y: y + row,
                })
                .find(|off| off.x >= WIDTH || off.y >= HEIGHT)
        })
    }

    /// Returns whether the pixel at (`x`, `y`) is on. Coordinates outside
    /// the display read as off.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.vram[WIDTH * y + x]
    }

    /// Returns the graphics buffer as a flat, row-major slice of pixels.
    #[must_use]
    pub fn pixels(&self) -> &[bool; PIXEL_COUNT] {
        &self.vram
    }

    /// Iterates over the rows of the display, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.vram.chunks_exact(WIDTH)
    }

    /// Returns whether every pixel is off.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.vram.iter().all(|&pixel| !pixel)
    }

    /// Clears the graphics buffer by switching every pixel off.
    #[inline]
    pub fn clear(&mut self) {
        self.vram = [false; PIXEL_COUNT];
    }
}

/// Renders the display as text, `#` for on and `.` for off.
impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for &pixel in row {
                f.write_str(if pixel { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer(\n{self})")
    }
}

/// Yields the column of every set bit of a sprite row.
fn set_bits(data: u8) -> impl Iterator<Item = usize> {
    (0..8usize).filter(move |&column| data & (0x80u8 >> column) != 0)
}
