//! The `memory` module provides a struct and some associated functions to
//! represent the memory of a Chip8 system. The memory is represented as an
//! array of 8-bit unsigned integers ([`u8`]), with a size of 4096 bytes.

use std::ops::Index;

use crate::rom::Rom;

/// The total size of the Chip8 memory.
pub const MEMORY_SIZE: usize = 4096;

/// The size of the interpreter. This is used to determine where the program memory should start.
pub const INTERPRETER_SIZE: usize = 512;

/// The largest program that fits in memory after the interpreter area.
pub const PROGRAM_SIZE: usize = MEMORY_SIZE - INTERPRETER_SIZE;

/// Number of bytes in a single font glyph.
pub const GLYPH_SIZE: usize = 5;

/// Built-in Chip8 font data. This is stored in the interpreter's memory.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The [`Memory`] struct represents the memory of a Chip8 system. Reads and
/// writes go through checked accessors that refuse addresses past `0xFFF`.
pub struct Memory {
    memory: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..FONT.len()].copy_from_slice(&FONT);
        Self { memory }
    }
}

impl Index<usize> for Memory {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.memory[index]
    }
}

impl Memory {
    /// Creates a new [`Memory`] with the font loaded and everything else zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the byte at `address`, or `None` if it is outside of memory.
    #[must_use]
    pub fn read(&self, address: usize) -> Option<u8> {
        self.memory.get(address).copied()
    }

    /// Reads the big-endian opcode starting at `address`.
    #[must_use]
    pub fn read_opcode(&self, address: usize) -> Option<u16> {
        let high = self.read(address)?;
        let low = self.read(address.checked_add(1)?)?;
        Some(u16::from_be_bytes([high, low]))
    }

    /// Returns `len` bytes starting at `address`, or `None` if any of them
    /// lie outside of memory.
    #[must_use]
    pub fn slice(&self, address: usize, len: usize) -> Option<&[u8]> {
        self.memory.get(address..address.checked_add(len)?)
    }

    /// Mutable counterpart of [`Memory::slice`].
    pub fn slice_mut(&mut self, address: usize, len: usize) -> Option<&mut [u8]> {
        self.memory.get_mut(address..address.checked_add(len)?)
    }

    /// Writes the program at `0x200`. Any program space the ROM does not
    /// cover is zeroed so nothing from a previous program survives.
    pub fn load_rom(&mut self, rom: &Rom) {
        let program = &mut self.memory[INTERPRETER_SIZE..];
        let (loaded, rest) = program.split_at_mut(rom.len());
        loaded.copy_from_slice(rom.as_bytes());
        rest.fill(0);
    }

    /// The whole address space, for hosts that want to inspect it.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }
}
