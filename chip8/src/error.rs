//! Errors surfaced by the [`super::Chip8`] machine.
//!
//! Problems are split by when they can happen. A [`LoadError`] is reported
//! before any cycle runs, a [`Fault`] halts a running machine, and
//! [`Chip8Error`] covers constructing the machine itself.

use std::{io, path::PathBuf};

/// Failure to produce a program image that fits in program memory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The ROM file could not be opened or read.
    #[error("failed to read ROM from {}: {source}", .path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The ROM contains no bytes at all.
    #[error("ROM is empty")]
    Empty,

    /// The ROM does not fit between `0x200` and the end of memory.
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    TooLarge {
        /// Size of the rejected ROM in bytes.
        size: usize,
        /// Space available for programs.
        max_size: usize,
    },
}

/// A fatal condition raised while executing a cycle.
///
/// Once a fault is returned from [`super::Chip8::step`] the machine stays
/// halted until it is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The next opcode would be fetched from outside of memory.
    #[error("program counter {pc:#06X} is outside of memory")]
    PcOutOfRange {
        /// Program counter at fetch time.
        pc: u16,
    },

    /// `2nnn` was executed with every stack slot in use.
    #[error("stack overflow calling {target:#06X} from {pc:#06X}")]
    StackOverflow {
        /// Address of the call instruction.
        pc: u16,
        /// Subroutine that could not be entered.
        target: u16,
    },

    /// `00EE` was executed with nothing on the stack.
    #[error("stack underflow returning from {pc:#06X}")]
    StackUnderflow {
        /// Address of the return instruction.
        pc: u16,
    },

    /// An instruction addressed memory past `0xFFF` through `I`.
    #[error("opcode {opcode:#06X} at {pc:#06X} addressed memory at {address:#06X}")]
    AddressOutOfRange {
        /// Address of the faulting instruction.
        pc: u16,
        /// The faulting opcode.
        opcode: u16,
        /// First address that fell outside of memory.
        address: usize,
    },

    /// A sprite pixel landed outside the display while sprites are rejected
    /// at the edges.
    #[error("sprite drawn at {pc:#06X} reaches ({x}, {y}), outside of the display")]
    SpriteOutOfBounds {
        /// Address of the draw instruction.
        pc: u16,
        /// Column of the first pixel outside the display.
        x: usize,
        /// Row of the first pixel outside the display.
        y: usize,
    },

    /// A key instruction named a key that is not on the keypad.
    #[error("opcode {opcode:#06X} at {pc:#06X} tested key {key:#04X}, which is not on the keypad")]
    InvalidKey {
        /// Address of the key instruction.
        pc: u16,
        /// The faulting opcode.
        opcode: u16,
        /// The key index held in `Vx`.
        key: u8,
    },
}

/// Errors from creating or loading a [`super::Chip8`].
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    /// The program image was rejected.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The random number generator could not be seeded by the OS.
    #[error("failed to seed the random number generator")]
    Entropy(#[from] rand::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_messages_name_addresses() {
        let fault = Fault::AddressOutOfRange {
            pc: 0x204,
            opcode: 0xF233,
            address: 0x1000,
        };
        assert_eq!(
            fault.to_string(),
            "opcode 0xF233 at 0x0204 addressed memory at 0x1000"
        );
    }

    #[test]
    fn test_load_error_wraps_into_chip8_error() {
        let err = Chip8Error::from(LoadError::TooLarge {
            size: 4000,
            max_size: 3584,
        });
        assert_eq!(
            err.to_string(),
            "ROM is too large (4000 bytes), max size is 3584 bytes"
        );
    }
}
