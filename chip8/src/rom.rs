//! Program images that have been checked to fit in program memory.

use std::path::Path;

use crate::{error::LoadError, memory::PROGRAM_SIZE};

/// A validated Chip8 program. Holding a [`Rom`] means it is non-empty and no
/// larger than the space between `0x200` and the end of memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Validates raw ROM bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Empty`] for an empty image and
    /// [`LoadError::TooLarge`] when it does not fit in program memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        if data.is_empty() {
            return Err(LoadError::Empty);
        }
        if data.len() > PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: data.len(),
                max_size: PROGRAM_SIZE,
            });
        }
        Ok(Self { data })
    }

    /// Reads and validates the ROM file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Rom::from_bytes`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read {} byte ROM from {}", data.len(), path.display());
        Self::from_bytes(data)
    }

    /// The raw program bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size of the program in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`; an empty [`Rom`] cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl TryFrom<Vec<u8>> for Rom {
    type Error = LoadError;

    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(data)
    }
}
