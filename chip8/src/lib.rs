//! An interpreter for the Chip8 virtual machine.
//!
//! A [`Chip8`] owns every piece of machine state: the [`processor::Cpu`]
//! registers and call stack, plus the memory, timers, display and keypad on
//! its [`Bus`]. The host drives it by calling [`Chip8::step`] once per cycle
//! and, between cycles, reads the display and writes the keypad snapshot.

use crate::{
    config::Config,
    error::{Chip8Error, Fault, LoadError},
    processor::{Cpu, Cycle},
    rom::Rom,
};

pub mod clock;
pub mod config;
pub mod error;
pub mod graphics;
pub mod input;
pub mod instruction;
pub mod memory;
pub mod processor;
pub mod rom;
pub mod stack;

/// The [`Bus`] struct contains fields for the components of the machine
/// that the processor reads and writes.
#[derive(Default)]
pub struct Bus {
    /// An instance of the [`clock::Clock`] struct, which holds the delay and
    /// sound timers.
    pub clock: clock::Clock,

    /// An instance of the [`graphics::Buffer`] struct, which represents the
    /// display buffer of the computer. The host presents it whenever a cycle
    /// requests a redraw.
    pub graphics: graphics::Buffer,

    /// An instance of the [`input::Input`] struct, which holds the keypad
    /// snapshot written by the host.
    pub input: input::Input,

    /// An instance of the [`memory::Memory`] struct, which represents the
    /// memory of the computer. This is used to store the instructions and
    /// data that the processor needs to execute.
    pub memory: memory::Memory,
}

/// The [`Chip8`] struct represents a computer system that uses the Chip-8 virtual machine.
pub struct Chip8 {
    /// An instance of the [`Cpu`] struct, which represents the CPU of
    /// the system. This is responsible for executing the instructions in
    /// memory.
    pub processor: Cpu,

    /// An instance of the [`Bus`] struct, which represents the different
    /// components of the system.
    pub bus: Bus,

    config: Config,

    /// Set once a cycle faults. The machine refuses to run until reset.
    halted: Option<Fault>,
}

impl Chip8 {
    /// Creates a new [`Chip8`] with the default [`Config`], seeding the
    /// random number generator from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::Entropy`] if no seed could be obtained.
    pub fn new() -> Result<Self, Chip8Error> {
        Self::with_config(Config::default())
    }

    /// Creates a new [`Chip8`] with the font loaded, all registers, timers
    /// and the stack zeroed and the program counter at `0x200`.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::Entropy`] if `config` has no seed and none
    /// could be obtained from the operating system.
    pub fn with_config(config: Config) -> Result<Self, Chip8Error> {
        Ok(Self {
            processor: Cpu::new(config.sprite_edge, config.rng_seed)?,
            bus: Bus::default(),
            config,
            halted: None,
        })
    }

    /// Creates a new [`Chip8`] and loads the ROM file at `path`, ready to
    /// run from `0x200`.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::Load`] if the file cannot be read or is not a
    /// valid ROM, and [`Chip8Error::Entropy`] as for [`Chip8::with_config`].
    pub fn open(path: impl AsRef<std::path::Path>, config: Config) -> Result<Self, Chip8Error> {
        let rom = Rom::read(path)?;
        let mut chip = Self::with_config(config)?;
        chip.load_rom(&rom);
        Ok(chip)
    }

    /// Executes one instruction cycle: fetch, decode, execute and a timer
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] that halted the machine. Once halted, every
    /// call returns the same fault without executing anything until
    /// [`Chip8::reset`] is called.
    pub fn step(&mut self) -> Result<Cycle, Fault> {
        if let Some(fault) = self.halted {
            return Err(fault);
        }

        self.processor.cycle(&mut self.bus).map_err(|fault| {
            log::error!("Chip8 halted: {fault}");
            self.halted = Some(fault);
            fault
        })
    }

    /// Loads a validated ROM into program memory at `0x200`.
    pub fn load_rom(&mut self, rom: &Rom) {
        log::debug!("Loading {} byte ROM", rom.len());
        self.bus.memory.load_rom(rom);
    }

    /// Validates the given ROM bytes and loads them into program memory.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the data is empty or does not fit. Memory
    /// is left untouched in that case.
    pub fn load_rom_data(&mut self, data: Vec<u8>) -> Result<(), LoadError> {
        let rom = Rom::from_bytes(data)?;
        self.load_rom(&rom);
        Ok(())
    }

    /// Updates the state of a key on the keypad.
    ///
    /// # Arguments
    ///
    /// * `key_code`: A [`u8`] representing the key code of the pressed or released key.
    /// * `pressed`: A boolean indicating whether the key is pressed ([`true`]) or released ([`false`]).
    pub fn update_key_state(&mut self, key_code: u8, pressed: bool) {
        self.bus.input.update(key_code, pressed);
    }

    /// Replaces the keypad snapshot with the host's current view of all
    /// 16 keys.
    pub fn set_keypad(&mut self, state: [bool; input::KEY_COUNT]) {
        self.bus.input.set_snapshot(state);
    }

    /// Returns the machine to its power-on state: memory holds only the
    /// font, the display is blank and the registers, timers and stack are
    /// zeroed. The keypad snapshot belongs to the host and is kept.
    pub fn reset(&mut self) {
        log::debug!("Resetting Chip8");
        self.bus = Bus {
            input: self.bus.input,
            ..Default::default()
        };
        self.processor.reset();
        self.halted = None;
    }

    /// Resets the machine and loads the given ROM, ready to run from
    /// `0x200`.
    pub fn reset_and_load(&mut self, rom: &Rom) {
        self.reset();
        self.load_rom(rom);
    }

    /// The display buffer, for the host to present.
    #[must_use]
    pub fn display(&self) -> &graphics::Buffer {
        &self.bus.graphics
    }

    /// The fault that halted the machine, if any.
    #[must_use]
    pub fn halted(&self) -> Option<Fault> {
        self.halted
    }

    /// The configuration this machine was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
