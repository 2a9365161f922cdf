//! Settings for a headless run, read from an optional YAML file and then
//! overridden from the command line.

use std::path::Path;

use anyhow::Context;
use chip8::{config::Config, input::KEY_COUNT};
use serde::{Deserialize, Serialize};

/// Number of cycles to run when neither the settings file nor the command
/// line say otherwise.
pub const DEFAULT_CYCLES: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)] // missing keys fall back to their defaults
pub struct Settings {
    /// Configuration for the machine itself.
    pub machine: Config,

    /// How many cycles to run before printing the display.
    pub cycles: u64,

    /// Keys held down for the whole run.
    pub pressed: Vec<u8>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            machine: Config::default(),
            cycles: DEFAULT_CYCLES,
            pressed: Vec::new(),
        }
    }
}

impl Settings {
    /// Load [`Settings`] from the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Parse and validate [`Settings`] from YAML text.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let settings: Self = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every held key exists on the keypad.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(key) = self.pressed.iter().find(|&&key| usize::from(key) >= KEY_COUNT) {
            anyhow::bail!("Key {key:#X} is not on the keypad (0x0 to 0xF)");
        }
        Ok(())
    }
}
