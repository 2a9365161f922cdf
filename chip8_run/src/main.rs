#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;

use anyhow::Context;
use chip8::Chip8;
use clap::Parser;

use crate::settings::Settings;

mod runner;
mod settings;

/// Run a Chip8 ROM without a window and print the final frame.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// ROM file to load at 0x200.
    rom: PathBuf,

    /// YAML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of cycles to run.
    #[arg(short = 'n', long)]
    cycles: Option<u64>,

    /// Seed for the random number generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Hold down a key (0 to F) for the whole run. May be repeated.
    #[arg(short, long = "press", value_parser = parse_key)]
    press: Vec<u8>,
}

impl Args {
    /// Combine the settings file, if any, with the command line overrides.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(cycles) = self.cycles {
            settings.cycles = cycles;
        }
        if let Some(seed) = self.seed {
            settings.machine.rng_seed = Some(seed);
        }
        settings.pressed.extend(&self.press);
        Ok(settings)
    }
}

/// Parse a keypad key written as a hex digit, with or without `0x`.
fn parse_key(text: &str) -> Result<u8, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    match u8::from_str_radix(digits, 16) {
        Ok(key) if key < 0x10 => Ok(key),
        _ => Err(format!("`{text}` is not a keypad key (0 to F)")),
    }
}

fn main() -> anyhow::Result<()> {
    // Log to stdout (if you run with `RUST_LOG=debug`).
    use env_logger::{Builder, Target};
    let mut builder = Builder::from_default_env();

    builder.target(Target::Stdout);
    builder.init();

    let args = Args::parse();
    let settings = args.settings()?;

    let mut chip = Chip8::open(&args.rom, settings.machine).context("Failed to create Chip8")?;
    for &key in &settings.pressed {
        chip.update_key_state(key, true);
    }

    let report = runner::run(&mut chip, settings.cycles);
    print!("{}", chip.display());
    log::info!(
        "Ran {} cycles: {} redraws, {} sound cycles, {} key waits, {} unknown opcodes",
        report.cycles,
        report.redraws,
        report.sound_cycles,
        report.key_waits,
        report.unknown_opcodes
    );

    match report.fault {
        Some(fault) => Err(anyhow::Error::new(fault).context(format!(
            "{} halted after {} cycles",
            args.rom.display(),
            report.cycles
        ))),
        None => Ok(()),
    }
}
