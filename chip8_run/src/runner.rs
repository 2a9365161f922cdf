//! The headless run loop: steps the machine and tallies what the host would
//! have had to do.

use chip8::{error::Fault, processor::Outcome, Chip8};

/// Summary of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Cycles that completed.
    pub cycles: u64,
    /// Cycles that asked for the display to be presented.
    pub redraws: u64,
    /// Cycles that asked for a tone.
    pub sound_cycles: u64,
    /// Cycles spent waiting in `Fx0A`.
    pub key_waits: u64,
    /// Opcodes that were skipped as unknown.
    pub unknown_opcodes: u64,
    /// The fault that stopped the run early, if any.
    pub fault: Option<Fault>,
}

/// Steps `chip` up to `cycles` times, stopping at the first fault.
pub fn run(chip: &mut Chip8, cycles: u64) -> Report {
    let mut report = Report::default();
    let mut beeping = false;

    for _ in 0..cycles {
        let cycle = match chip.step() {
            Ok(cycle) => cycle,
            Err(fault) => {
                report.fault = Some(fault);
                break;
            }
        };
        report.cycles += 1;

        if cycle.redraw {
            report.redraws += 1;
        }
        if cycle.sound {
            report.sound_cycles += 1;
            if !beeping {
                log::info!("BEEP");
            }
        }
        beeping = cycle.sound;

        match cycle.outcome {
            Outcome::AwaitingKey => report.key_waits += 1,
            Outcome::UnknownOpcode(_) => report.unknown_opcodes += 1,
            Outcome::Executed(_) => {}
        }
    }
    report
}
