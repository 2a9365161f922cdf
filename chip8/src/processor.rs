//! This module contains the implementation of the Chip8 central processing
//! unit (CPU). The CPU executes the instructions stored in the memory of the
//! Chip8 computer.

use rand::{
    rngs::{OsRng, StdRng},
    Rng, SeedableRng,
};

use crate::{
    config::SpriteEdge,
    error::Fault,
    instruction::Instruction,
    memory::{GLYPH_SIZE, MEMORY_SIZE},
    stack::Stack,
};

use super::Bus;

/// The starting address for the [`Cpu`], which is also where programs are
/// loaded.
pub const STARTING_PC: u16 = 0x200;

/// Index of the flags register `VF`.
const FLAG: usize = 0xF;

/// Describes how the program counter should be updated after
/// executing an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgramCounterUpdate {
    /// Go directly to the next instruction (pc + 2)
    Next,

    /// Skip the next instruction (pc + 4).
    SkipNext,

    /// Jump to the given address.
    Jump(u16),

    /// Leave the program counter alone so the same instruction runs again.
    Stay,
}

impl ProgramCounterUpdate {
    fn skip_if(condition: bool) -> Self {
        if condition {
            Self::SkipNext
        } else {
            Self::Next
        }
    }
}

/// What a single cycle did with the instruction it fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instruction ran to completion.
    Executed(Instruction),

    /// `Fx0A` found no key pressed. The program counter still points at it
    /// so it is retried on the next cycle.
    AwaitingKey,

    /// The opcode matched no instruction. Nothing changed except the
    /// program counter, which moved past it.
    UnknownOpcode(u16),
}

/// The result of one fetch, decode, execute and timer cycle.
///
/// Both flags are computed fresh on every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    /// What happened to the fetched instruction.
    pub outcome: Outcome,

    /// A sprite was drawn, so the display should be presented again.
    pub redraw: bool,

    /// The sound timer was running, so the host should play a tone for
    /// this cycle.
    pub sound: bool,
}

/// This struct represents the central processing unit of a computer.
#[derive(Debug)]
pub struct Cpu {
    /// An array of 16 unsigned 8-bit integers representing the Vx registers.
    pub v: [u8; 16],

    /// The index register.
    pub i: u16,

    /// The program counter, pointing at the next opcode to fetch.
    pub pc: u16,

    /// Return addresses of the subroutines currently being executed.
    pub stack: Stack,

    /// Edge handling used by `Dxyn`.
    sprite_edge: SpriteEdge,

    /// Source of `Cxnn` random numbers.
    rng: StdRng,
}

impl Cpu {
    /// Create a new [`Cpu`] instance with zeroed registers and the program
    /// counter at `STARTING_PC`. Without a `seed` the random number
    /// generator is seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns the [`rand::Error`] raised when the operating system has no
    /// entropy to give.
    pub fn new(sprite_edge: SpriteEdge, seed: Option<u64>) -> Result<Self, rand::Error> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(OsRng)?,
        };
        Ok(Self {
            v: [0; 16],
            i: 0,
            pc: STARTING_PC,
            stack: Stack::new(),
            sprite_edge,
            rng,
        })
    }

    /// Returns the registers and stack to their power-on state. The random
    /// number generator carries on from where it was.
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = STARTING_PC;
        self.stack = Stack::new();
    }

    /// Execute one processor cycle. This will fetch, decode, and execute the
    /// next opcode from memory, then tick the timers.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] if the instruction could not be carried out. The
    /// timers are not ticked in that case.
    pub fn cycle(&mut self, bus: &mut Bus) -> Result<Cycle, Fault> {
        let opcode = bus
            .memory
            .read_opcode(usize::from(self.pc))
            .ok_or(Fault::PcOutOfRange { pc: self.pc })?;

        let (outcome, pc_update) = match Instruction::decode(opcode) {
            Some(instruction) => {
                log::trace!("{:#06X}: {opcode:04X} {instruction}", self.pc);
                let pc_update = self.execute(instruction, opcode, bus)?;
                let outcome = if pc_update == ProgramCounterUpdate::Stay {
                    Outcome::AwaitingKey
                } else {
                    Outcome::Executed(instruction)
                };
                (outcome, pc_update)
            }
            None => {
                log::warn!("Unknown opcode {opcode:#06X} at {:#06X}", self.pc);
                (Outcome::UnknownOpcode(opcode), ProgramCounterUpdate::Next)
            }
        };

        match pc_update {
            ProgramCounterUpdate::Next => self.pc = self.pc.wrapping_add(2),
            ProgramCounterUpdate::SkipNext => self.pc = self.pc.wrapping_add(4),
            ProgramCounterUpdate::Jump(addr) => self.pc = addr,
            ProgramCounterUpdate::Stay => {}
        }

        let redraw = matches!(outcome, Outcome::Executed(Instruction::Draw { .. }));
        let sound = bus.clock.tick();

        Ok(Cycle {
            outcome,
            redraw,
            sound,
        })
    }

    /// Apply the state changing effects of a single instruction onto the
    /// registers and the given [`Bus`].
    fn execute(
        &mut self,
        instruction: Instruction,
        opcode: u16,
        bus: &mut Bus,
    ) -> Result<ProgramCounterUpdate, Fault> {
        use Instruction as I;

        let update = match instruction {
            I::Cls => Self::op_00e0(bus),
            I::Ret => self.op_00ee()?,
            I::Jump { nnn } => ProgramCounterUpdate::Jump(nnn),
            I::Call { nnn } => self.op_2nnn(nnn)?,
            I::SkipEqImm { x, nn } => ProgramCounterUpdate::skip_if(self.v[x] == nn),
            I::SkipNeImm { x, nn } => ProgramCounterUpdate::skip_if(self.v[x] != nn),
            I::SkipEqReg { x, y } => ProgramCounterUpdate::skip_if(self.v[x] == self.v[y]),
            I::LoadImm { x, nn } => {
                self.v[x] = nn;
                ProgramCounterUpdate::Next
            }
            I::AddImm { x, nn } => {
                self.v[x] = self.v[x].wrapping_add(nn);
                ProgramCounterUpdate::Next
            }
            I::Move { x, y } => {
                self.v[x] = self.v[y];
                ProgramCounterUpdate::Next
            }
            I::Or { x, y } => {
                self.v[x] |= self.v[y];
                ProgramCounterUpdate::Next
            }
            I::And { x, y } => {
                self.v[x] &= self.v[y];
                ProgramCounterUpdate::Next
            }
            I::Xor { x, y } => {
                self.v[x] ^= self.v[y];
                ProgramCounterUpdate::Next
            }
            I::Add { x, y } => self.op_8xy4(x, y),
            I::Sub { x, y } => self.op_8xy5(x, y),
            I::Shr { x, .. } => self.op_8xy6(x),
            I::SubN { x, y } => self.op_8xy7(x, y),
            I::Shl { x, .. } => self.op_8xye(x),
            I::SkipNeReg { x, y } => ProgramCounterUpdate::skip_if(self.v[x] != self.v[y]),
            I::LoadI { nnn } => {
                self.i = nnn;
                ProgramCounterUpdate::Next
            }
            I::JumpV0 { nnn } => ProgramCounterUpdate::Jump(nnn + u16::from(self.v[0])),
            I::Random { x, nn } => {
                self.v[x] = self.rng.gen::<u8>() & nn;
                ProgramCounterUpdate::Next
            }
            I::Draw { x, y, n } => self.op_dxyn(bus, opcode, x, y, n)?,
            I::SkipKey { x } => {
                let pressed = self.key_state(bus, opcode, x)?;
                ProgramCounterUpdate::skip_if(pressed)
            }
            I::SkipNotKey { x } => {
                let pressed = self.key_state(bus, opcode, x)?;
                ProgramCounterUpdate::skip_if(!pressed)
            }
            I::LoadDelay { x } => {
                self.v[x] = bus.clock.delay_timer;
                ProgramCounterUpdate::Next
            }
            I::WaitKey { x } => self.op_fx0a(bus, x),
            I::SetDelay { x } => {
                bus.clock.delay_timer = self.v[x];
                ProgramCounterUpdate::Next
            }
            I::SetSound { x } => {
                bus.clock.sound_timer = self.v[x];
                ProgramCounterUpdate::Next
            }
            I::AddI { x } => {
                self.i = self.i.wrapping_add(u16::from(self.v[x]));
                ProgramCounterUpdate::Next
            }
            I::LoadFont { x } => {
                self.i = u16::from(self.v[x]) * GLYPH_SIZE as u16;
                ProgramCounterUpdate::Next
            }
            I::StoreBcd { x } => self.op_fx33(bus, opcode, x)?,
            I::StoreRegs { x } => self.op_fx55(bus, opcode, x)?,
            I::LoadRegs { x } => self.op_fx65(bus, opcode, x)?,
        };
        Ok(update)
    }

    fn op_00e0(bus: &mut Bus) -> ProgramCounterUpdate {
        bus.graphics.clear();
        ProgramCounterUpdate::Next
    }

    fn op_00ee(&mut self) -> Result<ProgramCounterUpdate, Fault> {
        let call_site = self
            .stack
            .pop()
            .map_err(|_| Fault::StackUnderflow { pc: self.pc })?;
        // The stack holds the address of the call itself.
        Ok(ProgramCounterUpdate::Jump(call_site.wrapping_add(2)))
    }

    fn op_2nnn(&mut self, nnn: u16) -> Result<ProgramCounterUpdate, Fault> {
        self.stack.push(self.pc).map_err(|_| Fault::StackOverflow {
            pc: self.pc,
            target: nnn,
        })?;
        Ok(ProgramCounterUpdate::Jump(nnn))
    }

    // VF is written before Vx in the arithmetic ops below, so when x or y is
    // 0xF the flag takes part in the result.

    fn op_8xy4(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        let carry = u16::from(self.v[x]) + u16::from(self.v[y]) > 0xFF;
        self.v[FLAG] = u8::from(carry);
        self.v[x] = self.v[x].wrapping_add(self.v[y]);
        ProgramCounterUpdate::Next
    }

    fn op_8xy5(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        self.v[FLAG] = u8::from(self.v[x] > self.v[y]);
        self.v[x] = self.v[x].wrapping_sub(self.v[y]);
        ProgramCounterUpdate::Next
    }

    fn op_8xy6(&mut self, x: usize) -> ProgramCounterUpdate {
        self.v[FLAG] = self.v[x] & 1;
        self.v[x] >>= 1;
        ProgramCounterUpdate::Next
    }

    fn op_8xy7(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        self.v[FLAG] = u8::from(self.v[y] > self.v[x]);
        self.v[x] = self.v[y].wrapping_sub(self.v[x]);
        ProgramCounterUpdate::Next
    }

    fn op_8xye(&mut self, x: usize) -> ProgramCounterUpdate {
        self.v[FLAG] = (self.v[x] >> 7) & 1;
        self.v[x] <<= 1;
        ProgramCounterUpdate::Next
    }

    fn op_dxyn(
        &mut self,
        bus: &mut Bus,
        opcode: u16,
        x: usize,
        y: usize,
        n: u8,
    ) -> Result<ProgramCounterUpdate, Fault> {
        // A zero height sprite reads nothing, wherever I points.
        let sprite: &[u8] = match n {
            0 => &[],
            _ => bus
                .memory
                .slice(usize::from(self.i), usize::from(n))
                .ok_or_else(|| self.address_fault(opcode))?,
        };

        let collision = bus
            .graphics
            .draw_sprite(
                usize::from(self.v[x]),
                usize::from(self.v[y]),
                sprite,
                self.sprite_edge,
            )
            .map_err(|off| Fault::SpriteOutOfBounds {
                pc: self.pc,
                x: off.x,
                y: off.y,
            })?;

        self.v[FLAG] = u8::from(collision);
        Ok(ProgramCounterUpdate::Next)
    }

    fn key_state(&self, bus: &Bus, opcode: u16, x: usize) -> Result<bool, Fault> {
        let key = self.v[x];
        bus.input.is_key_pressed(key).ok_or(Fault::InvalidKey {
            pc: self.pc,
            opcode,
            key,
        })
    }

    fn op_fx0a(&mut self, bus: &Bus, x: usize) -> ProgramCounterUpdate {
        match bus.input.first_pressed() {
            Some(key) => {
                self.v[x] = key;
                ProgramCounterUpdate::Next
            }
            None => ProgramCounterUpdate::Stay,
        }
    }

    fn op_fx33(&mut self, bus: &mut Bus, opcode: u16, x: usize) -> Result<ProgramCounterUpdate, Fault> {
        let value = self.v[x];
        let digits = bus
            .memory
            .slice_mut(usize::from(self.i), 3)
            .ok_or_else(|| self.address_fault(opcode))?;
        digits.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx55(&mut self, bus: &mut Bus, opcode: u16, x: usize) -> Result<ProgramCounterUpdate, Fault> {
        let dest = bus
            .memory
            .slice_mut(usize::from(self.i), x + 1)
            .ok_or_else(|| self.address_fault(opcode))?;
        dest.copy_from_slice(&self.v[..=x]);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx65(&mut self, bus: &Bus, opcode: u16, x: usize) -> Result<ProgramCounterUpdate, Fault> {
        let src = bus
            .memory
            .slice(usize::from(self.i), x + 1)
            .ok_or_else(|| self.address_fault(opcode))?;
        self.v[..=x].copy_from_slice(src);
        Ok(ProgramCounterUpdate::Next)
    }

    /// Fault for an `I` relative access that ran past the end of memory.
    fn address_fault(&self, opcode: u16) -> Fault {
        Fault::AddressOutOfRange {
            pc: self.pc,
            opcode,
            address: usize::from(self.i).max(MEMORY_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, graphics, Chip8};

    fn setup(rom: &[u8]) -> Chip8 {
        setup_with(rom, Config::default())
    }

    fn setup_with(rom: &[u8], config: Config) -> Chip8 {
        let mut chip = Chip8::with_config(config.with_seed(310_349_960_114)).unwrap();
        chip.load_rom_data(rom.to_vec()).unwrap();
        chip
    }

    fn run(chip: &mut Chip8, cycles: usize) -> Cycle {
        let mut last = None;
        for _ in 0..cycles {
            last = Some(chip.step().unwrap());
        }
        last.unwrap()
    }

    fn assert_regs(chip: &Chip8, non_zero_regs: &[(usize, u8)]) {
        for reg in 0..16 {
            let expected = non_zero_regs
                .iter()
                .find(|v| v.0 == reg)
                .map_or(0, |v| v.1);
            assert_eq!(
                chip.processor.v[reg], expected,
                "Expected register V{reg:X} to contain {expected:#04X}"
            );
        }
    }

    #[test]
    fn test_load_then_skip_equal() {
        for (x, nn) in [(0x0, 0x00), (0x3, 0x7F), (0xE, 0xFF)] {
            let set = 0x6000 | (x << 8) | nn;
            let skip = 0x3000 | (x << 8) | nn;
            let rom = [(set >> 8) as u8, set as u8, (skip >> 8) as u8, skip as u8];
            let mut chip = setup(&rom);

            run(&mut chip, 2);
            assert_eq!(chip.processor.pc, 0x200 + 6);
        }
    }

    #[test]
    fn test_skip_not_taken() {
        let mut chip = setup(&[0x61, 0x05, 0x31, 0x06, 0x41, 0x05, 0x51, 0x00]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.pc, 0x206);
    }

    #[test]
    fn test_skip_register_compare() {
        let mut chip = setup(&[0x61, 0x05, 0x62, 0x05, 0x51, 0x20, 0x00, 0x00, 0x91, 0x20]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.pc, 0x208);
        run(&mut chip, 1);
        assert_eq!(chip.processor.pc, 0x20A);
    }

    #[test]
    fn test_add_immediate_wraps_without_flag() {
        let mut chip = setup(&[0x60, 0xFF, 0x70, 0x02]);
        run(&mut chip, 2);
        assert_regs(&chip, &[(0x0, 0x01)]);
    }

    #[test]
    fn test_add_sets_carry() {
        for (a, b) in [(0x00u8, 0x00u8), (0x80, 0x7F), (0x80, 0x80), (0xFF, 0xFF), (0x10, 0xF0)] {
            let mut chip = setup(&[0x60, a, 0x61, b, 0x80, 0x14]);
            run(&mut chip, 3);

            let sum = u16::from(a) + u16::from(b);
            assert_eq!(chip.processor.v[0], sum as u8, "{a} + {b}");
            assert_eq!(chip.processor.v[0xF], u8::from(sum > 255), "{a} + {b}");
        }
    }

    #[test]
    fn test_sub_with_borrow() {
        let mut chip = setup(&[0x60, 0x10, 0x61, 0x20, 0x80, 0x15]);
        run(&mut chip, 3);
        assert_regs(&chip, &[(0x0, 0xF0), (0x1, 0x20), (0xF, 0)]);
    }

    #[test]
    fn test_sub_without_borrow() {
        let mut chip = setup(&[0x60, 0x20, 0x61, 0x08, 0x80, 0x15]);
        run(&mut chip, 3);
        assert_regs(&chip, &[(0x0, 0x18), (0x1, 0x08), (0xF, 1)]);
    }

    #[test]
    fn test_sub_equal_operands_clears_flag() {
        let mut chip = setup(&[0x60, 0x20, 0x61, 0x20, 0x6F, 0x01, 0x80, 0x15]);
        run(&mut chip, 4);
        assert_regs(&chip, &[(0x1, 0x20), (0xF, 0)]);
    }

    #[test]
    fn test_subn() {
        let mut chip = setup(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x17]);
        run(&mut chip, 3);
        assert_regs(&chip, &[(0x0, 0xFE), (0x1, 0x03)]);

        let mut chip = setup(&[0x60, 0x03, 0x61, 0x05, 0x80, 0x17]);
        run(&mut chip, 3);
        assert_regs(&chip, &[(0x0, 0x02), (0x1, 0x05), (0xF, 1)]);
    }

    #[test]
    fn test_shifts() {
        let mut chip = setup(&[0x60, 0x81, 0x80, 0x06]);
        run(&mut chip, 2);
        assert_regs(&chip, &[(0x0, 0x40), (0xF, 1)]);

        let mut chip = setup(&[0x60, 0x81, 0x80, 0x0E]);
        run(&mut chip, 2);
        assert_regs(&chip, &[(0x0, 0x02), (0xF, 1)]);

        let mut chip = setup(&[0x60, 0x40, 0x80, 0x0E]);
        run(&mut chip, 2);
        assert_regs(&chip, &[(0x0, 0x80)]);
    }

    #[test]
    fn test_shift_ignores_y() {
        let mut chip = setup(&[0x60, 0x04, 0x61, 0xFF, 0x80, 0x16]);
        run(&mut chip, 3);
        assert_regs(&chip, &[(0x0, 0x02), (0x1, 0xFF)]);
    }

    #[test]
    fn test_bitwise_ops_leave_flag() {
        let mut chip = setup(&[
            0x60, 0b1100, 0x61, 0b1010, 0x6F, 0x07, 0x80, 0x11, 0x82, 0x02, 0x83, 0x03,
        ]);
        run(&mut chip, 4);
        assert_eq!(chip.processor.v[0], 0b1110);
        assert_eq!(chip.processor.v[0xF], 0x07);

        let mut chip = setup(&[0x60, 0b1100, 0x61, 0b1010, 0x80, 0x12]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.v[0], 0b1000);

        let mut chip = setup(&[0x60, 0b1100, 0x61, 0b1010, 0x80, 0x13]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.v[0], 0b0110);
    }

    #[test]
    fn test_flag_register_as_operand() {
        // VF is assigned the carry first, then VF += V1.
        let mut chip = setup(&[0x6F, 0xFF, 0x61, 0x02, 0x8F, 0x14]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.v[0xF], 0x03);
    }

    #[test]
    fn test_move() {
        let mut chip = setup(&[0x61, 0x42, 0x80, 0x10]);
        run(&mut chip, 2);
        assert_regs(&chip, &[(0x0, 0x42), (0x1, 0x42)]);
    }

    #[test]
    fn test_jumps() {
        let mut chip = setup(&[0x12, 0x08]);
        run(&mut chip, 1);
        assert_eq!(chip.processor.pc, 0x208);

        let mut chip = setup(&[0x60, 0x10, 0xB3, 0x00]);
        run(&mut chip, 2);
        assert_eq!(chip.processor.pc, 0x310);
    }

    #[test]
    fn test_call_and_return() {
        // 0x200: CALL 0x206, 0x202: LD V1, 1, 0x204: JP 0x204, 0x206: RET
        let mut chip = setup(&[0x22, 0x06, 0x61, 0x01, 0x12, 0x04, 0x00, 0xEE]);

        run(&mut chip, 1);
        assert_eq!(chip.processor.pc, 0x206);
        assert_eq!(chip.processor.stack.sp(), 1);
        assert_eq!(chip.processor.stack.slots()[1], 0x200);

        run(&mut chip, 1);
        assert_eq!(chip.processor.pc, 0x202);
        assert_eq!(chip.processor.stack.sp(), 0);

        run(&mut chip, 1);
        assert_regs(&chip, &[(0x1, 1)]);
    }

    #[test]
    fn test_return_on_empty_stack_faults() {
        let mut chip = setup(&[0x00, 0xEE]);
        assert_eq!(chip.step(), Err(Fault::StackUnderflow { pc: 0x200 }));
        assert_eq!(chip.processor.pc, 0x200);
    }

    #[test]
    fn test_recursion_overflows_stack() {
        // 0x200: CALL 0x200
        let mut chip = setup(&[0x22, 0x00]);
        run(&mut chip, 15);
        assert_eq!(chip.processor.stack.sp(), 15);
        assert_eq!(
            chip.step(),
            Err(Fault::StackOverflow {
                pc: 0x200,
                target: 0x200
            })
        );
    }

    #[test]
    fn test_set_index_and_add() {
        let mut chip = setup(&[0xA1, 0x23, 0x60, 0x10, 0xF0, 0x1E]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.i, 0x133);
    }

    #[test]
    fn test_add_index_wraps_at_sixteen_bits() {
        let mut chip = setup(&[0x60, 0x01, 0xF0, 0x1E]);
        chip.processor.i = 0xFFFF;
        run(&mut chip, 2);
        assert_eq!(chip.processor.i, 0);
    }

    #[test]
    fn test_random_is_masked() {
        let mut chip = setup(&[0xC0, 0x00, 0xC1, 0x0F, 0xC2, 0xF0]);
        run(&mut chip, 3);
        assert_eq!(chip.processor.v[0], 0);
        assert_eq!(chip.processor.v[1] & 0xF0, 0);
        assert_eq!(chip.processor.v[2] & 0x0F, 0);
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let rom = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF, 0xC3, 0xFF];
        let mut a = setup(&rom);
        let mut b = setup(&rom);
        run(&mut a, 4);
        run(&mut b, 4);
        assert_eq!(a.processor.v, b.processor.v);
    }

    #[test]
    fn test_clear_screen() {
        // LD F, V0 ; DRW V0, V0, 5 ; CLS
        let mut chip = setup(&[0xF0, 0x29, 0xD0, 0x05, 0x00, 0xE0]);
        run(&mut chip, 2);
        assert!(!chip.display().is_blank());

        let cycle = run(&mut chip, 1);
        assert!(chip.display().is_blank());
        assert_eq!(cycle.outcome, Outcome::Executed(Instruction::Cls));
    }

    #[test]
    fn test_draw_font_glyph() {
        // V0 = 0xA ; LD F, V0 ; V1 = 4 ; DRW V1, V2, 5
        let mut chip = setup(&[0x60, 0x0A, 0xF0, 0x29, 0x61, 0x04, 0xD1, 0x25]);
        let cycle = run(&mut chip, 4);

        assert!(cycle.redraw);
        assert_eq!(chip.processor.i, 50);
        assert_eq!(chip.processor.v[0xF], 0);

        // Top row of "A" is 0xF0.
        let top: Vec<bool> = (4..12).map(|x| chip.display().pixel(x, 0)).collect();
        assert_eq!(top, [true, true, true, true, false, false, false, false]);
        // Second row is 0x90.
        assert!(chip.display().pixel(4, 1));
        assert!(!chip.display().pixel(5, 1));
        assert!(chip.display().pixel(7, 1));
    }

    #[test]
    fn test_draw_twice_collides() {
        let mut chip = setup(&[0xD0, 0x05, 0xD0, 0x05]);

        run(&mut chip, 1);
        assert_eq!(chip.processor.v[0xF], 0);

        let cycle = run(&mut chip, 1);
        assert!(cycle.redraw);
        assert_eq!(chip.processor.v[0xF], 1);
        assert!(chip.display().is_blank());
    }

    #[test]
    fn test_draw_clips_at_edges_by_default() {
        // V0 = 62, V1 = 30 ; I = 0 ("0" glyph) ; DRW V0, V1, 5
        let mut chip = setup(&[0x60, 62, 0x61, 30, 0xD0, 0x15]);
        run(&mut chip, 3);

        // Rows 0xF0 and 0x90 of the glyph survive, cut to two columns.
        assert!(chip.display().pixel(62, 30));
        assert!(chip.display().pixel(63, 30));
        assert!(chip.display().pixel(62, 31));
        assert!(!chip.display().pixel(63, 31));
        assert_eq!(
            chip.display().pixels().iter().filter(|&&p| p).count(),
            3,
            "{:?}",
            chip.display()
        );
    }

    #[test]
    fn test_draw_rejected_past_edge() {
        let config = Config::default().with_sprite_edge(SpriteEdge::Reject);
        let mut chip = setup_with(&[0x60, 62, 0xD0, 0x11], config);
        run(&mut chip, 1);

        assert_eq!(
            chip.step(),
            Err(Fault::SpriteOutOfBounds {
                pc: 0x202,
                x: graphics::WIDTH,
                y: 0
            })
        );
        assert!(chip.display().is_blank());
    }

    #[test]
    fn test_draw_past_end_of_memory_faults() {
        let mut chip = setup(&[0xAF, 0xFE, 0xD0, 0x05]);
        run(&mut chip, 1);
        assert_eq!(
            chip.step(),
            Err(Fault::AddressOutOfRange {
                pc: 0x202,
                opcode: 0xD005,
                address: 0x1000
            })
        );
    }

    #[test]
    fn test_non_draw_cycles_do_not_request_redraw() {
        let mut chip = setup(&[0x60, 0x01, 0x00, 0xE0]);
        assert!(!run(&mut chip, 1).redraw);
        assert!(!run(&mut chip, 1).redraw);
    }

    #[test]
    fn test_key_skips() {
        let mut chip = setup(&[0x60, 0x07, 0xE0, 0x9E, 0x00, 0x00, 0xE0, 0xA1]);
        chip.update_key_state(0x7, true);
        run(&mut chip, 2);
        assert_eq!(chip.processor.pc, 0x206);
        run(&mut chip, 1);
        assert_eq!(chip.processor.pc, 0x208);

        let mut chip = setup(&[0x60, 0x07, 0xE0, 0x9E, 0xE0, 0xA1]);
        run(&mut chip, 2);
        assert_eq!(chip.processor.pc, 0x204);
        run(&mut chip, 1);
        assert_eq!(chip.processor.pc, 0x208);
    }

    #[test]
    fn test_key_outside_keypad_faults() {
        let mut chip = setup(&[0x60, 0x10, 0xE0, 0x9E]);
        run(&mut chip, 1);
        assert_eq!(
            chip.step(),
            Err(Fault::InvalidKey {
                pc: 0x202,
                opcode: 0xE09E,
                key: 0x10
            })
        );
    }

    #[test]
    fn test_wait_key_retries_until_pressed() {
        let mut chip = setup(&[0xF3, 0x0A, 0x00, 0x00]);
        chip.bus.clock.delay_timer = 5;

        for _ in 0..3 {
            let cycle = chip.step().unwrap();
            assert_eq!(cycle.outcome, Outcome::AwaitingKey);
            assert_eq!(chip.processor.pc, 0x200);
        }
        assert_eq!(chip.bus.clock.delay_timer, 2);

        chip.update_key_state(0xC, true);
        chip.update_key_state(0x9, true);
        let cycle = chip.step().unwrap();

        assert_eq!(cycle.outcome, Outcome::Executed(Instruction::WaitKey { x: 3 }));
        assert_eq!(chip.processor.v[3], 0x9);
        assert_eq!(chip.processor.pc, 0x202);
    }

    #[test]
    fn test_timers() {
        // V0 = 3 ; LD DT, V0 ; LD ST, V0 ; LD V1, DT
        let mut chip = setup(&[0x60, 0x03, 0xF0, 0x15, 0xF0, 0x18, 0xF1, 0x07]);
        run(&mut chip, 2);
        assert_eq!(chip.bus.clock.delay_timer, 2);

        let cycle = run(&mut chip, 1);
        assert!(cycle.sound);
        assert_eq!(chip.bus.clock.sound_timer, 2);

        run(&mut chip, 1);
        assert_eq!(chip.processor.v[1], 1);
        assert_eq!(chip.bus.clock.delay_timer, 0);
    }

    #[test]
    fn test_sound_flag_follows_timer() {
        let mut chip = setup(&[0x60, 0x02, 0xF0, 0x18, 0x12, 0x04]);
        assert!(!run(&mut chip, 1).sound);
        assert!(run(&mut chip, 1).sound);
        assert!(run(&mut chip, 1).sound);
        assert!(!run(&mut chip, 1).sound);
    }

    #[test]
    fn test_bcd() {
        for (value, digits) in [(157u8, [1, 5, 7]), (0, [0, 0, 0]), (255, [2, 5, 5]), (40, [0, 4, 0])] {
            let mut chip = setup(&[0x65, value, 0xA3, 0x00, 0xF5, 0x33]);
            run(&mut chip, 3);
            assert_eq!(chip.bus.memory.slice(0x300, 3), Some(&digits[..]), "{value}");
        }
    }

    #[test]
    fn test_bcd_past_end_of_memory_faults() {
        let mut chip = setup(&[0xAF, 0xFE, 0xF0, 0x33]);
        run(&mut chip, 1);
        assert!(matches!(
            chip.step(),
            Err(Fault::AddressOutOfRange { address: 0x1000, .. })
        ));
        assert_eq!(chip.bus.memory[0xFFE], 0);
    }

    #[test]
    fn test_store_and_load_registers() {
        let mut chip = setup(&[
            0x60, 0x11, 0x61, 0x22, 0x62, 0x33, 0x63, 0x44, 0x64, 0x55, // V0..V4
            0xA4, 0x00, // I = 0x400
            0xF3, 0x55, // store V0..V3
            0x60, 0x00, 0x61, 0x00, 0x62, 0x00, 0x63, 0x00, // zero V0..V3
            0xF3, 0x65, // load V0..V3
        ]);
        run(&mut chip, 7);
        assert_eq!(
            chip.bus.memory.slice(0x400, 5),
            Some(&[0x11, 0x22, 0x33, 0x44, 0x00][..])
        );
        assert_eq!(chip.processor.i, 0x400);

        run(&mut chip, 4);
        assert_regs(&chip, &[(0x4, 0x55)]);

        run(&mut chip, 1);
        assert_regs(&chip, &[(0x0, 0x11), (0x1, 0x22), (0x2, 0x33), (0x3, 0x44), (0x4, 0x55)]);
    }

    #[test]
    fn test_store_registers_past_end_of_memory_faults() {
        let mut chip = setup(&[0xAF, 0xFC, 0xFF, 0x55]);
        run(&mut chip, 1);
        assert!(matches!(
            chip.step(),
            Err(Fault::AddressOutOfRange { opcode: 0xFF55, .. })
        ));
    }

    #[test]
    fn test_load_registers_past_end_of_memory_faults() {
        let mut chip = setup(&[0xAF, 0xFE, 0xF3, 0x65]);
        chip.processor.v[..4].copy_from_slice(&[1, 2, 3, 4]);
        run(&mut chip, 1);

        assert!(matches!(
            chip.step(),
            Err(Fault::AddressOutOfRange {
                opcode: 0xF365,
                address: 0x1000,
                ..
            })
        ));
        assert_regs(&chip, &[(0x0, 1), (0x1, 2), (0x2, 3), (0x3, 4)]);
    }

    #[test]
    fn test_empty_sprite_reads_no_memory() {
        let mut chip = setup(&[0xD0, 0x00]);
        chip.processor.i = 0x1001;

        let cycle = chip.step().unwrap();
        assert!(cycle.redraw);
        assert!(chip.display().is_blank());
        assert_eq!(chip.processor.v[0xF], 0);
        assert_eq!(chip.processor.pc, 0x202);
    }

    #[test]
    fn test_entropy_seeded_cpu() {
        let cpu = Cpu::new(SpriteEdge::Clip, None).unwrap();
        assert_eq!(cpu.pc, STARTING_PC);
        assert_eq!(cpu.v, [0; 16]);
    }

    #[test]
    fn test_unknown_opcode_is_skipped() {
        let mut chip = setup(&[0x00, 0x00, 0x60, 0x01]);
        chip.bus.clock.delay_timer = 2;

        let cycle = chip.step().unwrap();
        assert_eq!(cycle.outcome, Outcome::UnknownOpcode(0x0000));
        assert_eq!(chip.processor.pc, 0x202);
        assert_eq!(chip.bus.clock.delay_timer, 1);
        assert_regs(&chip, &[]);

        run(&mut chip, 1);
        assert_regs(&chip, &[(0x0, 1)]);
    }

    #[test]
    fn test_fetch_past_end_of_memory_faults() {
        let mut chip = setup(&[0x1F, 0xFF]);
        run(&mut chip, 1);
        assert_eq!(chip.step(), Err(Fault::PcOutOfRange { pc: 0xFFF }));
    }

    #[test]
    fn test_fault_does_not_tick_timers() {
        let mut chip = setup(&[0x00, 0xEE]);
        chip.bus.clock.delay_timer = 4;
        assert!(chip.step().is_err());
        assert_eq!(chip.bus.clock.delay_timer, 4);
    }
}
