//! Decoding of raw opcodes into typed [`Instruction`]s.
//!
//! Families `0`, `E` and `F` dispatch on the low byte and family `8` on the
//! low nibble. The low nibble of `5xy0` and `9xy0` is not checked.

use std::fmt;

/// A decoded Chip8 instruction. Register operands are indices into `V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`: clear the display.
    Cls,
    /// `00EE`: return from a subroutine.
    Ret,
    /// `1nnn`: jump to `nnn`.
    Jump { nnn: u16 },
    /// `2nnn`: call the subroutine at `nnn`.
    Call { nnn: u16 },
    /// `3xnn`: skip if `Vx == nn`.
    SkipEqImm { x: usize, nn: u8 },
    /// `4xnn`: skip if `Vx != nn`.
    SkipNeImm { x: usize, nn: u8 },
    /// `5xy0`: skip if `Vx == Vy`.
    SkipEqReg { x: usize, y: usize },
    /// `6xnn`: `Vx = nn`.
    LoadImm { x: usize, nn: u8 },
    /// `7xnn`: `Vx += nn`, no carry.
    AddImm { x: usize, nn: u8 },
    /// `8xy0`: `Vx = Vy`.
    Move { x: usize, y: usize },
    /// `8xy1`: `Vx |= Vy`.
    Or { x: usize, y: usize },
    /// `8xy2`: `Vx &= Vy`.
    And { x: usize, y: usize },
    /// `8xy3`: `Vx ^= Vy`.
    Xor { x: usize, y: usize },
    /// `8xy4`: `Vx += Vy`, `VF` = carry.
    Add { x: usize, y: usize },
    /// `8xy5`: `Vx -= Vy`, `VF` = no borrow.
    Sub { x: usize, y: usize },
    /// `8xy6`: `Vx >>= 1`, `VF` = bit shifted out.
    Shr { x: usize, y: usize },
    /// `8xy7`: `Vx = Vy - Vx`, `VF` = no borrow.
    SubN { x: usize, y: usize },
    /// `8xyE`: `Vx <<= 1`, `VF` = bit shifted out.
    Shl { x: usize, y: usize },
    /// `9xy0`: skip if `Vx != Vy`.
    SkipNeReg { x: usize, y: usize },
    /// `Annn`: `I = nnn`.
    LoadI { nnn: u16 },
    /// `Bnnn`: jump to `nnn + V0`.
    JumpV0 { nnn: u16 },
    /// `Cxnn`: `Vx = random & nn`.
    Random { x: usize, nn: u8 },
    /// `Dxyn`: draw an `n` row sprite from `I` at (`Vx`, `Vy`).
    Draw { x: usize, y: usize, n: u8 },
    /// `Ex9E`: skip if key `Vx` is pressed.
    SkipKey { x: usize },
    /// `ExA1`: skip if key `Vx` is not pressed.
    SkipNotKey { x: usize },
    /// `Fx07`: `Vx = DT`.
    LoadDelay { x: usize },
    /// `Fx0A`: wait for a key press and store it in `Vx`.
    WaitKey { x: usize },
    /// `Fx15`: `DT = Vx`.
    SetDelay { x: usize },
    /// `Fx18`: `ST = Vx`.
    SetSound { x: usize },
    /// `Fx1E`: `I += Vx`.
    AddI { x: usize },
    /// `Fx29`: `I` = address of the font glyph for `Vx`.
    LoadFont { x: usize },
    /// `Fx33`: store the decimal digits of `Vx` at `I..I+3`.
    StoreBcd { x: usize },
    /// `Fx55`: store `V0..=Vx` at `I`.
    StoreRegs { x: usize },
    /// `Fx65`: load `V0..=Vx` from `I`.
    LoadRegs { x: usize },
}

impl Instruction {
    /// Decodes a big-endian opcode, or returns `None` if it does not match
    /// any instruction.
    #[must_use]
    pub fn decode(opcode: u16) -> Option<Self> {
        let x = usize::from((opcode & 0x0F00) >> 8);
        let y = usize::from((opcode & 0x00F0) >> 4);
        let n = (opcode & 0x000F) as u8;
        let nn = (opcode & 0x00FF) as u8;
        let nnn = opcode & 0x0FFF;

        let instruction = match opcode >> 12 {
            0x0 => match nn {
                0xE0 => Self::Cls,
                0xEE => Self::Ret,
                _ => return None,
            },
            0x1 => Self::Jump { nnn },
            0x2 => Self::Call { nnn },
            0x3 => Self::SkipEqImm { x, nn },
            0x4 => Self::SkipNeImm { x, nn },
            0x5 => Self::SkipEqReg { x, y },
            0x6 => Self::LoadImm { x, nn },
            0x7 => Self::AddImm { x, nn },
            0x8 => match n {
                0x0 => Self::Move { x, y },
                0x1 => Self::Or { x, y },
                0x2 => Self::And { x, y },
                0x3 => Self::Xor { x, y },
                0x4 => Self::Add { x, y },
                0x5 => Self::Sub { x, y },
                0x6 => Self::Shr { x, y },
                0x7 => Self::SubN { x, y },
                0xE => Self::Shl { x, y },
                _ => return None,
            },
            0x9 => Self::SkipNeReg { x, y },
            0xA => Self::LoadI { nnn },
            0xB => Self::JumpV0 { nnn },
            0xC => Self::Random { x, nn },
            0xD => Self::Draw { x, y, n },
            0xE => match nn {
                0x9E => Self::SkipKey { x },
                0xA1 => Self::SkipNotKey { x },
                _ => return None,
            },
            0xF => match nn {
                0x07 => Self::LoadDelay { x },
                0x0A => Self::WaitKey { x },
                0x15 => Self::SetDelay { x },
                0x18 => Self::SetSound { x },
                0x1E => Self::AddI { x },
                0x29 => Self::LoadFont { x },
                0x33 => Self::StoreBcd { x },
                0x55 => Self::StoreRegs { x },
                0x65 => Self::LoadRegs { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }

    /// Encodes the instruction back into its canonical opcode.
    #[must_use]
    pub fn opcode(&self) -> u16 {
        let xnn = |family: u16, x: usize, nn: u8| family << 12 | (x as u16) << 8 | u16::from(nn);
        let xy = |family: u16, x: usize, y: usize, n: u16| {
            family << 12 | (x as u16) << 8 | (y as u16) << 4 | n
        };

        match *self {
            Self::Cls => 0x00E0,
            Self::Ret => 0x00EE,
            Self::Jump { nnn } => 0x1000 | nnn,
            Self::Call { nnn } => 0x2000 | nnn,
            Self::SkipEqImm { x, nn } => xnn(0x3, x, nn),
            Self::SkipNeImm { x, nn } => xnn(0x4, x, nn),
            Self::SkipEqReg { x, y } => xy(0x5, x, y, 0x0),
            Self::LoadImm { x, nn } => xnn(0x6, x, nn),
            Self::AddImm { x, nn } => xnn(0x7, x, nn),
            Self::Move { x, y } => xy(0x8, x, y, 0x0),
            Self::Or { x, y } => xy(0x8, x, y, 0x1),
            Self::And { x, y } => xy(0x8, x, y, 0x2),
            Self::Xor { x, y } => xy(0x8, x, y, 0x3),
            Self::Add { x, y } => xy(0x8, x, y, 0x4),
            Self::Sub { x, y } => xy(0x8, x, y, 0x5),
            Self::Shr { x, y } => xy(0x8, x, y, 0x6),
            Self::SubN { x, y } => xy(0x8, x, y, 0x7),
            Self::Shl { x, y } => xy(0x8, x, y, 0xE),
            Self::SkipNeReg { x, y } => xy(0x9, x, y, 0x0),
            Self::LoadI { nnn } => 0xA000 | nnn,
            Self::JumpV0 { nnn } => 0xB000 | nnn,
            Self::Random { x, nn } => xnn(0xC, x, nn),
            Self::Draw { x, y, n } => xy(0xD, x, y, u16::from(n)),
            Self::SkipKey { x } => xnn(0xE, x, 0x9E),
            Self::SkipNotKey { x } => xnn(0xE, x, 0xA1),
            Self::LoadDelay { x } => xnn(0xF, x, 0x07),
            Self::WaitKey { x } => xnn(0xF, x, 0x0A),
            Self::SetDelay { x } => xnn(0xF, x, 0x15),
            Self::SetSound { x } => xnn(0xF, x, 0x18),
            Self::AddI { x } => xnn(0xF, x, 0x1E),
            Self::LoadFont { x } => xnn(0xF, x, 0x29),
            Self::StoreBcd { x } => xnn(0xF, x, 0x33),
            Self::StoreRegs { x } => xnn(0xF, x, 0x55),
            Self::LoadRegs { x } => xnn(0xF, x, 0x65),
        }
    }
}

/// Formats the instruction as conventional Chip8 assembly.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Cls => write!(f, "CLS"),
            Self::Ret => write!(f, "RET"),
            Self::Jump { nnn } => write!(f, "JP {nnn:#05X}"),
            Self::Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            Self::SkipEqImm { x, nn } => write!(f, "SE V{x:X}, {nn:#04X}"),
            Self::SkipNeImm { x, nn } => write!(f, "SNE V{x:X}, {nn:#04X}"),
            Self::SkipEqReg { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            Self::LoadImm { x, nn } => write!(f, "LD V{x:X}, {nn:#04X}"),
            Self::AddImm { x, nn } => write!(f, "ADD V{x:X}, {nn:#04X}"),
            Self::Move { x, y } => write!(f, "LD V{x:X}, V{y:X}"),
            Self::Or { x, y } => write!(f, "OR V{x:X}, V{y:X}"),
            Self::And { x, y } => write!(f, "AND V{x:X}, V{y:X}"),
            Self::Xor { x, y } => write!(f, "XOR V{x:X}, V{y:X}"),
            Self::Add { x, y } => write!(f, "ADD V{x:X}, V{y:X}"),
            Self::Sub { x, y } => write!(f, "SUB V{x:X}, V{y:X}"),
            Self::Shr { x, .. } => write!(f, "SHR V{x:X}"),
            Self::SubN { x, y } => write!(f, "SUBN V{x:X}, V{y:X}"),
            Self::Shl { x, .. } => write!(f, "SHL V{x:X}"),
            Self::SkipNeReg { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            Self::LoadI { nnn } => write!(f, "LD I, {nnn:#05X}"),
            Self::JumpV0 { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Self::Random { x, nn } => write!(f, "RND V{x:X}, {nn:#04X}"),
            Self::Draw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Self::SkipKey { x } => write!(f, "SKP V{x:X}"),
            Self::SkipNotKey { x } => write!(f, "SKNP V{x:X}"),
            Self::LoadDelay { x } => write!(f, "LD V{x:X}, DT"),
            Self::WaitKey { x } => write!(f, "LD V{x:X}, K"),
            Self::SetDelay { x } => write!(f, "LD DT, V{x:X}"),
            Self::SetSound { x } => write!(f, "LD ST, V{x:X}"),
            Self::AddI { x } => write!(f, "ADD I, V{x:X}"),
            Self::LoadFont { x } => write!(f, "LD F, V{x:X}"),
            Self::StoreBcd { x } => write!(f, "LD B, V{x:X}"),
            Self::StoreRegs { x } => write!(f, "LD [I], V{x:X}"),
            Self::LoadRegs { x } => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_extracts_operands() {
        assert_eq!(
            Instruction::decode(0xD125),
            Some(Instruction::Draw { x: 1, y: 2, n: 5 })
        );
        assert_eq!(
            Instruction::decode(0x7A0F),
            Some(Instruction::AddImm { x: 0xA, nn: 0x0F })
        );
        assert_eq!(
            Instruction::decode(0xB3FF),
            Some(Instruction::JumpV0 { nnn: 0x3FF })
        );
    }

    #[test]
    fn test_secondary_dispatch() {
        assert_eq!(Instruction::decode(0x00E0), Some(Instruction::Cls));
        assert_eq!(Instruction::decode(0x00EE), Some(Instruction::Ret));
        assert_eq!(
            Instruction::decode(0x8ABE),
            Some(Instruction::Shl { x: 0xA, y: 0xB })
        );
        assert_eq!(
            Instruction::decode(0xE3A1),
            Some(Instruction::SkipNotKey { x: 3 })
        );
        assert_eq!(
            Instruction::decode(0xF765),
            Some(Instruction::LoadRegs { x: 7 })
        );
    }

    #[test]
    fn test_unknown_opcodes() {
        for opcode in [0x0000, 0x0123, 0x8008, 0x800F, 0xE000, 0xE19F, 0xF000, 0xF0FF] {
            assert_eq!(Instruction::decode(opcode), None, "{opcode:#06X}");
        }
    }

    #[test]
    fn test_register_compare_ignores_low_nibble() {
        assert_eq!(
            Instruction::decode(0x5121),
            Some(Instruction::SkipEqReg { x: 1, y: 2 })
        );
        assert_eq!(
            Instruction::decode(0x912F),
            Some(Instruction::SkipNeReg { x: 1, y: 2 })
        );
    }

    #[test]
    fn test_opcode_reencodes_canonical_form() {
        for opcode in [0x00E0, 0x2ABC, 0x4F12, 0x8CD7, 0xD01F, 0xE59E, 0xF833] {
            let instruction = Instruction::decode(opcode).unwrap();
            assert_eq!(instruction.opcode(), opcode);
        }
    }

    #[test]
    fn test_mnemonics() {
        let text = |opcode| Instruction::decode(opcode).unwrap().to_string();
        assert_eq!(text(0x00E0), "CLS");
        assert_eq!(text(0x1200), "JP 0x200");
        assert_eq!(text(0x6A0C), "LD VA, 0x0C");
        assert_eq!(text(0x8014), "ADD V0, V1");
        assert_eq!(text(0xD015), "DRW V0, V1, 5");
        assert_eq!(text(0xF30A), "LD V3, K");
        assert_eq!(text(0xF255), "LD [I], V2");
    }
}
