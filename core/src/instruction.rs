use std::fmt;

use rand::Rng;

use crate::error::CpuError;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// # Instruction
/// A decoded opcode.
///
/// Opcodes are first classified by their most significant nibble. The 0x0, 0x8, 0xE and 0xF
/// families multiplex several operations onto the same nibble and carry a second level of
/// decoding (`System`, `Alu`, `KeySkip`, `Misc`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`, `00EE`
    System(System),
    /// `1nnn`
    Jump { addr: u16 },
    /// `2nnn`
    Call { addr: u16 },
    /// `3xnn`
    SkipEqual { x: u8, nn: u8 },
    /// `4xnn`
    SkipNotEqual { x: u8, nn: u8 },
    /// `5xy0`
    SkipRegistersEqual { x: u8, y: u8 },
    /// `6xnn`
    Load { x: u8, nn: u8 },
    /// `7xnn`
    Add { x: u8, nn: u8 },
    /// `8xy_`
    Alu { op: Alu, x: u8, y: u8 },
    /// `9xy0`
    SkipRegistersNotEqual { x: u8, y: u8 },
    /// `Annn`
    LoadIndex { addr: u16 },
    /// `Bnnn`
    JumpOffset { addr: u16 },
    /// `Cxnn`
    Random { x: u8, nn: u8 },
    /// `Dxyn`
    Draw { x: u8, y: u8, n: u8 },
    /// `Ex__`
    Key { op: KeySkip, x: u8 },
    /// `Fx__`
    Misc { op: Misc, x: u8 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum System {
    ClearScreen,
    Return,
}

/// Register to register operations, selected by the last nibble of `8xy_`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Alu {
    Move,
    Or,
    And,
    Xor,
    AddCarry,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeySkip {
    IfPressed,
    IfNotPressed,
}

/// Timer, memory and input operations, selected by the last byte of `Fx__`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Misc {
    ReadDelay,
    AwaitKey,
    SetDelay,
    SetSound,
    AddIndex,
    LoadSprite,
    Bcd,
    Store,
    Read,
}

/// The result of executing an instruction
pub(crate) enum Transition {
    Next(State),
    /// Waiting for a key press; the state is unchanged and the instruction must run again
    Blocked,
}

impl Alu {
    fn from_nibble(n: u8) -> Option<Self> {
        match n {
            0x0 => Some(Alu::Move),
            0x1 => Some(Alu::Or),
            0x2 => Some(Alu::And),
            0x3 => Some(Alu::Xor),
            0x4 => Some(Alu::AddCarry),
            0x5 => Some(Alu::Sub),
            0x6 => Some(Alu::ShiftRight),
            0x7 => Some(Alu::SubReverse),
            0xE => Some(Alu::ShiftLeft),
            _ => None,
        }
    }
}

impl KeySkip {
    fn from_byte(nn: u8) -> Option<Self> {
        match nn {
            0x9E => Some(KeySkip::IfPressed),
            0xA1 => Some(KeySkip::IfNotPressed),
            _ => None,
        }
    }
}

impl Misc {
    fn from_byte(nn: u8) -> Option<Self> {
        match nn {
            0x07 => Some(Misc::ReadDelay),
            0x0A => Some(Misc::AwaitKey),
            0x15 => Some(Misc::SetDelay),
            0x18 => Some(Misc::SetSound),
            0x1E => Some(Misc::AddIndex),
            0x29 => Some(Misc::LoadSprite),
            0x33 => Some(Misc::Bcd),
            0x55 => Some(Misc::Store),
            0x65 => Some(Misc::Read),
            _ => None,
        }
    }
}

impl Instruction {
    /// Selects the Instruction for a given Opcode
    pub fn decode(op: u16) -> Result<Self, CpuError> {
        let (family, x, y, n) = op.nibbles();
        let instruction = match family {
            0x0 => match op {
                0x00E0 => Some(Instruction::System(System::ClearScreen)),
                0x00EE => Some(Instruction::System(System::Return)),
                _ => None,
            },
            0x1 => Some(Instruction::Jump { addr: op.nnn() }),
            0x2 => Some(Instruction::Call { addr: op.nnn() }),
            0x3 => Some(Instruction::SkipEqual { x, nn: op.nn() }),
            0x4 => Some(Instruction::SkipNotEqual { x, nn: op.nn() }),
            0x5 if n == 0x0 => Some(Instruction::SkipRegistersEqual { x, y }),
            0x6 => Some(Instruction::Load { x, nn: op.nn() }),
            0x7 => Some(Instruction::Add { x, nn: op.nn() }),
            0x8 => Alu::from_nibble(n).map(|op| Instruction::Alu { op, x, y }),
            0x9 if n == 0x0 => Some(Instruction::SkipRegistersNotEqual { x, y }),
            0xA => Some(Instruction::LoadIndex { addr: op.nnn() }),
            0xB => Some(Instruction::JumpOffset { addr: op.nnn() }),
            0xC => Some(Instruction::Random { x, nn: op.nn() }),
            0xD => Some(Instruction::Draw { x, y, n }),
            0xE => KeySkip::from_byte(op.nn()).map(|op| Instruction::Key { op, x }),
            0xF => Misc::from_byte(op.nn()).map(|op| Instruction::Misc { op, x }),
            _ => None,
        };
        instruction.ok_or(CpuError::UnknownOpcode { opcode: op })
    }

    /// Applies the instruction to `state`, producing the next state.
    ///
    /// `rng` is only consulted by `Cxnn`.
    pub(crate) fn execute(self, state: &State, rng: &mut impl Rng) -> Result<Transition, CpuError> {
        let next = match self {
            Instruction::System(System::ClearScreen) => clr(state),
            Instruction::System(System::Return) => rts(state)?,
            Instruction::Jump { addr } => jump(state, addr),
            Instruction::Call { addr } => call(state, addr)?,
            Instruction::SkipEqual { x, nn } => ske(state, x, nn),
            Instruction::SkipNotEqual { x, nn } => skne(state, x, nn),
            Instruction::SkipRegistersEqual { x, y } => skre(state, x, y),
            Instruction::Load { x, nn } => load(state, x, nn),
            Instruction::Add { x, nn } => add(state, x, nn),
            Instruction::Alu { op, x, y } => match op {
                Alu::Move => mv(state, x, y),
                Alu::Or => or(state, x, y),
                Alu::And => and(state, x, y),
                Alu::Xor => xor(state, x, y),
                Alu::AddCarry => addr(state, x, y),
                Alu::Sub => sub(state, x, y),
                Alu::ShiftRight => shr(state, x),
                Alu::SubReverse => subn(state, x, y),
                Alu::ShiftLeft => shl(state, x),
            },
            Instruction::SkipRegistersNotEqual { x, y } => skrne(state, x, y),
            Instruction::LoadIndex { addr } => loadi(state, addr),
            Instruction::JumpOffset { addr } => jumpi(state, addr),
            Instruction::Random { x, nn } => rand(state, x, nn, rng),
            Instruction::Draw { x, y, n } => draw(state, x, y, n)?,
            Instruction::Key { op, x } => match op {
                KeySkip::IfPressed => skpr(state, x),
                KeySkip::IfNotPressed => skup(state, x),
            },
            Instruction::Misc { op, x } => match op {
                Misc::ReadDelay => moved(state, x),
                Misc::AwaitKey => match keyd(state, x) {
                    Some(next) => next,
                    None => return Ok(Transition::Blocked),
                },
                Misc::SetDelay => loads(state, x),
                Misc::SetSound => ld(state, x),
                Misc::AddIndex => addi(state, x),
                Misc::LoadSprite => ldspr(state, x),
                Misc::Bcd => bcd(state, x)?,
                Misc::Store => stor(state, x)?,
                Misc::Read => read(state, x)?,
            },
        };
        Ok(Transition::Next(next))
    }
}

/// Assembly style mnemonics, e.g. `LD V1, 0x22`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::System(System::ClearScreen) => write!(f, "CLS"),
            Instruction::System(System::Return) => write!(f, "RET"),
            Instruction::Jump { addr } => write!(f, "JP {:#05X}", addr),
            Instruction::Call { addr } => write!(f, "CALL {:#05X}", addr),
            Instruction::SkipEqual { x, nn } => write!(f, "SE V{:X}, {:#04X}", x, nn),
            Instruction::SkipNotEqual { x, nn } => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            Instruction::SkipRegistersEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::Load { x, nn } => write!(f, "LD V{:X}, {:#04X}", x, nn),
            Instruction::Add { x, nn } => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Instruction::Alu { op, x, y } => {
                let mnemonic = match op {
                    Alu::Move => "LD",
                    Alu::Or => "OR",
                    Alu::And => "AND",
                    Alu::Xor => "XOR",
                    Alu::AddCarry => "ADD",
                    Alu::Sub => "SUB",
                    Alu::ShiftRight => "SHR",
                    Alu::SubReverse => "SUBN",
                    Alu::ShiftLeft => "SHL",
                };
                write!(f, "{} V{:X}, V{:X}", mnemonic, x, y)
            }
            Instruction::SkipRegistersNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::LoadIndex { addr } => write!(f, "LD I, {:#05X}", addr),
            Instruction::JumpOffset { addr } => write!(f, "JP V0, {:#05X}", addr),
            Instruction::Random { x, nn } => write!(f, "RND V{:X}, {:#04X}", x, nn),
            Instruction::Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Instruction::Key { op, x } => match op {
                KeySkip::IfPressed => write!(f, "SKP V{:X}", x),
                KeySkip::IfNotPressed => write!(f, "SKNP V{:X}", x),
            },
            Instruction::Misc { op, x } => match op {
                Misc::ReadDelay => write!(f, "LD V{:X}, DT", x),
                Misc::AwaitKey => write!(f, "LD V{:X}, K", x),
                Misc::SetDelay => write!(f, "LD DT, V{:X}", x),
                Misc::SetSound => write!(f, "LD ST, V{:X}", x),
                Misc::AddIndex => write!(f, "ADD I, V{:X}", x),
                Misc::LoadSprite => write!(f, "LD F, V{:X}", x),
                Misc::Bcd => write!(f, "LD B, V{:X}", x),
                Misc::Store => write!(f, "LD [I], V{:X}", x),
                Misc::Read => write!(f, "LD V{:X}, [I]", x),
            },
        }
    }
}
