use thiserror::Error;

use crate::constants::MAX_ROM_SIZE;

/// Failures while placing a ROM into memory
#[derive(Debug, Error)]
pub enum RomError {
    #[error("ROM is {size} bytes but only {} bytes of program memory are available", MAX_ROM_SIZE)]
    TooLarge { size: usize },

    #[error("unable to read ROM")]
    ReadFailure(#[from] std::io::Error),
}

/// Faults raised while executing a program.
///
/// None of these are recoverable: the emulated program has no well defined next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory access at {address:#05X} is outside of the 4K address space")]
    OutOfBounds { address: usize },

    #[error("subroutine call with a full stack")]
    StackOverflow,

    #[error("subroutine return with an empty stack")]
    StackUnderflow,

    #[error("unknown opcode {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },
}
