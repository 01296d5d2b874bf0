use std::ops::Range;

use crate::constants::{MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET, SPRITE_SHEET_START};
use crate::error::{CpuError, RomError};

/// # Memory
/// 4096 bytes of addressable memory.
///
/// ```text
/// 0x000 ┬ reserved for the interpreter
/// 0x050 │   sprite sheet (80 bytes)
/// 0x0A0 │
/// 0x200 ┼ program space
/// 0xFFF ┴
/// ```
///
/// Every access is range checked; addresses come from PC, I, or register offsets
/// so a misbehaving ROM surfaces as `CpuError::OutOfBounds` rather than a panic.
#[derive(Copy, Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Zeroed memory with the sprite sheet in place
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        let start = SPRITE_SHEET_START as usize;
        bytes[start..start + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);
        Memory { bytes }
    }

    /// Copies a ROM image into program space.
    ///
    /// Memory is left untouched if the image doesn't fit.
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), RomError> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(RomError::TooLarge { size: rom.len() });
        }
        let start = PROGRAM_START as usize;
        self.bytes[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    pub fn read(&self, address: u16) -> Result<u8, CpuError> {
        Ok(self.slice(address, 1)?[0])
    }

    pub fn write(&mut self, address: u16, value: u8) -> Result<(), CpuError> {
        self.write_slice(address, &[value])
    }

    /// Reads the big-endian word at `address` and `address + 1`
    pub fn read_word(&self, address: u16) -> Result<u16, CpuError> {
        let word = self.slice(address, 2)?;
        Ok(u16::from(word[0]) << 8 | u16::from(word[1]))
    }

    pub fn slice(&self, start: u16, len: usize) -> Result<&[u8], CpuError> {
        Ok(&self.bytes[checked_range(start, len)?])
    }

    pub fn write_slice(&mut self, start: u16, data: &[u8]) -> Result<(), CpuError> {
        self.bytes[checked_range(start, data.len())?].copy_from_slice(data);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// `start..start + len` if it lies inside memory, else the first address past the end
fn checked_range(start: u16, len: usize) -> Result<Range<usize>, CpuError> {
    let start = start as usize;
    let end = start + len;
    if end > MEMORY_SIZE {
        Err(CpuError::OutOfBounds {
            address: start.max(MEMORY_SIZE),
        })
    } else {
        Ok(start..end)
    }
}
