use crate::constants::{PROGRAM_START, REGISTER_COUNT};
use crate::frame_buffer::FrameBuffer;
use crate::keypad::Keypad;
use crate::memory::Memory;
use crate::stack::Stack;

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry, borrow and collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Timers
/// - 2 8-bit timers (delay & sound) counting down at 60Hz
/// - a beep plays while the sound timer is non-zero
///
/// ## Memory
/// - a stack of 16 return addresses
/// - 4096 bytes of addressable memory
/// - a 64x32 frame buffer holding the contents of the next frame to be drawn
///
/// ## Input
/// - the pressed status of the 16 keys 0..F
///
/// ## Diagnostics
/// - the most recently fetched opcode
/// - whether the frame buffer changed since the host last drew it
#[derive(Copy, Clone)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub stack: Stack,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub memory: Memory,
    pub frame_buffer: FrameBuffer,
    pub keypad: Keypad,
    pub opcode: u16,
    pub draw_flag: bool,
}

impl State {
    pub fn new() -> Self {
        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            // ROMs are loaded at 0x200 so execution starts there
            pc: PROGRAM_START,
            stack: Stack::new(),
            delay_timer: 0,
            sound_timer: 0,
            memory: Memory::new(),
            frame_buffer: FrameBuffer::new(),
            keypad: Keypad::new(),
            opcode: 0,
            draw_flag: false,
        }
    }

    /// Counts both timers down by one, stopping at zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
