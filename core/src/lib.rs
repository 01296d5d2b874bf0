pub use chip8::{Chip8, Step};
pub use constants::CLOCK_SPEED;
pub use error::{CpuError, RomError};
pub use frame_buffer::FrameBuffer;
pub use instruction::{Alu, Instruction, KeySkip, Misc, System};
pub use keypad::Keypad;
pub use opcode::Opcode;
pub use timer::{TimerClock, Tone};

mod chip8;
pub mod constants;
mod error;
mod frame_buffer;
mod instruction;
mod keypad;
pub mod memory;
mod opcode;
mod operations;
pub mod stack;
pub mod state;
mod timer;
