use std::io::Read;
use std::time::Duration;

use log::{info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{KEY_COUNT, MAX_ROM_SIZE, TIMER_FREQUENCY};
use crate::error::{CpuError, RomError};
use crate::frame_buffer::FrameBuffer;
use crate::instruction::{Instruction, Transition};
use crate::keypad::Keypad;
use crate::state::State;
use crate::timer::{TimerClock, Tone};

/// What a single call to `Chip8::step` did
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The instruction ran to completion
    Executed(Instruction),
    /// `Fx0A` found no key held down; the same instruction runs again on the next step
    AwaitingKey,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the random source used by `Cxnn`
///  - the wall-clock accumulator driving the 60Hz timers
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the CPU
/// - advancing its timers
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8 {
    state: State,
    rng: StdRng,
    timer_clock: TimerClock,
    sounding: bool,
}

impl Chip8 {
    /// A freshly initialized machine whose random source is seeded from the OS
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A freshly initialized machine with a reproducible random source
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        info!("initialized CPU");
        Chip8 {
            state: State::new(),
            rng,
            timer_clock: TimerClock::new(TIMER_FREQUENCY),
            sounding: false,
        }
    }

    /// Returns the machine to its power on state, dropping any loaded program.
    ///
    /// A tone that was playing is reported as `Tone::Stop` by the next `advance_timers`.
    pub fn reset(&mut self) {
        self.state = State::new();
        self.timer_clock.reset();
        info!("reset CPU");
    }

    /// Copies a ROM image into program memory at 0x200
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), RomError> {
        self.state.memory.load_program(rom)?;
        info!("loaded ROM ({} bytes)", rom.len());
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<(), RomError> {
        // one byte past the limit is enough to reject an oversized ROM
        let mut rom = Vec::new();
        reader
            .take(MAX_ROM_SIZE as u64 + 1)
            .read_to_end(&mut rom)?;
        self.load_program(&rom)
    }

    /// Advances the CPU by a single cycle
    /// - fetches the opcode pointed at by the pc
    /// - decodes and executes it
    ///
    /// On error the state is left as it was before the failing instruction.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        let op = self.state.memory.read_word(self.state.pc)?;
        self.state.opcode = op;
        let instruction = Instruction::decode(op)?;
        trace!(
            "{:04X} {:<16} v{:02X?} i{:04X} pc{:04X}",
            op,
            instruction.to_string(),
            self.state.v,
            self.state.i,
            self.state.pc
        );
        match instruction.execute(&self.state, &mut self.rng)? {
            Transition::Next(state) => {
                self.state = state;
                Ok(Step::Executed(instruction))
            }
            Transition::Blocked => Ok(Step::AwaitingKey),
        }
    }

    /// Steps up to `cycles` times, stopping early if the program waits for a key.
    /// Returns how many instructions completed.
    pub fn run_cycles(&mut self, cycles: usize) -> Result<usize, CpuError> {
        for completed in 0..cycles {
            if self.step()? == Step::AwaitingKey {
                return Ok(completed);
            }
        }
        Ok(cycles)
    }

    /// Counts the delay and sound timers down by one
    pub fn tick_timers(&mut self) {
        self.state.tick_timers();
    }

    /// Advances the timers by `elapsed` wall-clock time.
    /// - one tick per 1/60s that has accumulated, any remainder carries over
    ///
    /// Returns what the beeper should do given the sound timer before and after.
    pub fn advance_timers(&mut self, elapsed: Duration) -> Tone {
        // more ticks than a timer can hold drain it all the same
        let ticks = self.timer_clock.advance(elapsed).min(u8::MAX as u32);
        for _ in 0..ticks {
            self.state.tick_timers();
        }
        let was_sounding = self.sounding;
        self.sounding = self.is_sounding();
        Tone::between(was_sounding, self.sounding)
    }

    /// Returns the FrameBuffer if the display should be redrawn
    pub fn get_frame(&self) -> Option<&FrameBuffer> {
        if self.state.draw_flag {
            Some(&self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn redraw_requested(&self) -> bool {
        self.state.draw_flag
    }

    /// Called by the host once it has drawn the current frame
    pub fn clear_redraw(&mut self) {
        self.state.draw_flag = false;
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.state.keypad.press(key);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        self.state.keypad.release(key);
    }

    /// Replaces the pressed status of every key at once
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.state.keypad = Keypad::from(keys);
    }

    pub fn keypad(&self) -> &Keypad {
        &self.state.keypad
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// A beep should play while the sound timer is non-zero
    pub fn is_sounding(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// The most recently fetched opcode
    pub fn current_opcode(&self) -> u16 {
        self.state.opcode
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use crate::instruction::{Alu, Misc};

    fn chip8_with(rom: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::with_seed(0x8);
        chip8.load_program(rom).unwrap();
        chip8
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_chip8_fetches_big_endian_op() {
        let mut chip8 = chip8_with(&[0xAA, 0xBB]);
        chip8.step().unwrap();
        assert_eq!(chip8.current_opcode(), 0xAABB);
        assert_eq!(chip8.state().i, 0x0ABB);
    }

    #[test]
    fn test_step_advances_pc() {
        // cls so we don't fail reading an empty opcode
        let mut chip8 = chip8_with(&[0x00, 0xE0]);
        let starting_pc = chip8.state().pc;
        let step = chip8.step().unwrap();
        assert_eq!(step, Step::Executed(Instruction::decode(0x00E0).unwrap()));
        assert_eq!(chip8.state().pc, starting_pc + 0x2);
    }

    #[test]
    fn test_load_rom_from_reader() {
        let mut chip8 = Chip8::with_seed(0x8);
        let mut rom: &[u8] = &[0x60, 0x0A];
        chip8.load_rom(&mut rom).unwrap();
        assert_eq!(chip8.state().memory.read_word(0x200).unwrap(), 0x600A);
    }

    #[test]
    fn test_load_rom_read_failure() {
        let mut chip8 = Chip8::with_seed(0x8);
        match chip8.load_rom(&mut FailingReader) {
            Err(RomError::ReadFailure(e)) => assert_eq!(e.kind(), io::ErrorKind::Other),
            other => panic!("expected ReadFailure but got {:?}", other),
        }
    }

    #[test]
    fn test_load_rom_too_large() {
        let mut chip8 = Chip8::with_seed(0x8);
        let rom = vec![0x0; 0xE01];
        let mut reader: &[u8] = &rom;
        assert!(matches!(
            chip8.load_rom(&mut reader),
            Err(RomError::TooLarge { size: 0xE01 })
        ));
    }

    #[test]
    fn test_runs_to_steady_state() {
        // V0 = 10; V0 += 5; jump to 0x200
        let mut chip8 = chip8_with(&[0x60, 0x0A, 0x70, 0x05, 0x12, 0x00]);
        chip8.run_cycles(3).unwrap();
        assert_eq!(chip8.state().v[0x0], 15);
        assert_eq!(chip8.state().pc, 0x200);
        // every pass through the loop ends in the same place
        assert_eq!(chip8.run_cycles(999).unwrap(), 999);
        assert_eq!(chip8.state().v[0x0], 15);
        assert_eq!(chip8.state().pc, 0x200);

        // with a jump to itself at 0x204 the program settles there for good
        let mut chip8 = chip8_with(&[0x60, 0x0A, 0x70, 0x05, 0x12, 0x04]);
        assert_eq!(chip8.run_cycles(1000).unwrap(), 1000);
        assert_eq!(chip8.state().v[0x0], 15);
        assert_eq!(chip8.state().pc, 0x204);
    }

    #[test]
    fn test_call_then_return_resumes_after_call() {
        // 0x200: call 0x206; 0x202: V1 = 1; 0x204: jump 0x204; 0x206: V2 = 2; 0x208: ret
        let mut chip8 = chip8_with(&[
            0x22, 0x06, 0x61, 0x01, 0x12, 0x04, 0x62, 0x02, 0x00, 0xEE,
        ]);
        chip8.step().unwrap();
        assert_eq!(chip8.state().pc, 0x206);
        assert_eq!(chip8.state().stack.len(), 1);
        chip8.run_cycles(2).unwrap();
        assert_eq!(chip8.state().pc, 0x202);
        assert!(chip8.state().stack.is_empty());
        chip8.step().unwrap();
        assert_eq!(chip8.state().v[0x1], 0x1);
        assert_eq!(chip8.state().v[0x2], 0x2);
    }

    #[test]
    fn test_waits_for_key_without_advancing() {
        let mut chip8 = chip8_with(&[0xF3, 0x0A]);
        assert_eq!(chip8.step(), Ok(Step::AwaitingKey));
        assert_eq!(chip8.step(), Ok(Step::AwaitingKey));
        assert_eq!(chip8.state().pc, 0x200);
        assert_eq!(chip8.run_cycles(10), Ok(0));

        chip8.key_press(0x9);
        assert_eq!(
            chip8.step(),
            Ok(Step::Executed(Instruction::Misc {
                op: Misc::AwaitKey,
                x: 0x3
            }))
        );
        assert_eq!(chip8.state().v[0x3], 0x9);
        assert_eq!(chip8.state().pc, 0x202);
    }

    #[test]
    fn test_unknown_opcode_is_fatal() {
        let mut chip8 = chip8_with(&[0x60, 0x01, 0x81, 0x28]);
        chip8.step().unwrap();
        assert_eq!(
            chip8.step(),
            Err(CpuError::UnknownOpcode { opcode: 0x8128 })
        );
        assert_eq!(chip8.state().pc, 0x202);
        assert_eq!(chip8.current_opcode(), 0x8128);
    }

    #[test]
    fn test_fetch_past_memory_is_out_of_bounds() {
        let mut chip8 = chip8_with(&[0x1F, 0xFF]);
        chip8.step().unwrap();
        assert_eq!(chip8.state().pc, 0xFFF);
        assert_eq!(
            chip8.step(),
            Err(CpuError::OutOfBounds { address: 0x1000 })
        );
    }

    #[test]
    fn test_failed_step_leaves_state_alone() {
        // V1 = 0xFF; ret with an empty stack
        let mut chip8 = chip8_with(&[0x61, 0xFF, 0x00, 0xEE]);
        chip8.step().unwrap();
        assert_eq!(chip8.step(), Err(CpuError::StackUnderflow));
        assert_eq!(chip8.state().pc, 0x202);
        assert_eq!(chip8.state().v[0x1], 0xFF);
    }

    #[test]
    fn test_redraw_flag_is_cleared_by_host() {
        // I = sprite 0; draw it at V0, V0
        let mut chip8 = chip8_with(&[0xA0, 0x50, 0xD0, 0x05]);
        chip8.step().unwrap();
        assert!(chip8.get_frame().is_none());
        chip8.step().unwrap();
        assert!(chip8.redraw_requested());
        assert_eq!(chip8.get_frame().map(|frame| frame.lit_count()), Some(14));
        chip8.clear_redraw();
        assert!(chip8.get_frame().is_none());
        assert_eq!(chip8.frame_buffer().lit_count(), 14);
    }

    #[test]
    fn test_keys_are_visible_to_skips() {
        // skip if key V0 (0) is pressed
        let mut chip8 = chip8_with(&[0xE0, 0x9E]);
        let mut keys = [false; KEY_COUNT];
        keys[0x0] = true;
        chip8.set_keys(keys);
        chip8.step().unwrap();
        assert_eq!(chip8.state().pc, 0x204);
        assert!(chip8.keypad().is_pressed(0x0));
        chip8.key_release(0x0);
        assert!(!chip8.keypad().is_pressed(0x0));
    }

    #[test]
    fn test_one_second_drains_timer() {
        // V0 = 60; DT = V0; ST = V0
        let mut chip8 = chip8_with(&[0x60, 0x3C, 0xF0, 0x15, 0xF0, 0x18]);
        chip8.run_cycles(3).unwrap();
        assert_eq!(chip8.delay_timer(), 60);

        let mut tones = Vec::new();
        for _ in 0..110 {
            tones.push(chip8.advance_timers(Duration::from_millis(10)));
        }
        assert_eq!(chip8.delay_timer(), 0);
        assert_eq!(chip8.sound_timer(), 0);
        assert_eq!(tones[0], Tone::Start);
        assert_eq!(tones.iter().filter(|&&tone| tone == Tone::Stop).count(), 1);
        assert_eq!(tones.last(), Some(&Tone::Silent));
    }

    #[test]
    fn test_timers_drain_at_sixty_hertz() {
        let mut chip8 = chip8_with(&[0x60, 0x3C, 0xF0, 0x15]);
        chip8.run_cycles(2).unwrap();
        chip8.advance_timers(Duration::from_millis(500));
        assert_eq!(chip8.delay_timer(), 30);
        chip8.advance_timers(Duration::from_millis(500));
        assert_eq!(chip8.delay_timer(), 0);
        chip8.advance_timers(Duration::from_secs(1));
        assert_eq!(chip8.delay_timer(), 0);
    }

    #[test]
    fn test_tick_timers() {
        let mut chip8 = chip8_with(&[0x60, 0x02, 0xF0, 0x18]);
        chip8.run_cycles(2).unwrap();
        assert!(chip8.is_sounding());
        chip8.tick_timers();
        chip8.tick_timers();
        assert!(!chip8.is_sounding());
    }

    #[test]
    fn test_reset_drops_program() {
        let mut chip8 = chip8_with(&[0x60, 0x0A]);
        chip8.step().unwrap();
        chip8.reset();
        assert_eq!(chip8.state().pc, 0x200);
        assert_eq!(chip8.state().v[0x0], 0x0);
        assert_eq!(chip8.state().memory.read_word(0x200).unwrap(), 0x0);
    }

    #[test]
    fn test_reset_while_sounding_stops_tone() {
        // V0 = 60; ST = V0
        let mut chip8 = chip8_with(&[0x60, 0x3C, 0xF0, 0x18]);
        chip8.run_cycles(2).unwrap();
        assert_eq!(chip8.advance_timers(Duration::from_millis(1)), Tone::Start);
        chip8.reset();
        assert_eq!(chip8.advance_timers(Duration::from_millis(1)), Tone::Stop);
        assert_eq!(chip8.advance_timers(Duration::from_millis(1)), Tone::Silent);
    }

    #[test]
    fn test_load_rom_stops_reading_past_limit() {
        let mut chip8 = Chip8::with_seed(0x8);
        let mut endless = io::repeat(0xAB);
        assert!(matches!(
            chip8.load_rom(&mut endless),
            Err(RomError::TooLarge { size }) if size == MAX_ROM_SIZE + 1
        ));
        assert_eq!(chip8.state().memory.read_word(0x200).unwrap(), 0x0);
    }

    #[test]
    fn test_huge_elapsed_time_drains_timers() {
        let mut chip8 = chip8_with(&[0x60, 0xFF, 0xF0, 0x15, 0xF0, 0x18]);
        chip8.run_cycles(3).unwrap();
        assert_eq!(chip8.advance_timers(Duration::MAX), Tone::Silent);
        assert_eq!(chip8.delay_timer(), 0);
        assert_eq!(chip8.sound_timer(), 0);
        chip8.advance_timers(Duration::MAX);
        assert_eq!(chip8.delay_timer(), 0);
    }

    #[test]
    fn test_alu_steps_report_their_instruction() {
        let mut chip8 = chip8_with(&[0x81, 0x24]);
        assert_eq!(
            chip8.step(),
            Ok(Step::Executed(Instruction::Alu {
                op: Alu::AddCarry,
                x: 0x1,
                y: 0x2
            }))
        );
    }
}
