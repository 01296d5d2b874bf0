use log::warn;

use crate::constants::KEY_COUNT;

/// # Keypad
/// Pressed status of the 16 hexadecimal keys 0..F.
///
/// Written by the host; the CPU only ever reads it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pressed status of `key`; keys outside 0..F are ignored
    pub fn set(&mut self, key: u8, pressed: bool) {
        match self.keys.get_mut(key as usize) {
            Some(slot) => *slot = pressed,
            None => warn!("ignoring key {:#04X} which isn't on the keypad", key),
        }
    }

    pub fn press(&mut self, key: u8) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: u8) {
        self.set(key, false);
    }

    /// Whether `key` is held down; keys outside 0..F never are
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// The lowest numbered key that is held down
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&pressed| pressed).map(|key| key as u8)
    }
}

impl From<[bool; KEY_COUNT]> for Keypad {
    fn from(keys: [bool; KEY_COUNT]) -> Self {
        Keypad { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut keypad = Keypad::new();
        keypad.press(0xE);
        assert!(keypad.is_pressed(0xE));
        keypad.release(0xE);
        assert!(!keypad.is_pressed(0xE));
    }

    #[test]
    fn test_first_pressed_is_lowest_key() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_pressed(), None);
        keypad.press(0xC);
        keypad.press(0x3);
        assert_eq!(keypad.first_pressed(), Some(0x3));
    }

    #[test]
    fn test_ignores_keys_off_the_pad() {
        let mut keypad = Keypad::new();
        keypad.press(0x10);
        assert_eq!(keypad, Keypad::new());
    }

    #[test]
    fn test_keys_off_the_pad_are_never_pressed() {
        let keypad = Keypad::from([true; KEY_COUNT]);
        assert!(keypad.is_pressed(0x1));
        assert!(!keypad.is_pressed(0x10));
        assert!(!keypad.is_pressed(0x21));
        assert!(!keypad.is_pressed(0xFF));
    }
}
