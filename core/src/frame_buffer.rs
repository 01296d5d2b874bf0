use std::fmt;

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// # Frame Buffer
/// The contents of the 64x32 monochrome display, indexed as `[y][x]`.
///
/// Sprites are XORed onto the buffer and wrap around both edges of the screen.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// Whether the pixel at (x, y) is lit; coordinates wrap like sprite drawing does
    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        self.pixels[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH]
    }

    pub fn set(&mut self, x: usize, y: usize, lit: bool) {
        self.pixels[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH] = lit;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; DISPLAY_WIDTH]> {
        self.pixels.iter()
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|&&lit| lit).count()
    }

    /// XORs `sprite` onto the buffer with its top left corner at (x, y).
    ///
    /// Each byte of `sprite` is one row of 8 pixels, most significant bit leftmost.
    /// Pixels falling off an edge wrap around to the opposite one.
    ///
    /// Returns whether any lit pixel was switched off (a collision).
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            let y = (y as usize + row) % DISPLAY_HEIGHT;
            for bit in 0..8 {
                if (byte >> (7 - bit)) & 0x1 == 0 {
                    continue;
                }
                let x = (x as usize + bit) % DISPLAY_WIDTH;
                let pixel = &mut self.pixels[y][x];
                collision |= *pixel;
                *pixel ^= true;
            }
        }
        collision
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders lit pixels as `#` and unlit pixels as `.`, one line per row
impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&lit| if lit { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
