use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// The FrameBuffer is indexed as [y][x]; every cell is 0 or 1.
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// # Display
/// The 64x32 monochrome display plane.
///
/// Sprites are XORed onto the plane one byte (row of eight pixels) at a time.
/// Pixels that land outside the plane are clipped rather than wrapped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Display {
    frame_buffer: FrameBuffer,
}

impl Display {
    pub fn new() -> Self {
        Display {
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    /// Unset every pixel.
    pub fn clear(&mut self) {
        self.frame_buffer = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// XORs `sprite` onto the plane with its top left corner at (`x`, `y`).
    ///
    /// Returns true if any pixel went from set to unset.
    ///
    /// # Arguments
    /// * `x` the column of the sprite's leftmost pixel
    /// * `y` the row of the sprite's first byte
    /// * `sprite` one byte per row, most significant bit leftmost
    pub fn draw(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (row, byte) in sprite.iter().enumerate() {
            let py = y + row;
            if py >= DISPLAY_HEIGHT {
                break;
            }
            for bit in 0..8 {
                let px = x + bit;
                if px >= DISPLAY_WIDTH {
                    break;
                }
                let pixel = (byte >> (7 - bit)) & 0x1;
                let cell = &mut self.frame_buffer[py][px];
                collision |= pixel & *cell == 0x1;
                *cell ^= pixel;
            }
        }

        collision
    }

    /// The value (0 or 1) of the pixel at (`x`, `y`), or None off the plane.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        self.frame_buffer.get(y)?.get(x).copied()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
