/// Bytes of addressable memory.
pub const MEMORY_SIZE: usize = 4096;

/// Address at which ROMs are loaded and execution begins.
pub const PROGRAM_START: u16 = 0x200;

/// Largest ROM that fits between `PROGRAM_START` and the end of memory.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Address of the first glyph in the sprite sheet.
pub const SPRITE_SHEET_START: u16 = 0x000;

/// Height in bytes (rows) of a single sprite sheet glyph.
pub const SPRITE_HEIGHT: u16 = 5;

/// Hexadecimal glyphs 0..F, five rows of four pixels each.
///
/// Each row is stored in the high nibble of its byte, e.g. `0`:
/// ```text
/// 11110000
/// 10010000
/// 10010000
/// 10010000
/// 11110000
/// ```
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Number of return addresses the call stack can hold.
pub const STACK_DEPTH: usize = 16;

/// Index of the flag register VF.
pub const FLAG: usize = 0xF;

/// Number of keys on the hexadecimal keypad.
pub const KEY_COUNT: usize = 16;

/// Number of executed instructions kept for inspection.
pub const HISTORY_DEPTH: usize = 32;

/// Nanoseconds per CPU cycle (500Hz). Used by hosts that pace execution.
pub const CLOCK_SPEED: u64 = 2_000_000;
