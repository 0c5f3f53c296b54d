use std::ops::Range;

use crate::constants::{
    MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET, SPRITE_SHEET_START, STACK_DEPTH,
};
use crate::display::Display;
use crate::error::Error;

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the flag register
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the number of return addresses on the stack
///
/// Timers
/// - 2 8-bit timer registers (delay & sound)
///     - they hold whatever was last written to them; nothing counts them down
///
/// ## Memory
/// - 16 entry stack of return addresses
/// - 4096 bytes of addressable memory
/// - 64x32 display plane
///
/// ## Input
/// - Emulation halts until a key's value is written to `register_needing_key`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub display: Display,
    pub draw_flag: bool,
    pub register_needing_key: Option<usize>,
}

impl State {
    pub fn new() -> Self {
        // 0x000 - 0x050 is reserved for a sprite sheet
        let mut memory = [0; MEMORY_SIZE];
        let sheet = usize::from(SPRITE_SHEET_START);
        memory[sheet..sheet + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            display: Display::new(),
            draw_flag: false,
            register_needing_key: None,
        }
    }

    /// Gets the opcode currently pointed at by the pc.
    ///
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Result<u16, Error> {
        let range = self.span(self.pc, 2, None)?;
        let left = u16::from(self.memory[range.start]);
        let right = u16::from(self.memory[range.start + 1]);
        Ok(left << 8 | right)
    }

    /// The memory range `start..start + len`, provided it lies entirely in memory.
    ///
    /// # Arguments
    /// * `start` the first address of the range
    /// * `len` the number of bytes in the range
    /// * `opcode` the instruction accessing the range, for diagnostics
    pub fn span(&self, start: u16, len: usize, opcode: Option<u16>) -> Result<Range<usize>, Error> {
        let start = usize::from(start);
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(Error::OutOfBoundsMemoryAccess {
                address: start.max(MEMORY_SIZE),
                pc: self.pc,
                opcode,
            });
        }
        Ok(start..end)
    }

    /// Push the current pc as a return address.
    pub fn push(&mut self, opcode: u16) -> Result<(), Error> {
        if self.sp == STACK_DEPTH {
            return Err(Error::StackOverflow {
                pc: self.pc,
                opcode,
            });
        }
        self.stack[self.sp] = self.pc;
        self.sp += 1;
        Ok(())
    }

    /// Pop the most recently pushed return address.
    pub fn pop(&mut self, opcode: u16) -> Result<u16, Error> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow {
                pc: self.pc,
                opcode,
            });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
