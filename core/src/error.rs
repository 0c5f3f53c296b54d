use crate::constants::MAX_ROM_SIZE;

/// Everything that can go wrong while loading or running a program.
///
/// `UnknownOpcode` is recoverable: the engine logs it and moves on. Every
/// other variant raised during a cycle halts the engine until `reset`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),

    #[error("memory access out of bounds at {address:#05X} (pc {pc:#05X}, opcode {opcode:04X?})")]
    OutOfBoundsMemoryAccess {
        address: usize,
        pc: u16,
        /// `None` when the fault happened while fetching the opcode itself.
        opcode: Option<u16>,
    },

    #[error("ROM is {size} bytes but at most {} fit in memory", MAX_ROM_SIZE)]
    RomTooLarge { size: usize },

    #[error("call stack overflow at {pc:#05X} (opcode {opcode:#06X})")]
    StackOverflow { pc: u16, opcode: u16 },

    #[error("return with an empty call stack at {pc:#05X} (opcode {opcode:#06X})")]
    StackUnderflow { pc: u16, opcode: u16 },

    #[error("machine is halted")]
    Halted,
}
