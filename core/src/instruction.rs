use std::fmt;

use crate::error::Error;
use crate::operations::*;

/// Every operation the interpreter understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Cls,
    Ret,
    Jp,
    Call,
    SeVxByte,
    SneVxByte,
    SeVxVy,
    LdVxByte,
    AddVxByte,
    LdVxVy,
    Or,
    And,
    Xor,
    AddVxVy,
    Sub,
    Shr,
    Subn,
    Shl,
    SneVxVy,
    LdI,
    JpV0,
    Rnd,
    Drw,
    Skp,
    Sknp,
    LdVxDt,
    LdVxK,
    LdDtVx,
    LdStVx,
    AddIVx,
    LdFVx,
    LdBVx,
    LdIVx,
    LdVxI,
}

/// Describes one operation: the key it is decoded from, how it reads in
/// assembly, and the function that executes it.
#[derive(Copy, Clone)]
pub struct Descriptor {
    /// The opcode with every operand nibble zeroed, see `key`.
    pub pattern: u16,
    pub operation: Operation,
    pub mnemonic: &'static str,
    pub description: &'static str,
    pub(crate) handler: Handler,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("pattern", &format_args!("{:#06X}", self.pattern))
            .field("operation", &self.operation)
            .field("mnemonic", &self.mnemonic)
            .finish()
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.operation == other.operation
    }
}

impl Eq for Descriptor {}

macro_rules! op {
    ($pattern:expr, $operation:ident, $mnemonic:expr, $description:expr, $handler:ident) => {
        Descriptor {
            pattern: $pattern,
            operation: Operation::$operation,
            mnemonic: $mnemonic,
            description: $description,
            handler: $handler,
        }
    };
}

/// The opcode table, sorted by `pattern`.
pub static OPCODES: [Descriptor; 34] = [
    op!(0x00E0, Cls, "CLS", "Clear the display", clr),
    op!(0x00EE, Ret, "RET", "Return from a subroutine", rts),
    op!(0x1000, Jp, "JP addr", "Jump to addr", jump),
    op!(0x2000, Call, "CALL addr", "Call the subroutine at addr", call),
    op!(0x3000, SeVxByte, "SE Vx, byte", "Skip the next instruction if Vx == byte", ske),
    op!(0x4000, SneVxByte, "SNE Vx, byte", "Skip the next instruction if Vx != byte", skne),
    op!(0x5000, SeVxVy, "SE Vx, Vy", "Skip the next instruction if Vx == Vy", skre),
    op!(0x6000, LdVxByte, "LD Vx, byte", "Set Vx = byte", load),
    op!(0x7000, AddVxByte, "ADD Vx, byte", "Set Vx = Vx + byte", add),
    op!(0x8000, LdVxVy, "LD Vx, Vy", "Set Vx = Vy", mv),
    op!(0x8001, Or, "OR Vx, Vy", "Set Vx = Vx OR Vy", or),
    op!(0x8002, And, "AND Vx, Vy", "Set Vx = Vx AND Vy", and),
    op!(0x8003, Xor, "XOR Vx, Vy", "Set Vx = Vx XOR Vy", xor),
    op!(0x8004, AddVxVy, "ADD Vx, Vy", "Set Vx = Vx + Vy, VF = carry", addr),
    op!(0x8005, Sub, "SUB Vx, Vy", "Set Vx = Vx - Vy, VF = Vx > Vy", sub),
    op!(0x8006, Shr, "SHR Vx", "Set Vx = Vx >> 1, VF = least significant bit", shr),
    op!(0x8007, Subn, "SUBN Vx, Vy", "Set Vx = Vy - Vx, VF = Vx > Vy", subn),
    op!(0x800E, Shl, "SHL Vx", "Set Vx = Vx << 1, VF = most significant bit", shl),
    op!(0x9000, SneVxVy, "SNE Vx, Vy", "Skip the next instruction if Vx != Vy", skrne),
    op!(0xA000, LdI, "LD I, addr", "Set I = addr", loadi),
    op!(0xB000, JpV0, "JP V0, addr", "Jump to addr + V0", jumpi),
    op!(0xC000, Rnd, "RND Vx, byte", "Set Vx = random byte AND byte", rnd),
    op!(0xD000, Drw, "DRW Vx, Vy, nibble", "Draw the n-byte sprite at I at (Vx, Vy), VF = collision", draw),
    op!(0xE09E, Skp, "SKP Vx", "Skip the next instruction if key Vx is pressed", skpr),
    op!(0xE0A1, Sknp, "SKNP Vx", "Skip the next instruction if key Vx is not pressed", skup),
    op!(0xF007, LdVxDt, "LD Vx, DT", "Set Vx = delay timer", moved),
    op!(0xF00A, LdVxK, "LD Vx, K", "Wait for a key press and store its code in Vx", keyd),
    op!(0xF015, LdDtVx, "LD DT, Vx", "Set delay timer = Vx", loads),
    op!(0xF018, LdStVx, "LD ST, Vx", "Set sound timer = Vx", ld),
    op!(0xF01E, AddIVx, "ADD I, Vx", "Set I = I + Vx", addi),
    op!(0xF029, LdFVx, "LD F, Vx", "Set I = address of the glyph for digit Vx", ldspr),
    op!(0xF033, LdBVx, "LD B, Vx", "Store the BCD digits of Vx at I, I+1 and I+2", bcd),
    op!(0xF055, LdIVx, "LD [I], Vx", "Store V0..Vx in memory starting at I", stor),
    op!(0xF065, LdVxI, "LD Vx, [I]", "Read V0..Vx from memory starting at I", read),
];

/// Reduces an opcode to the key of its table entry.
///
/// The top nibble selects a family. Families `0`, `E` and `F` pick their
/// variant with the low byte, family `8` with the last nibble, and every other
/// family holds a single operation.
pub fn key(op: u16) -> u16 {
    match op & 0xF000 {
        0x0000 | 0xE000 | 0xF000 => op & 0xF0FF,
        0x8000 => op & 0xF00F,
        family => family,
    }
}

/// Selects the Descriptor for a given opcode.
pub fn decode(op: u16) -> Result<&'static Descriptor, Error> {
    let key = key(op);
    OPCODES
        .binary_search_by_key(&key, |descriptor| descriptor.pattern)
        .map(|index| &OPCODES[index])
        .map_err(|_| Error::UnknownOpcode(op))
}
