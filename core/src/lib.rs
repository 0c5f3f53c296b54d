pub use chip8::{Chip8, Cycle, HistoryEntry, Status};
pub use constants::CLOCK_SPEED;
pub use display::{Display, FrameBuffer};
pub use error::Error;
pub use instruction::{decode, Descriptor, Operation};
pub use keypad::Keypad;

mod chip8;
pub mod constants;
mod display;
mod error;
pub mod instruction;
mod keypad;
mod opcode;
mod operations;
pub mod state;
