use std::collections::VecDeque;

use log::{debug, error, trace, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::constants::{HISTORY_DEPTH, MAX_ROM_SIZE, PROGRAM_START};
use crate::display::{Display, FrameBuffer};
use crate::error::Error;
use crate::instruction::{decode, Descriptor};
use crate::keypad::Keypad;
use crate::operations::Context;
use crate::state::State;

/// Where the interpreter is in its run cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// `cycle` does nothing until `resume`; `step` still executes.
    Paused,
    /// An `LD Vx, K` is waiting for any key to be held.
    WaitingForKey,
    /// A structural fault stopped execution until the next `reset`.
    HaltedByError(Error),
}

/// What a single call to `cycle` or `step` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cycle {
    /// An instruction executed.
    Executed(&'static Descriptor),
    /// The word at the pc didn't decode; it was skipped.
    Skipped(u16),
    Paused,
    /// Still waiting; no key is held.
    WaitingForKey,
    /// The pending `LD Vx, K` received this key code.
    KeyReceived(u8),
}

/// An executed instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub pc: u16,
    pub opcode: u16,
    pub descriptor: &'static Descriptor,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - `history` of the most recently executed instructions
///  - `keypad` with public interfaces for manipulating it
///  - the loaded `rom` so that `reset` can start it over
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the CPU, pausing and resuming it
/// - inspecting registers, history and the display for rendering by some host
pub struct Chip8<R = StdRng> {
    state: State,
    keypad: Keypad,
    rng: R,
    initial_rng: R,
    rom: Vec<u8>,
    paused: bool,
    fault: Option<Error>,
    current: Option<&'static Descriptor>,
    history: VecDeque<HistoryEntry>,
}

impl Chip8<StdRng> {
    /// A machine whose random numbers are seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A machine whose random numbers are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Chip8<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + Clone> Chip8<R> {
    /// A machine drawing its random numbers from `rng`.
    ///
    /// `reset` rewinds the generator to this starting point.
    pub fn with_rng(rng: R) -> Self {
        Chip8 {
            state: State::new(),
            keypad: Keypad::new(),
            initial_rng: rng.clone(),
            rng,
            rom: Vec::new(),
            paused: false,
            fault: None,
            current: None,
            history: VecDeque::with_capacity(HISTORY_DEPTH),
        }
    }

    /// Load a rom, replacing any previously loaded one, and reset the machine.
    ///
    /// A rom that doesn't fit in memory is refused and nothing changes.
    ///
    /// # Arguments
    /// * `rom` the program's bytes, copied to memory starting at 0x200
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Error::RomTooLarge { size: rom.len() });
        }
        self.rom = rom.to_vec();
        debug!("loaded {} byte rom", rom.len());
        self.reset();
        Ok(())
    }

    /// Restore the machine to the moment the current rom was loaded.
    pub fn reset(&mut self) {
        let mut state = State::new();
        let start = usize::from(PROGRAM_START);
        state.memory[start..start + self.rom.len()].copy_from_slice(&self.rom);

        self.state = state;
        self.keypad = Keypad::new();
        self.rng = self.initial_rng.clone();
        self.paused = false;
        self.fault = None;
        self.current = None;
        self.history.clear();
        debug!("reset");
    }

    pub fn pause(&mut self) {
        if self.fault.is_none() && !self.paused {
            self.paused = true;
            debug!("paused at {:#05X}", self.state.pc);
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            debug!("resumed at {:#05X}", self.state.pc);
        }
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the key code (0..F) that was pressed; anything else is ignored
    pub fn key_press(&mut self, key: u8) {
        if !self.keypad.set_pressed(key, true) {
            debug!("ignoring press of undefined key {:#04X}", key);
        }
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the key code (0..F) that was released; anything else is ignored
    pub fn key_release(&mut self, key: u8) {
        if !self.keypad.set_released(key) {
            debug!("ignoring release of undefined key {:#04X}", key);
        }
    }

    /// Advances the CPU by a single cycle unless paused.
    pub fn cycle(&mut self) -> Result<Cycle, Error> {
        if self.fault.is_none() && self.paused {
            return Ok(Cycle::Paused);
        }
        self.advance_cpu()
    }

    /// Advances the CPU by a single cycle even if paused.
    pub fn step(&mut self) -> Result<Cycle, Error> {
        self.advance_cpu()
    }

    /// Advances the CPU by a single cycle
    /// - refuses if halted
    /// - delivers a held key if awaiting a keypress, or does nothing
    /// - otherwise gets, decodes and executes the next opcode
    fn advance_cpu(&mut self) -> Result<Cycle, Error> {
        if self.fault.is_some() {
            return Err(Error::Halted);
        }

        if let Some(register) = self.state.register_needing_key {
            return Ok(match self.keypad.lowest_pressed() {
                Some(key) => {
                    self.state.v[register] = key;
                    self.state.register_needing_key = None;
                    Cycle::KeyReceived(key)
                }
                None => Cycle::WaitingForKey,
            });
        }

        let pc = self.state.pc;
        let opcode = match self.state.fetch() {
            Ok(opcode) => opcode,
            Err(e) => return Err(self.halt(e)),
        };
        trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            opcode,
            self.state.v,
            self.state.i,
            pc
        );

        let descriptor = match decode(opcode) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("{} at {:#05X}, skipping", e, pc);
                self.current = None;
                self.state.pc = pc.wrapping_add(0x2);
                return Ok(Cycle::Skipped(opcode));
            }
        };

        let mut ctx = Context {
            keypad: &self.keypad,
            rng: &mut self.rng,
        };
        match (descriptor.handler)(&opcode, &self.state, &mut ctx) {
            Ok(state) => self.state = state,
            Err(e) => return Err(self.halt(e)),
        }
        self.state.pc = self.state.pc.wrapping_add(0x2);
        self.record(pc, opcode, descriptor);
        Ok(Cycle::Executed(descriptor))
    }

    /// Stops execution until the next reset.
    fn halt(&mut self, error: Error) -> Error {
        error!("halting: {}", error);
        self.fault = Some(error);
        error
    }

    /// Puts an executed instruction in the history
    /// - if there are already HISTORY_DEPTH entries then the oldest is dropped
    fn record(&mut self, pc: u16, opcode: u16, descriptor: &'static Descriptor) {
        if self.history.len() == HISTORY_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            pc,
            opcode,
            descriptor,
        });
        self.current = Some(descriptor);
    }

    pub fn status(&self) -> Status {
        if let Some(error) = self.fault {
            Status::HaltedByError(error)
        } else if self.paused {
            Status::Paused
        } else if self.state.register_needing_key.is_some() {
            Status::WaitingForKey
        } else {
            Status::Running
        }
    }

    /// V0..VF
    pub fn registers(&self) -> [u8; 16] {
        self.state.v
    }

    pub fn index(&self) -> u16 {
        self.state.i
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    /// Return addresses on the call stack, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.state.stack[..self.state.sp]
    }

    /// The most recently executed instruction, if the last cycle executed one.
    pub fn current_descriptor(&self) -> Option<&'static Descriptor> {
        self.current
    }

    /// Recently executed instructions, newest last.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.history.iter()
    }

    pub fn display(&self) -> &Display {
        &self.state.display
    }

    /// Returns the FrameBuffer if the display changed since the last call
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(*self.state.display.frame_buffer())
        } else {
            None
        }
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MEMORY_SIZE, STACK_DEPTH};
    use crate::instruction::Operation;

    fn with_rom(rom: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::seeded(0x5EED);
        chip8.load_rom(rom).unwrap();
        chip8
    }

    fn run(chip8: &mut Chip8, cycles: usize) {
        for _ in 0..cycles {
            chip8.cycle().unwrap();
        }
    }

    #[test]
    fn test_cycles_advance_pc() {
        let mut chip8 = with_rom(&[0x00, 0xE0]);
        let starting_pc = chip8.pc();
        let cycle = chip8.cycle().unwrap();
        assert_eq!(chip8.pc(), starting_pc + 0x2);
        assert!(matches!(cycle, Cycle::Executed(d) if d.operation == Operation::Cls));
    }

    #[test]
    fn test_jump_lands_on_target() {
        let mut chip8 = with_rom(&[0x13, 0x00]);
        chip8.cycle().unwrap();
        assert_eq!(chip8.pc(), 0x300);
    }

    #[test]
    fn test_call_then_return() {
        let mut rom = vec![0; 0x202];
        // 0x300: CALL 0x400
        rom[0x100..0x102].copy_from_slice(&[0x24, 0x00]);
        // 0x400: RET
        rom[0x200..0x202].copy_from_slice(&[0x00, 0xEE]);
        let mut chip8 = with_rom(&rom);
        chip8.state.pc = 0x300;

        chip8.cycle().unwrap();
        assert_eq!(chip8.pc(), 0x400);
        assert_eq!(chip8.stack(), &[0x300]);

        chip8.cycle().unwrap();
        assert_eq!(chip8.pc(), 0x302);
        assert!(chip8.stack().is_empty());
    }

    #[test]
    fn test_skip() {
        // SE V0, 0x00; (skipped); CLS
        let mut chip8 = with_rom(&[0x30, 0x00, 0x12, 0x00, 0x00, 0xE0]);
        chip8.cycle().unwrap();
        assert_eq!(chip8.pc(), 0x204);
    }

    #[test]
    fn test_unknown_opcode_is_skipped() {
        let mut chip8 = with_rom(&[0x01, 0x23, 0x60, 0x42]);
        assert_eq!(chip8.cycle(), Ok(Cycle::Skipped(0x0123)));
        assert_eq!(chip8.pc(), 0x202);
        assert_eq!(chip8.status(), Status::Running);
        assert_eq!(chip8.current_descriptor(), None);
        assert_eq!(chip8.history().count(), 0);

        chip8.cycle().unwrap();
        assert_eq!(chip8.registers()[0x0], 0x42);
    }

    #[test]
    fn test_fetch_out_of_bounds_halts() {
        let mut chip8 = with_rom(&[0x1F, 0xFF]);
        chip8.cycle().unwrap();
        assert_eq!(chip8.pc(), 0xFFF);

        let expected = Error::OutOfBoundsMemoryAccess {
            address: MEMORY_SIZE,
            pc: 0xFFF,
            opcode: None,
        };
        assert_eq!(chip8.cycle(), Err(expected));
        assert_eq!(chip8.status(), Status::HaltedByError(expected));
        assert_eq!(chip8.cycle(), Err(Error::Halted));
        assert_eq!(chip8.step(), Err(Error::Halted));
        assert_eq!(chip8.pc(), 0xFFF);
    }

    #[test]
    fn test_stack_overflow_halts() {
        // 0x200: CALL 0x200, forever
        let mut chip8 = with_rom(&[0x22, 0x00]);
        run(&mut chip8, STACK_DEPTH);
        assert_eq!(chip8.stack().len(), STACK_DEPTH);
        assert_eq!(
            chip8.cycle(),
            Err(Error::StackOverflow {
                pc: 0x200,
                opcode: 0x2200
            })
        );
        assert!(matches!(chip8.status(), Status::HaltedByError(_)));
        assert_eq!(chip8.stack().len(), STACK_DEPTH);
    }

    #[test]
    fn test_stack_underflow_halts() {
        let mut chip8 = with_rom(&[0x00, 0xEE]);
        assert!(matches!(
            chip8.cycle(),
            Err(Error::StackUnderflow { pc: 0x200, .. })
        ));
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn test_block_copy_out_of_bounds_halts_without_writing() {
        // LD I, 0xFFE; LD V2, 0xAA; LD [I], V2
        let mut chip8 = with_rom(&[0xAF, 0xFE, 0x62, 0xAA, 0xF2, 0x55]);
        run(&mut chip8, 2);
        assert!(matches!(
            chip8.cycle(),
            Err(Error::OutOfBoundsMemoryAccess {
                opcode: Some(0xF255),
                ..
            })
        ));
        assert_eq!(chip8.state().memory[0xFFE..], [0x0, 0x0]);
    }

    #[test]
    fn test_rom_too_large_is_refused() {
        // LD V0, 0x01; CALL 0x206; ...; 0x206: LD I, 0x123
        let first = [0x60, 0x01, 0x22, 0x06, 0x00, 0x00, 0xA1, 0x23];
        let mut chip8 = with_rom(&first);
        run(&mut chip8, 3);
        let before = *chip8.state();
        let history: Vec<HistoryEntry> = chip8.history().copied().collect();

        let rom = vec![0; MAX_ROM_SIZE + 1];
        assert_eq!(
            chip8.load_rom(&rom),
            Err(Error::RomTooLarge {
                size: MAX_ROM_SIZE + 1
            })
        );
        assert_eq!(chip8.rom(), &first);
        assert_eq!(chip8.state(), &before);
        assert_eq!(chip8.pc(), 0x208);
        assert_eq!(chip8.index(), 0x123);
        assert_eq!(chip8.stack(), &[0x202]);
        assert_eq!(chip8.history().copied().collect::<Vec<_>>(), history);
    }

    #[test]
    fn test_loading_another_rom_resets() {
        // LD V0, 0x01; CALL 0x206; ...; 0x206: LD I, 0x123
        let first = [0x60, 0x01, 0x22, 0x06, 0x00, 0x00, 0xA1, 0x23];
        let mut chip8 = with_rom(&first);
        chip8.pause();
        run(&mut chip8, 1);
        chip8.resume();
        run(&mut chip8, 3);
        assert_eq!(chip8.stack().len(), 1);

        let second = [0x61, 0x42];
        chip8.load_rom(&second).unwrap();
        assert_eq!(chip8.rom(), &second);
        assert_eq!(chip8.pc(), 0x200);
        assert_eq!(chip8.index(), 0);
        assert_eq!(chip8.registers(), [0; 16]);
        assert!(chip8.stack().is_empty());
        assert_eq!(chip8.history().count(), 0);
        assert_eq!(chip8.current_descriptor(), None);
        assert_eq!(chip8.status(), Status::Running);
        assert_eq!(chip8.state().memory[0x200..0x202], second);
        // nothing of the longer rom survives past the new one
        assert_eq!(chip8.state().memory[0x202..0x208], [0; 6]);

        chip8.cycle().unwrap();
        assert_eq!(chip8.registers()[0x1], 0x42);
    }

    #[test]
    fn test_largest_rom_fits() {
        let mut chip8 = Chip8::seeded(0);
        let rom = vec![0xAB; MAX_ROM_SIZE];
        assert_eq!(chip8.load_rom(&rom), Ok(()));
        assert_eq!(chip8.state().memory[MEMORY_SIZE - 1], 0xAB);
    }

    #[test]
    fn test_key_wait_resolves_to_lowest_key() {
        let mut chip8 = with_rom(&[0xF5, 0x0A, 0x00, 0xE0]);
        chip8.cycle().unwrap();
        assert_eq!(chip8.status(), Status::WaitingForKey);
        assert_eq!(chip8.pc(), 0x202);

        assert_eq!(chip8.cycle(), Ok(Cycle::WaitingForKey));
        assert_eq!(chip8.pc(), 0x202);

        chip8.key_press(0x7);
        chip8.key_press(0x3);
        assert_eq!(chip8.cycle(), Ok(Cycle::KeyReceived(0x3)));
        assert_eq!(chip8.registers()[0x5], 0x3);
        assert_eq!(chip8.status(), Status::Running);
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut chip8 = with_rom(&[0x60, 0x01, 0x61, 0x02, 0x62, 0x03]);
        chip8.pause();
        assert_eq!(chip8.status(), Status::Paused);
        assert_eq!(chip8.cycle(), Ok(Cycle::Paused));
        assert_eq!(chip8.pc(), 0x200);

        // stepping while paused runs exactly one cycle and stays paused
        chip8.step().unwrap();
        assert_eq!(chip8.pc(), 0x202);
        assert_eq!(chip8.status(), Status::Paused);

        chip8.resume();
        chip8.cycle().unwrap();
        assert_eq!(chip8.registers()[0x1], 0x02);
        assert_eq!(chip8.status(), Status::Running);
    }

    #[test]
    fn test_keys_outside_keypad_are_ignored() {
        let mut chip8 = with_rom(&[]);
        chip8.key_press(0x10);
        assert_eq!(chip8.keypad(), &Keypad::new());
        chip8.key_press(0xF);
        chip8.key_release(0xF);
        assert_eq!(chip8.keypad(), &Keypad::new());
    }

    #[test]
    fn test_history_is_bounded_newest_last() {
        // ADD V0, 1; JP 0x200
        let mut chip8 = with_rom(&[0x70, 0x01, 0x12, 0x00]);
        run(&mut chip8, HISTORY_DEPTH + 3);
        let history: Vec<&HistoryEntry> = chip8.history().collect();
        assert_eq!(history.len(), HISTORY_DEPTH);
        let newest = history[HISTORY_DEPTH - 1];
        assert_eq!(newest.pc, 0x200);
        assert_eq!(newest.opcode, 0x7001);
        assert_eq!(newest.descriptor.operation, Operation::AddVxByte);
        assert_eq!(chip8.current_descriptor(), Some(newest.descriptor));
    }

    #[test]
    fn test_take_frame_once_per_change() {
        // LD F, V0; DRW V0, V0, 5
        let mut chip8 = with_rom(&[0xF0, 0x29, 0xD0, 0x05]);
        assert_eq!(chip8.take_frame(), None);
        run(&mut chip8, 2);
        let frame = chip8.take_frame().unwrap();
        assert_eq!(frame[0][0..4], [1, 1, 1, 1]);
        assert_eq!(chip8.take_frame(), None);
        assert_eq!(chip8.display().pixel(0, 0), Some(1));
    }

    #[test]
    fn test_reset_restores_initial_state_and_keeps_rom() {
        // LD V1, 0x12; CALL 0x208; ...; 0x208: LD [I], V1
        let rom = [0x61, 0x12, 0x22, 0x08, 0x00, 0x00, 0x00, 0x00, 0xF1, 0x55];
        let mut chip8 = with_rom(&rom);
        let fresh = *chip8.state();
        chip8.key_press(0x4);
        run(&mut chip8, 3);
        assert_ne!(chip8.state(), &fresh);

        chip8.reset();
        assert_eq!(chip8.state(), &fresh);
        assert_eq!(chip8.registers(), [0; 16]);
        assert_eq!(chip8.pc(), 0x200);
        assert!(chip8.stack().is_empty());
        assert_eq!(chip8.keypad(), &Keypad::new());
        assert_eq!(chip8.history().count(), 0);
        assert_eq!(chip8.rom(), &rom);

        let cycle = chip8.cycle().unwrap();
        assert!(matches!(cycle, Cycle::Executed(d) if d.operation == Operation::LdVxByte));
        assert_eq!(chip8.registers()[0x1], 0x12);
    }

    #[test]
    fn test_reset_clears_halt() {
        let mut chip8 = with_rom(&[0x00, 0xEE]);
        assert!(chip8.cycle().is_err());
        chip8.reset();
        assert_eq!(chip8.status(), Status::Running);
        assert!(chip8.cycle().is_err());
    }

    #[test]
    fn test_runs_are_deterministic_across_reset() {
        // 0x200: RND V0, 0x3F
        // 0x202: RND V1, 0x1F
        // 0x204: LD F, V2
        // 0x206: DRW V0, V1, 5
        // 0x208: ADD V2, 1
        // 0x20A: JP 0x200
        let rom = [
            0xC0, 0x3F, 0xC1, 0x1F, 0xF2, 0x29, 0xD0, 0x15, 0x72, 0x01, 0x12, 0x00,
        ];
        let mut chip8 = with_rom(&rom);
        run(&mut chip8, 600);
        let first = *chip8.state();

        chip8.reset();
        run(&mut chip8, 600);
        assert_eq!(chip8.state(), &first);
    }

    #[test]
    fn test_machines_with_the_same_seed_agree() {
        let rom = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = with_rom(&rom);
        let mut b = with_rom(&rom);
        run(&mut a, 3);
        run(&mut b, 3);
        assert_eq!(a.registers(), b.registers());
    }
}
