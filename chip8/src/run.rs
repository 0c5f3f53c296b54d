use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn};

use emu8::{Chip8, Cycle, CLOCK_SPEED};

use crate::keymap::keymap;
use crate::render::frame_to_text;

#[derive(Parser, Debug)]
#[command(name = "chip8")]
#[command(about = "Runs a Chip-8 ROM without a window and prints its display", long_about = None)]
pub struct Args {
    /// Path to the ROM image
    pub rom: PathBuf,

    /// Number of cycles to execute
    #[arg(long, default_value_t = 1_000)]
    pub cycles: u64,

    /// Seed for RND; a fresh one is drawn from the OS when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keys held down for the whole run, typed on the 1234/qwer/asdf/zxcv block
    #[arg(long, default_value = "")]
    pub keys: String,

    /// Pace execution at the Chip-8 clock speed instead of running flat out
    #[arg(long, action = ArgAction::SetTrue)]
    pub realtime: bool,

    /// Print the most recently executed instructions after the run
    #[arg(long, action = ArgAction::SetTrue)]
    pub history: bool,
}

pub fn run(args: Args) -> Result<()> {
    let rom = fs::read(&args.rom)
        .with_context(|| format!("unable to read ROM {}", args.rom.display()))?;

    let mut chip8: Chip8 = match args.seed {
        Some(seed) => Chip8::seeded(seed),
        None => Chip8::new(),
    };
    chip8
        .load_rom(&rom)
        .with_context(|| format!("unable to load ROM {}", args.rom.display()))?;
    info!("successfully loaded ROM");

    // Hold keys
    for key in args.keys.chars() {
        match keymap(key) {
            Some(kc) => chip8.key_press(kc),
            None => warn!("{:?} isn't mapped to a key, ignoring it", key),
        }
    }

    // Set initial timing
    let cycle_time = Duration::from_nanos(CLOCK_SPEED);
    let mut last_cycle = Instant::now();

    let mut executed = 0;
    while executed < args.cycles {
        match chip8.cycle() {
            Ok(Cycle::WaitingForKey) => {
                info!("waiting for a key that will never be pressed; stopping");
                break;
            }
            Ok(_) => executed += 1,
            Err(e) => {
                report(&chip8, args.history);
                return Err(e).with_context(|| format!("halted after {} cycles", executed));
            }
        }

        // Handle timing
        if args.realtime {
            let current_time = Instant::now();
            let elapsed_cycle_time = current_time - last_cycle;
            if cycle_time > elapsed_cycle_time {
                std::thread::sleep(cycle_time - elapsed_cycle_time);
            }
            last_cycle = Instant::now();
        }
    }

    info!("ran {} cycles", executed);
    report(&chip8, args.history);
    Ok(())
}

/// Prints the display, registers and optionally the instruction history.
fn report(chip8: &Chip8, history: bool) {
    println!("{}", frame_to_text(chip8.display().frame_buffer()));
    println!(
        "pc {:#05X} i {:#05X} v {:02X?} stack {:03X?}",
        chip8.pc(),
        chip8.index(),
        chip8.registers(),
        chip8.stack()
    );
    if history {
        for entry in chip8.history() {
            println!(
                "{:#05X}  {:04X}  {:<20} {}",
                entry.pc, entry.opcode, entry.descriptor.mnemonic, entry.descriptor.description
            );
        }
    }
}
