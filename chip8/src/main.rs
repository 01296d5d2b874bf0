use std::path::PathBuf;

use clap::Parser;

use chip8_core::CLOCK_SPEED;

mod audio;
mod keymap;
mod run;

/// Runs a Chip-8 ROM in an SDL2 window
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the ROM file to run
    pub rom: PathBuf,

    /// Instructions executed per second
    #[arg(short, long, default_value_t = CLOCK_SPEED)]
    pub clock_speed: u32,

    /// Size multiplier for each display pixel
    #[arg(short, long, default_value_t = 10)]
    pub scale: u32,

    /// Don't play the sound timer beep
    #[arg(short, long)]
    pub mute: bool,

    /// Seed for the random number instruction
    #[arg(long)]
    pub seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    run::run(&args)
}
