use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chip8_core::Chip8;
use chip8_display::Display;

use crate::audio::Beeper;
use crate::keymap::keymap;
use crate::Args;

pub fn run(args: &Args) -> anyhow::Result<()> {
    let mut chip8: Chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };

    // Load ROM
    let file = File::open(&args.rom)
        .with_context(|| format!("unable to open {}", args.rom.display()))?;
    let mut reader = BufReader::new(file);
    chip8
        .load_rom(&mut reader)
        .with_context(|| format!("unable to load {}", args.rom.display()))?;
    log::info!("loaded ROM {}", args.rom.display());

    // Get SDL2 context
    let sdl: sdl2::Sdl = sdl2::init().map_err(|e| anyhow!(e))?;
    let mut display: Display = Display::new(&sdl, args.scale)?;
    let beeper = if args.mute {
        None
    } else {
        Some(Beeper::new(&sdl).map_err(|e| anyhow!(e))?)
    };
    let mut events = sdl.event_pump().map_err(|e| anyhow!(e))?;
    log::info!("running at {} instructions/s", args.clock_speed);

    // Set initial timing
    let cycle_time: Duration = Duration::from_secs(1) / args.clock_speed.max(1);
    let mut last_cycle: Instant = Instant::now();

    // Whether or not the clock speed should be respected
    let mut fast_forward: bool = false;

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_press(kc),
                    (Keycode::Space, _) => fast_forward = true,
                    (Keycode::Escape, _) => break 'event,
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_release(kc),
                    (Keycode::Space, _) => fast_forward = false,
                    _ => continue,
                },
                _ => continue,
            };
        }

        // Update state
        if let Err(e) = chip8.step() {
            log::error!(
                "halted at opcode {:#06X}: {}",
                chip8.current_opcode(),
                e
            );
            return Err(e).context("the program stopped executing");
        }

        // Render the current frame if a draw or clear changed it
        if let Some(frame) = chip8.get_frame() {
            display.render(frame)?;
            chip8.clear_redraw();
        }

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if !fast_forward && cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        let now = Instant::now();
        let tone = chip8.advance_timers(now - last_cycle);
        if let Some(beeper) = &beeper {
            beeper.update(tone);
        }
        last_cycle = now;
    }

    log::info!("shutting down");
    Ok(())
}
