use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

use chip8_core::Tone;

const BEEP_FREQUENCY: f32 = 440.0;
const VOLUME: f32 = 0.15;

/// A square wave oscillator fed to the SDL2 audio callback
struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// # Beeper
/// Plays a tone while the Chip-8 sound timer is running.
pub struct Beeper {
    device: AudioDevice<SquareWave>,
}

impl Beeper {
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, String> {
        let audio_subsystem = sdl.audio()?;
        let desired = AudioSpecDesired {
            freq: Some(44_100),
            channels: Some(1),
            samples: None,
        };
        let device = audio_subsystem.open_playback(None, &desired, |spec| SquareWave {
            phase_inc: BEEP_FREQUENCY / spec.freq as f32,
            phase: 0.0,
            volume: VOLUME,
        })?;
        Ok(Beeper { device })
    }

    /// Starts or stops the tone on the sound timer's edges
    pub fn update(&self, tone: Tone) {
        match tone {
            Tone::Start => self.device.resume(),
            Tone::Stop => self.device.pause(),
            Tone::Continue | Tone::Silent => {}
        }
    }
}
