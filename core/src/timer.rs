use std::time::Duration;

/// # Timer Clock
/// Converts elapsed wall-clock time into timer ticks.
///
/// The delay and sound timers count down at a fixed rate no matter how fast the CPU runs,
/// so elapsed time is accumulated and one tick is emitted per whole period. The remainder
/// carries over to the next call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerClock {
    period: Duration,
    accumulated: Duration,
}

impl TimerClock {
    /// A clock ticking `frequency` times per second
    pub fn new(frequency: u32) -> Self {
        TimerClock {
            period: (Duration::from_secs(1) / frequency.max(1)).max(Duration::from_nanos(1)),
            accumulated: Duration::ZERO,
        }
    }

    /// Accumulates `elapsed` and returns how many whole periods have passed.
    /// The count saturates at `u32::MAX`.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let accumulated = self.accumulated.saturating_add(elapsed).as_nanos();
        let period = self.period.as_nanos();
        // the remainder is shorter than one period so always fits
        self.accumulated = Duration::from_nanos((accumulated % period) as u64);
        u32::try_from(accumulated / period).unwrap_or(u32::MAX)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

/// # Tone
/// What the beeper should be doing, derived from whether the sound timer was running
/// the last time it was observed and whether it is running now.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tone {
    Silent,
    Start,
    Continue,
    Stop,
}

impl Tone {
    pub fn between(was_sounding: bool, is_sounding: bool) -> Self {
        match (was_sounding, is_sounding) {
            (false, false) => Tone::Silent,
            (false, true) => Tone::Start,
            (true, true) => Tone::Continue,
            (true, false) => Tone::Stop,
        }
    }

    /// Whether the beeper is audible after this transition
    pub fn is_audible(self) -> bool {
        matches!(self, Tone::Start | Tone::Continue)
    }
}
