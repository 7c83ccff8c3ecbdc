// Timeline - Tempo and gate-tick arithmetic
// Converts BPM into 16th-note tick durations and maps gate ticks onto pattern steps

use crate::error::{SequencerError, SequencerResult};
use std::fmt;

/// Number of gate ticks in one hyper-measure
/// Gate patterns always run at this resolution, whatever the pattern length
pub const TICKS_PER_HYPER_MEASURE: usize = 16;

/// Gate ticks per quarter note (one tick = one 16th note)
pub const TICKS_PER_BEAT: f64 = 4.0;

/// Fraction of a step a sequencer note is held before release
/// Leaves a short gap so every step re-triggers instead of tying into the next
pub const NOTE_RELEASE_HEADROOM_FRACTION: f64 = 0.98;

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub const MIN_BPM: f64 = 20.0;
    pub const MAX_BPM: f64 = 999.0;

    /// Creates a new tempo
    /// BPM must be in range [20.0, 999.0]
    pub fn new(bpm: f64) -> SequencerResult<Self> {
        if !(Self::MIN_BPM..=Self::MAX_BPM).contains(&bpm) {
            return Err(SequencerError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one gate tick (16th note) in seconds
    pub fn tick_duration_seconds(&self) -> f64 {
        self.beat_duration_seconds() / TICKS_PER_BEAT
    }

    /// Duration of one full hyper-measure in seconds
    pub fn hyper_measure_seconds(&self) -> f64 {
        self.tick_duration_seconds() * TICKS_PER_HYPER_MEASURE as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Gate ticks covered by one step of a pattern with `length` steps
///
/// Only lengths dividing 16 give a whole number. Other lengths yield a
/// fractional ratio and therefore irregular step boundaries.
pub fn ticks_per_step(length: usize) -> f64 {
    TICKS_PER_HYPER_MEASURE as f64 / length as f64
}

/// Step that starts on `gate_tick`, or `None` if the tick is not a step boundary
pub fn step_at_tick(gate_tick: usize, length: usize) -> Option<usize> {
    let per_step = ticks_per_step(length);
    if gate_tick as f64 % per_step == 0.0 {
        Some((gate_tick as f64 / per_step).floor() as usize)
    } else {
        None
    }
}

/// How long a note triggered on a step is held (seconds)
pub fn note_hold_seconds(tick_duration: f64, length: usize) -> f64 {
    tick_duration * ticks_per_step(length) * NOTE_RELEASE_HEADROOM_FRACTION
}
