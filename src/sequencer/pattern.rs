// Pattern - Ordered step records and the 16-slot gate masks
// The pattern store is exclusively owned by the sequencer

use crate::error::{SequencerError, SequencerResult};
use crate::sequencer::step::{DrumKind, PitchEntry, Step};
use crate::sequencer::timeline::TICKS_PER_HYPER_MEASURE;
use serde::{Deserialize, Serialize};

/// Default number of steps in a new pattern
pub const DEFAULT_PATTERN_LENGTH: usize = 8;

/// Longest pattern the sequencer accepts
pub const MAX_PATTERN_LENGTH: usize = 64;

/// Check a requested pattern length
pub fn validate_length(length: usize) -> SequencerResult<()> {
    if length == 0 || length > MAX_PATTERN_LENGTH {
        return Err(SequencerError::InvalidLength(length));
    }
    Ok(())
}

/// A sequence of steps
///
/// Always holds exactly `len()` steps; resizing keeps steps by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    steps: Vec<Step>,
}

impl Pattern {
    /// Create the default groove: hat on every step, kick on step 0,
    /// snare half-way through the pattern
    pub fn new_default(length: usize) -> SequencerResult<Self> {
        validate_length(length)?;
        Ok(Self {
            steps: Self::default_steps(length),
        })
    }

    /// Create a pattern of empty steps
    pub fn new_empty(length: usize) -> SequencerResult<Self> {
        validate_length(length)?;
        Ok(Self {
            steps: vec![Step::empty(); length],
        })
    }

    fn default_steps(length: usize) -> Vec<Step> {
        let snare_step = length / 2;
        (0..length)
            .map(|index| Step {
                triggers_kick: index == 0,
                // A one-step pattern puts kick and snare on the same step
                triggers_snare: index == snare_step,
                triggers_hat: true,
                ..Step::empty()
            })
            .collect()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Patterns are never empty; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get a step by index
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    fn step_mut(&mut self, index: usize) -> SequencerResult<&mut Step> {
        let length = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(SequencerError::StepOutOfRange { index, length })
    }

    /// Replace a whole step
    pub fn set_step(&mut self, index: usize, step: Step) -> SequencerResult<()> {
        *self.step_mut(index)? = step;
        Ok(())
    }

    /// Resize, keeping existing steps by index and padding with empty steps
    pub fn resize(&mut self, new_length: usize) -> SequencerResult<()> {
        validate_length(new_length)?;
        self.steps.resize(new_length, Step::empty());
        Ok(())
    }

    /// Set one drum flag on a step
    pub fn set_step_drum(&mut self, index: usize, drum: DrumKind, value: bool) -> SequencerResult<()> {
        self.step_mut(index)?.set_drum(drum, value);
        Ok(())
    }

    /// Flip one drum flag on a step, returning the new value
    pub fn toggle_step_drum(&mut self, index: usize, drum: DrumKind) -> SequencerResult<bool> {
        let step = self.step_mut(index)?;
        let value = !step.triggers(drum);
        step.set_drum(drum, value);
        Ok(value)
    }

    /// Set the pitched-voice volume of a step
    /// The value is stored as given; clamping is up to the caller
    pub fn set_step_volume(&mut self, index: usize, volume: f32) -> SequencerResult<()> {
        self.step_mut(index)?.volume = volume;
        Ok(())
    }

    /// Assign a pitch to a step
    pub fn set_step_note(&mut self, index: usize, pitch: &PitchEntry, octave_shift: i8) -> SequencerResult<()> {
        self.step_mut(index)?.set_note(pitch, octave_shift);
        Ok(())
    }

    /// Clear the melodic content of a step and reset its volume
    /// Drum flags are kept
    pub fn clear_step(&mut self, index: usize) -> SequencerResult<()> {
        let step = self.step_mut(index)?;
        step.clear_note();
        step.volume = 1.0;
        Ok(())
    }

    /// Reset every step to the default groove, keeping the current length
    pub fn clear_all(&mut self) {
        self.steps = Self::default_steps(self.steps.len());
    }

    /// Mutable access for bulk edits (randomizer)
    pub(crate) fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            steps: Self::default_steps(DEFAULT_PATTERN_LENGTH),
        }
    }
}

/// Which of the two gate masks an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    Tremolo,
    Parameter,
}

/// A 16-slot open/closed mask over the hyper-measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<bool>", into = "Vec<bool>")]
pub struct GatePattern {
    slots: [bool; TICKS_PER_HYPER_MEASURE],
}

impl GatePattern {
    /// Every tick open
    pub fn all_open() -> Self {
        Self {
            slots: [true; TICKS_PER_HYPER_MEASURE],
        }
    }

    pub fn from_slots(slots: [bool; TICKS_PER_HYPER_MEASURE]) -> Self {
        Self { slots }
    }

    /// Is the gate open on this tick?
    pub fn is_open(&self, gate_tick: usize) -> bool {
        self.slots[gate_tick % TICKS_PER_HYPER_MEASURE]
    }

    pub fn set(&mut self, gate_tick: usize, open: bool) -> SequencerResult<()> {
        let slot = self
            .slots
            .get_mut(gate_tick)
            .ok_or(SequencerError::InvalidGateTick(gate_tick))?;
        *slot = open;
        Ok(())
    }

    /// Flip a slot, returning the new value
    pub fn toggle(&mut self, gate_tick: usize) -> SequencerResult<bool> {
        let slot = self
            .slots
            .get_mut(gate_tick)
            .ok_or(SequencerError::InvalidGateTick(gate_tick))?;
        *slot = !*slot;
        Ok(*slot)
    }

    pub fn slots(&self) -> &[bool; TICKS_PER_HYPER_MEASURE] {
        &self.slots
    }
}

impl Default for GatePattern {
    fn default() -> Self {
        Self::all_open()
    }
}

/// Short or long masks are padded with open slots or truncated
impl From<Vec<bool>> for GatePattern {
    fn from(values: Vec<bool>) -> Self {
        let mut slots = [true; TICKS_PER_HYPER_MEASURE];
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = value;
        }
        Self { slots }
    }
}

impl From<GatePattern> for Vec<bool> {
    fn from(pattern: GatePattern) -> Self {
        pattern.slots.to_vec()
    }
}
