// Step - One position of the melodic/drum pattern

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest octave shift a step may carry
pub const MIN_OCTAVE_SHIFT: i8 = -3;
/// Highest octave shift a step may carry
pub const MAX_OCTAVE_SHIFT: i8 = 3;

/// The three drum voices a step can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumKind {
    Kick,
    Snare,
    Hat,
}

impl DrumKind {
    pub const ALL: [DrumKind; 3] = [DrumKind::Kick, DrumKind::Snare, DrumKind::Hat];
}

impl fmt::Display for DrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrumKind::Kick => "kick",
            DrumKind::Snare => "snare",
            DrumKind::Hat => "hat",
        };
        f.write_str(name)
    }
}

/// An entry of the pitch pool: a playable note with its frequency and label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchEntry {
    pub note_name: String,
    pub base_frequency: f64,
    pub note_label: String,
}

impl PitchEntry {
    pub fn new(note_name: impl Into<String>, base_frequency: f64, note_label: impl Into<String>) -> Self {
        Self {
            note_name: note_name.into(),
            base_frequency,
            note_label: note_label.into(),
        }
    }
}

/// One step of the pattern
///
/// Drum flags are orthogonal to the melodic fields: clearing or randomizing the
/// note never touches them. `volume` scales the pitched voice only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Step {
    pub note_name: Option<String>,
    pub base_frequency: Option<f64>,
    pub octave_shift: i8,
    pub note_label: Option<String>,
    pub triggers_kick: bool,
    pub triggers_snare: bool,
    pub triggers_hat: bool,
    pub volume: f32,
}

impl Step {
    /// A step with no note, no drums and full volume
    pub fn empty() -> Self {
        Self {
            note_name: None,
            base_frequency: None,
            octave_shift: 0,
            note_label: None,
            triggers_kick: false,
            triggers_snare: false,
            triggers_hat: false,
            volume: 1.0,
        }
    }

    /// True when the step produces no sound at all
    pub fn is_empty(&self) -> bool {
        self.note_name.is_none() && !self.triggers_kick && !self.triggers_snare && !self.triggers_hat
    }

    pub fn has_note(&self) -> bool {
        self.note_name.is_some()
    }

    pub fn triggers(&self, drum: DrumKind) -> bool {
        match drum {
            DrumKind::Kick => self.triggers_kick,
            DrumKind::Snare => self.triggers_snare,
            DrumKind::Hat => self.triggers_hat,
        }
    }

    pub fn set_drum(&mut self, drum: DrumKind, value: bool) {
        match drum {
            DrumKind::Kick => self.triggers_kick = value,
            DrumKind::Snare => self.triggers_snare = value,
            DrumKind::Hat => self.triggers_hat = value,
        }
    }

    /// Drums fired by this step, in kick/snare/hat order
    pub fn drums(&self) -> impl Iterator<Item = DrumKind> + '_ {
        DrumKind::ALL.into_iter().filter(|drum| self.triggers(*drum))
    }

    /// Assign a pitch from the pool with the given octave shift (clamped to ±3)
    pub fn set_note(&mut self, pitch: &PitchEntry, octave_shift: i8) {
        self.note_name = Some(pitch.note_name.clone());
        self.base_frequency = Some(pitch.base_frequency);
        self.note_label = Some(pitch.note_label.clone());
        self.octave_shift = octave_shift.clamp(MIN_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT);
    }

    /// Remove melodic content only; drums and volume stay
    pub fn clear_note(&mut self) {
        self.note_name = None;
        self.base_frequency = None;
        self.note_label = None;
        self.octave_shift = 0;
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::empty()
    }
}
