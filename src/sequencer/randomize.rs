// Randomizer - Chord-aware melodic pattern generation
// Only melodic fields are rewritten; drum flags and volumes are left alone

use crate::sequencer::step::{MAX_OCTAVE_SHIFT, MIN_OCTAVE_SHIFT, PitchEntry, Step};
use rand::Rng;
use rand::seq::SliceRandom;

/// Probability that a step receives a chord tone
pub const CHORD_TONE_PROBABILITY: f64 = 0.85;

/// Probability that a chord tone is lifted one extra octave
pub const OCTAVE_UP_PROBABILITY: f64 = 0.3;

/// Chord qualities the randomizer picks from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 6] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Dominant7,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::Diminished,
    ];

    /// Semitone offsets from the root
    pub fn intervals(&self) -> &'static [usize] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Diminished => &[0, 3, 6],
        }
    }
}

/// Chord members taken from the pool, wrapping past its end
pub fn chord_members<'a>(pool: &'a [PitchEntry], root: usize, quality: ChordQuality) -> Vec<&'a PitchEntry> {
    if pool.is_empty() {
        return Vec::new();
    }
    quality
        .intervals()
        .iter()
        .map(|interval| &pool[(root + interval) % pool.len()])
        .collect()
}

/// Fill `steps` with a random chord arpeggio
///
/// `base_octave` is the octave shift given to chord tones before the random
/// lift. An empty pool leaves the steps untouched. Returns the chosen root
/// index and quality.
pub fn randomize_steps<R: Rng + ?Sized>(
    steps: &mut [Step],
    pool: &[PitchEntry],
    base_octave: i8,
    rng: &mut R,
) -> Option<(usize, ChordQuality)> {
    if pool.is_empty() {
        log::warn!("Randomize requested with an empty pitch pool");
        return None;
    }

    let root = rng.gen_range(0..pool.len());
    let quality = *ChordQuality::ALL.choose(rng)?;
    let members = chord_members(pool, root, quality);

    for (index, step) in steps.iter_mut().enumerate() {
        if rng.gen_bool(CHORD_TONE_PROBABILITY) {
            let pitch = members[index % members.len()];
            let lift = if rng.gen_bool(OCTAVE_UP_PROBABILITY) { 1 } else { 0 };
            let octave = base_octave.saturating_add(lift).clamp(MIN_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT);
            step.set_note(pitch, octave);
        } else {
            step.clear_note();
        }
    }

    log::debug!(
        "Randomized {} steps on {} {:?}",
        steps.len(),
        pool[root].note_name,
        quality
    );
    Some((root, quality))
}
