// Voice trigger adapter - Turns steps into voice and drum calls
// Tracks sounding sequencer voices until their scheduled release

use crate::sequencer::step::{DrumKind, PitchEntry, Step};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier of a voice started through the sequencer core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice-{}", self.0)
    }
}

/// Who asked for a voice
///
/// A manual key press and a sequencer step on the same note are separate
/// voices and are stopped separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceOrigin {
    Sequencer,
    Manual,
}

/// Everything the voice service needs to start a pitched voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceRequest {
    pub voice_id: VoiceId,
    pub note_name: String,
    /// Fundamental paired with the note name; `None` leaves pitch lookup to the voice service
    pub frequency: Option<f64>,
    pub velocity: u8,
    pub origin: VoiceOrigin,
    /// Gain applied to this voice only (0.0 - 1.0)
    pub volume: f32,
    /// Octave transposition overriding any global transpose
    pub octave_shift: i8,
    /// Host clock time at which the voice starts
    pub start_time: f64,
}

/// The pitched-voice service (synth engine)
pub trait VoiceHost {
    fn play_voice(&mut self, request: &VoiceRequest);
    fn stop_voice(&mut self, voice_id: VoiceId);
}

/// Drum sound production (sample playback or procedural fallback)
pub trait DrumHost {
    fn trigger_drum(&mut self, drum: DrumKind, at: f64);
}

/// A sequencer voice waiting for its release
#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    voice_id: VoiceId,
    release_at: f64,
}

/// Step-to-voice adapter
///
/// Owns the id counter, the release queue for sequencer notes and the
/// table of manually held keys.
#[derive(Debug)]
pub struct VoiceTrigger {
    next_voice_id: u64,
    pending: Vec<PendingRelease>,
    manual: HashMap<String, VoiceId>,
    velocity: u8,
}

impl VoiceTrigger {
    pub fn new(velocity: u8) -> Self {
        Self {
            next_voice_id: 1,
            pending: Vec::new(),
            manual: HashMap::new(),
            velocity,
        }
    }

    fn allocate_id(&mut self) -> VoiceId {
        let id = VoiceId(self.next_voice_id);
        self.next_voice_id += 1;
        id
    }

    /// Fire a step at `time`
    ///
    /// The note (if any) is released `hold` seconds later. Drums fire for
    /// every set flag whether or not a note was played. Returns the id of
    /// the note voice.
    pub fn trigger_step<H>(&mut self, host: &mut H, step: &Step, time: f64, hold: f64) -> Option<VoiceId>
    where
        H: VoiceHost + DrumHost + ?Sized,
    {
        let voice_id = step.note_name.as_ref().map(|note_name| {
            let voice_id = self.allocate_id();
            host.play_voice(&VoiceRequest {
                voice_id,
                note_name: note_name.clone(),
                frequency: step.base_frequency,
                velocity: self.velocity,
                origin: VoiceOrigin::Sequencer,
                volume: step.volume,
                octave_shift: step.octave_shift,
                start_time: time,
            });
            self.pending.push(PendingRelease {
                voice_id,
                release_at: time + hold,
            });
            voice_id
        });

        for drum in step.drums() {
            host.trigger_drum(drum, time);
        }

        voice_id
    }

    /// Stop every sequencer voice whose release time has passed
    pub fn release_due<H: VoiceHost + ?Sized>(&mut self, host: &mut H, now: f64) {
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].release_at <= now {
                let release = self.pending.swap_remove(index);
                host.stop_voice(release.voice_id);
            } else {
                index += 1;
            }
        }
    }

    /// Stop every sounding sequencer voice immediately
    pub fn release_all<H: VoiceHost + ?Sized>(&mut self, host: &mut H) {
        for release in self.pending.drain(..) {
            host.stop_voice(release.voice_id);
        }
    }

    /// Earliest pending release time
    pub fn next_release_at(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|release| release.release_at)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Number of sequencer voices still sounding
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Start a manually played voice; a second press of a held key restarts it
    pub fn press_manual<H: VoiceHost + ?Sized>(&mut self, host: &mut H, pitch: &PitchEntry, octave_shift: i8, time: f64) -> VoiceId {
        if let Some(previous) = self.manual.remove(&pitch.note_name) {
            host.stop_voice(previous);
        }
        let voice_id = self.allocate_id();
        host.play_voice(&VoiceRequest {
            voice_id,
            note_name: pitch.note_name.clone(),
            frequency: Some(pitch.base_frequency),
            velocity: self.velocity,
            origin: VoiceOrigin::Manual,
            volume: 1.0,
            octave_shift,
            start_time: time,
        });
        self.manual.insert(pitch.note_name.clone(), voice_id);
        voice_id
    }

    /// Stop a manually played voice
    pub fn release_manual<H: VoiceHost + ?Sized>(&mut self, host: &mut H, note_name: &str) -> Option<VoiceId> {
        let voice_id = self.manual.remove(note_name)?;
        host.stop_voice(voice_id);
        Some(voice_id)
    }
}
