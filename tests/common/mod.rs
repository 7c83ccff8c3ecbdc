// Shared test host - Records everything the sequencer asks of it
#![allow(dead_code)]

use synthwave_seq::sequencer::{
    AudioClock, DrumHost, DrumKind, GateTarget, ModulationHost, ScheduledParam, SequencerHost,
    StepSequencer, VoiceHost, VoiceId, VoiceRequest,
};

pub const CUTOFF_DESTINATION: &str = "filterCutoff";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Play { id: VoiceId, note: String, time: f64 },
    Stop(VoiceId),
    Drum(DrumKind, f64),
    Highlight(Option<usize>),
}

/// Records automation calls as (value, start time) pairs
#[derive(Debug, Default)]
pub struct RecordedParam {
    pub targets: Vec<(f32, f64)>,
    pub cancels: Vec<f64>,
}

impl ScheduledParam for RecordedParam {
    fn cancel_scheduled_values(&mut self, from_time: f64) {
        self.cancels.push(from_time);
    }

    fn set_target_at_time(&mut self, value: f32, start_time: f64, _time_constant: f64) {
        self.targets.push((value, start_time));
    }
}

#[derive(Debug, Default)]
pub struct TestHost {
    pub time: f64,
    pub events: Vec<Event>,
    pub tremolo_active: bool,
    pub tremolo: RecordedParam,
    pub cutoff: RecordedParam,
}

impl TestHost {
    pub fn drum_times(&self, drum: DrumKind) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Drum(d, t) if *d == drum => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn highlights(&self) -> Vec<Option<usize>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Highlight(step) => Some(*step),
                _ => None,
            })
            .collect()
    }

    pub fn plays(&self) -> Vec<(String, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Play { note, time, .. } => Some((note.clone(), *time)),
                _ => None,
            })
            .collect()
    }
}

impl AudioClock for TestHost {
    fn now(&self) -> f64 {
        self.time
    }
}

impl VoiceHost for TestHost {
    fn play_voice(&mut self, request: &VoiceRequest) {
        self.events.push(Event::Play {
            id: request.voice_id,
            note: request.note_name.clone(),
            time: request.start_time,
        });
    }

    fn stop_voice(&mut self, voice_id: VoiceId) {
        self.events.push(Event::Stop(voice_id));
    }
}

impl DrumHost for TestHost {
    fn trigger_drum(&mut self, drum: DrumKind, at: f64) {
        self.events.push(Event::Drum(drum, at));
    }
}

impl ModulationHost for TestHost {
    fn tremolo_target(&mut self) -> Option<GateTarget<'_>> {
        Some(GateTarget {
            active: self.tremolo_active,
            param: &mut self.tremolo,
            base_value: 1.0,
        })
    }

    fn parameter_target(&mut self, destination: &str) -> Option<GateTarget<'_>> {
        if destination != CUTOFF_DESTINATION {
            return None;
        }
        Some(GateTarget {
            active: true,
            param: &mut self.cutoff,
            base_value: 2000.0,
        })
    }
}

impl SequencerHost for TestHost {
    fn highlight_step(&mut self, step: Option<usize>) {
        self.events.push(Event::Highlight(step));
    }
}

/// Advance the fake clock in 1 ms increments, polling each time
pub fn run_until(sequencer: &mut StepSequencer<TestHost>, until: f64) {
    while sequencer.host().time < until {
        sequencer.poll();
        sequencer.host_mut().time += 0.001;
    }
    sequencer.poll();
}
