// Command types - UI → sequencer thread

use crate::sequencer::gate::GateSettings;
use crate::sequencer::pattern::GateKind;
use crate::sequencer::state::SequencerState;
use crate::sequencer::step::{DrumKind, PitchEntry};

#[derive(Debug, Clone)]
pub enum Command {
    Start,
    Stop,
    TogglePlay,
    SetBpm(f64),
    Resize(usize),
    SetStepDrum {
        index: usize,
        drum: DrumKind,
        value: bool,
    },
    SetStepVolume {
        index: usize,
        volume: f32,
    },
    ClearStep(usize),
    ClearAll,
    Randomize,
    SetGate {
        gate: GateKind,
        tick: usize,
        open: bool,
    },
    SetGateSettings {
        gate: GateKind,
        settings: GateSettings,
    },
    SetParameterDestination(Option<String>),
    SetPitchPool(Vec<PitchEntry>),
    SetKeyboardOctave(i8),
    SelectStep(usize),
    ExitEditMode,
    KeyDown(PitchEntry),
    KeyUp(String),
    SetOutputVolume(f32),
    SetDrumSample {
        drum: DrumKind,
        blob: Option<String>,
    },
    Import(Box<SequencerState>),
    /// Ask for a snapshot, answered with `SequencerEvent::Exported`
    Export,
    Quit,
}
