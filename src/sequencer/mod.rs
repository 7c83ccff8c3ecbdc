// Sequencer module - Step sequencer core
// Pattern store, transport clock, voice triggering and gate modulation

pub mod engine;
pub mod gate;
pub mod pattern;
pub mod randomize;
pub mod state;
pub mod step;
pub mod timeline;
pub mod transport;
pub mod voice;

pub use engine::{EditMode, KeyDispatch, SequencerHost, StepSequencer};
pub use gate::{GateEngine, GateSettings, GateTarget, ModulationHost, ScheduledParam, TickWindow};
pub use pattern::{DEFAULT_PATTERN_LENGTH, GateKind, GatePattern, MAX_PATTERN_LENGTH, Pattern};
pub use randomize::ChordQuality;
pub use state::{DrumSampleBlobs, SequencerState};
pub use step::{DrumKind, PitchEntry, Step};
pub use timeline::{TICKS_PER_HYPER_MEASURE, Tempo};
pub use transport::{AudioClock, Transport, TransportState};
pub use voice::{DrumHost, VoiceHost, VoiceId, VoiceOrigin, VoiceRequest, VoiceTrigger};
